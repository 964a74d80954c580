use alloy::{
    hex,
    primitives::Address,
    signers::{k256::ecdsa::SigningKey, local::LocalSigner},
};

pub use delegation::{
    await_delegation, delegation_status, DelegationStatus, DEFAULT_MAX_WAIT,
    DEFAULT_POLL_INTERVAL, DELEGATION_PREFIX,
};
pub use permit2::{
    IAllowanceTransfer, PermitDetails, PermitSingle, PERMIT2_ADDRESS,
};
pub use signer::SmartWalletSigner;
pub use storage::{clone_bytecode, derive_storage_address, IWalletStorage};
pub use validation::{validation_signing_hash, Call, IWalletCore};

/// Enables signing of raw digests on behalf of the wallet's EOA key.
mod signer;

/// Deterministic CREATE2 addresses for the wallet's per-user storage clone.
mod storage;

/// EIP-7702 delegation: authorization signing, status classification and
/// the bounded polling wait.
mod delegation;

/// The execution signature a validator contract checks before running a
/// batch of calls.
mod validation;

/// Crafting and signing of Permit2 allowances.
/// Reference: <https://docs.uniswap.org/contracts/permit2/overview>
mod permit2;

/// Errors that can occur when working with the smart wallet.
#[derive(Debug, thiserror::Error)]
pub enum SmartWalletError {
    /// Failed to decode a hex-encoded secret key into a k256 signer.
    #[error("failed to decode hex-encoded secret into k256 signer: {0}")]
    KeyDecoding(String),
    /// Error occurred during the signing process.
    #[error(transparent)]
    Signing(#[from] alloy::signers::Error),
    /// Failed to encode data to a specific format.
    #[error("failed to encode: {0}")]
    Encoding(String),
    /// The immutable arguments appended to the storage clone bytecode are
    /// longer than the proxy template's 16-bit length field can carry.
    #[error("clone immutable arguments too long: {0} bytes")]
    CloneArgumentsTooLong(usize),
}

/// A smart wallet is an externally-owned account whose code execution can
/// be delegated to the `WalletCore` contract through an EIP-7702
/// authorization.
///
/// It holds the user's signing key and produces every signature the
/// sponsored pipeline needs from the user: the delegation authorization,
/// the execution typed data and Permit2 allowances. It never submits
/// transactions itself; a sponsor relays them.
#[derive(Debug)]
pub struct SmartWallet {
    /// The Ethereum signer for the user's EOA.
    signer: LocalSigner<SigningKey>,
    /// The EOA address. With EIP-7702 the upgraded account lives at this
    /// same address.
    pub address: Address,
}

impl SmartWallet {
    /// Initializes a new `SmartWallet` from the given EOA signing key.
    ///
    /// # Arguments
    /// - `private_key`: A hex-encoded string representing the **secret
    ///   key** of the user's EOA. May be `0x`-prefixed.
    ///
    /// # Errors
    /// - Will return an error if the key is not a validly encoded hex
    ///   string.
    /// - Will return an error if the key is not a valid point in the k256
    ///   curve.
    pub fn new(private_key: &str) -> Result<Self, SmartWalletError> {
        let private_key = private_key.strip_prefix("0x").unwrap_or(private_key);
        let signer = LocalSigner::from_slice(
            &hex::decode(private_key)
                .map_err(|e| SmartWalletError::KeyDecoding(e.to_string()))?,
        )
        .map_err(|e| SmartWalletError::KeyDecoding(e.to_string()))?;

        let address = signer.address();
        log::debug!("initialized smart wallet for {address}");

        Ok(Self { signer, address })
    }
}

#[cfg(test)]
impl SmartWallet {
    /// Creates a new `SmartWallet` instance with a random EOA signing key.
    ///
    /// Only for test usage.
    #[must_use]
    pub fn random() -> Self {
        let signer = LocalSigner::random();
        let address = signer.address();
        Self { signer, address }
    }
}
