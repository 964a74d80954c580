use alloy::{
    dyn_abi::{DynSolValue, Eip712Domain, TypedData},
    primitives::{address, Address, Bytes, U256},
    sol,
    sol_types::eip712_domain,
};

use super::{SmartWallet, SmartWalletError, SmartWalletSigner};

/// The canonical Permit2 deployment, shared across networks.
///
/// Reference: <https://docs.uniswap.org/contracts/permit2/overview>
pub static PERMIT2_ADDRESS: Address =
    address!("0x000000000022d473030f116ddee9f6b43ac78ba3");

sol! {
    /// The approval details for a single token allowance.
    ///
    /// Reference: <https://github.com/Uniswap/permit2/blob/cc56ad0f3439c502c246fc5cfcc3db92bb8b7219/src/interfaces/IAllowanceTransfer.sol#L41>
    #[derive(serde::Serialize)]
    struct PermitDetails {
        // ERC20 token address
        address token;
        // Maximum amount allowed to transfer
        uint160 amount;
        // Timestamp at which the allowance expires
        uint48 expiration;
        // An incrementing value indexed per owner, token, and spender for each signature
        uint48 nonce;
    }

    /// The permit message for a single token allowance.
    ///
    /// Reference: <https://github.com/Uniswap/permit2/blob/cc56ad0f3439c502c246fc5cfcc3db92bb8b7219/src/interfaces/IAllowanceTransfer.sol#L51>
    #[derive(serde::Serialize)]
    struct PermitSingle {
        // The permit data for a single token allowance
        PermitDetails details;
        // Address permissioned on the allowed tokens
        address spender;
        // Deadline on the permit signature
        uint256 sigDeadline;
    }

    /// The allowance-mapping half of the Permit2 contract. The nonce it
    /// reports must be fetched immediately before signing a
    /// [`PermitSingle`]; a stale nonce invalidates the signature.
    interface IAllowanceTransfer {
        function allowance(
            address user,
            address token,
            address spender
        ) external view returns (uint160 amount, uint48 expiration, uint48 nonce);
    }
}

impl PermitSingle {
    /// Converts the `PermitSingle` struct into an EIP-712 `TypedData`
    /// struct with its relevant domain.
    #[must_use]
    pub fn as_typed_data(&self, chain_id: u64) -> TypedData {
        let domain: Eip712Domain = eip712_domain!(
            name: "Permit2",
            chain_id: chain_id,
            verifying_contract: PERMIT2_ADDRESS,
        );

        TypedData::from_struct(self, Some(domain))
    }

    /// Represents this permit as the dynamic ABI value the router command
    /// schema expects: `((token, amount, expiration, nonce), spender,
    /// sigDeadline)`.
    #[must_use]
    pub fn as_dyn_value(&self) -> DynSolValue {
        let details = DynSolValue::Tuple(vec![
            DynSolValue::Address(self.details.token),
            DynSolValue::Uint(
                U256::from_be_slice(&self.details.amount.to_be_bytes::<20>()),
                160,
            ),
            DynSolValue::Uint(
                U256::from_be_slice(&self.details.expiration.to_be_bytes::<6>()),
                48,
            ),
            DynSolValue::Uint(
                U256::from_be_slice(&self.details.nonce.to_be_bytes::<6>()),
                48,
            ),
        ]);
        DynSolValue::Tuple(vec![
            details,
            DynSolValue::Address(self.spender),
            DynSolValue::Uint(self.sigDeadline, 256),
        ])
    }
}

impl SmartWallet {
    /// Signs a Permit2 single-token allowance on behalf of this account.
    ///
    /// The permit's `details.nonce` must come from a fresh
    /// `IAllowanceTransfer::allowance` read for `(account, token,
    /// spender)`; the caller owns the read-to-submit window.
    ///
    /// Returns the 65-byte `r ‖ s ‖ v` signature the Permit2 contract
    /// verifies.
    ///
    /// # Errors
    /// - Will throw an error if the EIP-712 hash cannot be computed.
    /// - Will throw an error if the signature process unexpectedly fails.
    pub fn sign_permit_single(
        &self,
        chain_id: u64,
        permit: &PermitSingle,
    ) -> Result<Bytes, SmartWalletError> {
        let signing_hash = permit
            .as_typed_data(chain_id)
            .eip712_signing_hash()
            .map_err(|e| {
                SmartWalletError::Encoding(format!(
                    "failed to calculate EIP-712 signing hash: {e}"
                ))
            })?;

        self.sign_digest_rsv(signing_hash)
    }
}
