use alloy::{
    primitives::{Bytes, FixedBytes},
    signers::{Signature, SignerSync},
};

use super::{SmartWallet, SmartWalletError};

/// Implements digest signing for the smart wallet's EOA key.
///
/// Every user signature in the sponsored pipeline (the EIP-7702
/// authorization, the execution typed data and Permit2 allowances) is an
/// ECDSA signature over a precomputed 32-byte digest. The on-chain
/// verifiers expect the compact 65-byte `r ‖ s ‖ v` form with `v` in
/// `{27, 28}`.
pub trait SmartWalletSigner {
    /// Signs an already pre-computed 32-byte digest.
    ///
    /// # Errors
    /// - Will throw an error if the signature process fails.
    fn sign_digest(
        &self,
        digest: FixedBytes<32>,
    ) -> Result<Signature, SmartWalletError>;

    /// Signs a pre-computed digest and serializes the signature into the
    /// on-chain-verifiable `r ‖ s ‖ v` form.
    ///
    /// # Errors
    /// - Will throw an error if the signature process fails.
    fn sign_digest_rsv(
        &self,
        digest: FixedBytes<32>,
    ) -> Result<Bytes, SmartWalletError> {
        Ok(Bytes::copy_from_slice(&self.sign_digest(digest)?.as_bytes()))
    }
}

impl SmartWalletSigner for SmartWallet {
    fn sign_digest(
        &self,
        digest: FixedBytes<32>,
    ) -> Result<Signature, SmartWalletError> {
        Ok(self.signer.sign_hash_sync(&digest)?)
    }
}
