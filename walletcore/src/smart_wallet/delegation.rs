use std::time::Duration;

use alloy::eips::eip7702::{Authorization, SignedAuthorization};
use alloy::primitives::Address;
use ruint::aliases::U256;
use tokio::time::{sleep, Instant};

use super::{SmartWallet, SmartWalletError, SmartWalletSigner};
use crate::rpc::{EthereumRpc, RpcError};

/// The EIP-7702 delegation designator. An upgraded account's code is this
/// prefix followed by the 20-byte delegate address.
pub const DELEGATION_PREFIX: [u8; 3] = [0xef, 0x01, 0x00];

/// How long [`await_delegation`] keeps polling before giving up.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(2 * 60);

/// Fixed interval between delegation-status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// What an account's on-chain code says about its delegation.
///
/// Transitions happen only through mined transactions; this crate observes
/// them, it never causes them directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DelegationStatus {
    /// The account has no code: a plain EOA.
    NotDelegated,
    /// The account's code is a delegation designator pointing at the
    /// contained address.
    DelegatedTo(Address),
    /// The account carries code that is not a delegation designator. The
    /// sponsored pipeline cannot operate on such an account.
    InvalidCode,
}

impl DelegationStatus {
    /// Classifies raw account code.
    #[must_use]
    pub fn from_code(code: &[u8]) -> Self {
        if code.is_empty() {
            Self::NotDelegated
        } else if code.len() == 23 && code.starts_with(&DELEGATION_PREFIX) {
            Self::DelegatedTo(Address::from_slice(&code[3..]))
        } else {
            Self::InvalidCode
        }
    }
}

impl SmartWallet {
    /// Signs an EIP-7702 authorization pointing this account's code at
    /// `delegate`.
    ///
    /// `nonce` must be the account's current transaction count: the
    /// sponsor, not the user, sends the upgrade transaction, so the
    /// account nonce is unchanged when the authorization is checked. An
    /// authorization is consumable exactly once; replaying it at the same
    /// nonce fails on-chain.
    ///
    /// # Errors
    /// - Will throw an error if the signature process unexpectedly fails.
    pub fn sign_delegation_authorization(
        &self,
        chain_id: u64,
        nonce: u64,
        delegate: Address,
    ) -> Result<SignedAuthorization, SmartWalletError> {
        let authorization = Authorization {
            chain_id: U256::from(chain_id),
            address: delegate,
            nonce,
        };

        let signature = self.sign_digest(authorization.signature_hash())?;
        log::debug!(
            "authorization signed: account {}, delegate {delegate}, nonce {nonce}, chain {chain_id}",
            self.address
        );
        Ok(authorization.into_signed(signature))
    }

    /// Signs an authorization that removes this account's delegation by
    /// pointing it at the zero address.
    ///
    /// # Errors
    /// - Will throw an error if the signature process unexpectedly fails.
    pub fn sign_delegation_revocation(
        &self,
        chain_id: u64,
        nonce: u64,
    ) -> Result<SignedAuthorization, SmartWalletError> {
        self.sign_delegation_authorization(chain_id, nonce, Address::ZERO)
    }
}

/// Reads `account`'s on-chain code and classifies its delegation.
///
/// # Errors
/// - Propagates RPC failures; the classification itself cannot fail.
pub async fn delegation_status(
    rpc: &EthereumRpc,
    account: Address,
) -> Result<DelegationStatus, RpcError> {
    let code = rpc.get_code(account).await?;
    let status = DelegationStatus::from_code(&code);
    match status {
        DelegationStatus::NotDelegated => {
            log::debug!("{account} is not delegated");
        }
        DelegationStatus::DelegatedTo(delegate) => {
            log::debug!("{account} is delegated to {delegate}");
        }
        DelegationStatus::InvalidCode => {
            log::warn!("{account} contains code but not a delegation designator");
        }
    }
    Ok(status)
}

/// Polls `account`'s delegation status at a fixed interval until it points
/// at `expected` or `max_wait` elapses.
///
/// Returns `true` on success and `false` on timeout; it never fails on the
/// timeout itself, and transient RPC errors during a poll are logged and
/// retried on the next tick. This bounded poll is the system's sole retry
/// mechanism; submissions themselves are never retried.
pub async fn await_delegation(
    rpc: &EthereumRpc,
    account: Address,
    expected: Address,
    max_wait: Duration,
    poll_interval: Duration,
) -> bool {
    let deadline = Instant::now() + max_wait;
    log::info!("waiting for {account} to delegate to {expected}");

    while Instant::now() < deadline {
        sleep(poll_interval).await;

        match delegation_status(rpc, account).await {
            Ok(DelegationStatus::DelegatedTo(delegate)) if delegate == expected => {
                log::info!("delegation of {account} to {expected} observed");
                return true;
            }
            Ok(_) => {}
            Err(e) => log::warn!("delegation poll for {account} failed: {e}"),
        }
    }

    log::warn!("delegation of {account} not observed within {max_wait:?}");
    false
}
