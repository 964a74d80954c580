//! End-to-end orchestration of the sponsored pipeline.
//!
//! Everything here is thin glue over the other modules, sequenced the only
//! way the chain allows: the authorization must be observed as mined
//! before the wallet nonce read means anything, and the nonce read must
//! immediately precede signature construction. All chain operations are
//! awaited one at a time; nothing runs in parallel.

use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{
    address,
    aliases::{U160, U48},
    Address, FixedBytes, U256,
};
use alloy::sol_types::SolCall;
use chrono::Utc;

pub use fees::{FeeEstimate, EXECUTE_GAS_LIMIT, UPGRADE_GAS_LIMIT};
pub use sponsor::{RelayParams, Sponsor};

/// Builders for the calls a batch is made of.
pub mod calls;

/// The fixed fee rule relay transactions use.
mod fees;

/// The sponsor account and its relay transactions.
mod sponsor;

use crate::primitives::Deployment;
use crate::router::{
    encode_path, CommandType, RoutePlanner, RouterError, MSG_SENDER,
    SOURCE_MSG_SENDER,
};
use crate::rpc::{EthereumRpc, RpcError};
use crate::smart_wallet::{
    await_delegation, delegation_status, derive_storage_address, Call,
    DelegationStatus, IWalletStorage, PermitDetails, PermitSingle, SmartWallet,
    SmartWalletError,
};
use calls::IERC20;

/// The validator contract `executeWithValidator` is pointed at: the
/// built-in ECDSA validator.
pub const DEFAULT_VALIDATOR: Address =
    address!("0x0000000000000000000000000000000000000001");

/// How far in the future permit and router deadlines are set.
const DEADLINE_WINDOW_SECS: u64 = 30 * 60;

/// Errors that can occur while orchestrating a sponsored flow.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A chain read or submission failed.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// A wallet-side signing or derivation step failed.
    #[error(transparent)]
    Wallet(#[from] SmartWalletError),
    /// A route plan could not be built.
    #[error(transparent)]
    Router(#[from] RouterError),
    /// Failed to decode a hex-encoded secret key into a k256 signer.
    #[error("failed to decode hex-encoded secret into k256 signer: {0}")]
    KeyDecoding(String),
    /// Error occurred during the signing process.
    #[error(transparent)]
    Signing(#[from] alloy::signers::Error),
    /// A contract view call returned something the ABI decoder rejects.
    #[error("failed to decode view call return: {0}")]
    ViewDecoding(String),
    /// The account's code is in a state this pipeline must not touch:
    /// ordinary contract code, or a delegation to a foreign contract.
    #[error("account {account} delegation is in an unexpected state: {status:?}")]
    UnexpectedDelegation {
        /// The account that was inspected.
        account: Address,
        /// What its code was classified as.
        status: DelegationStatus,
    },
    /// The upgrade transaction was submitted but the delegation was not
    /// observed before the polling deadline.
    #[error("delegation for {account} was not observed within {waited:?}")]
    DelegationTimedOut {
        /// The account whose delegation was awaited.
        account: Address,
        /// The polling bound that elapsed.
        waited: Duration,
    },
}

/// Everything a swap batch needs besides the wallet itself.
#[derive(Clone, Copy, Debug)]
pub struct SwapParams {
    /// Token the user sells.
    pub token_in: Address,
    /// Token the user receives.
    pub token_out: Address,
    /// Fee tier of the pool to route through.
    pub pool_fee: u32,
    /// Exact amount of `token_in` to sell.
    pub amount_in: U160,
    /// Lower bound on the `token_out` received, below which the swap
    /// reverts.
    pub min_amount_out: U256,
    /// Recipient of the service fee.
    pub fee_recipient: Address,
    /// Service fee, denominated in `token_in`.
    pub fee_amount: U256,
}

/// Orchestrates sponsored upgrades and executions for one chain.
///
/// One instance drives one wallet's flow at a time; the batch under
/// construction is exclusively owned until it is signed and handed to the
/// sponsor.
#[derive(Debug)]
pub struct SponsoredWallet {
    rpc: EthereumRpc,
    deployment: Deployment,
    sponsor: Sponsor,
    chain_id: u64,
}

impl SponsoredWallet {
    /// Creates an orchestrator over `rpc`, confirming the endpoint's chain
    /// id.
    ///
    /// # Errors
    /// - Propagates the chain-id read failure.
    pub async fn connect(
        rpc: EthereumRpc,
        deployment: Deployment,
        sponsor: Sponsor,
    ) -> Result<Self, FlowError> {
        let chain_id = rpc.chain_id().await?;
        log::info!("sponsored pipeline connected to chain {chain_id}");
        Ok(Self {
            rpc,
            deployment,
            sponsor,
            chain_id,
        })
    }

    /// The chain id the orchestrator confirmed at connection.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Makes sure `wallet`'s account delegates to the `WalletCore`
    /// implementation, performing the sponsored upgrade if it does not
    /// yet.
    ///
    /// Already-delegated accounts are a no-op. Accounts carrying foreign
    /// code or a foreign delegation abort the flow.
    ///
    /// # Errors
    /// - `FlowError::UnexpectedDelegation` for foreign code/delegations.
    /// - `FlowError::DelegationTimedOut` when the upgrade was submitted
    ///   but not observed before the polling deadline.
    /// - Propagates RPC and signing failures.
    pub async fn ensure_delegation(
        &self,
        wallet: &SmartWallet,
    ) -> Result<(), FlowError> {
        let account = wallet.address;
        match delegation_status(&self.rpc, account).await? {
            DelegationStatus::DelegatedTo(delegate)
                if delegate == self.deployment.wallet_core =>
            {
                log::info!("{account} already delegated to WalletCore");
                return Ok(());
            }
            DelegationStatus::NotDelegated => {}
            status => {
                return Err(FlowError::UnexpectedDelegation { account, status });
            }
        }

        let account_nonce = self.rpc.transaction_count(account).await?;
        let authorization = wallet.sign_delegation_authorization(
            self.chain_id,
            account_nonce,
            self.deployment.wallet_core,
        )?;

        let raw = self.sponsor.sign_upgrade_transaction(
            self.relay_params().await?,
            account,
            authorization,
        )?;
        let hash = self.rpc.send_raw_transaction(raw).await?;
        log::info!("upgrade transaction sent: {hash}");

        let delegated = await_delegation(
            &self.rpc,
            account,
            self.deployment.wallet_core,
            crate::smart_wallet::DEFAULT_MAX_WAIT,
            crate::smart_wallet::DEFAULT_POLL_INTERVAL,
        )
        .await;
        if !delegated {
            return Err(FlowError::DelegationTimedOut {
                account,
                waited: crate::smart_wallet::DEFAULT_MAX_WAIT,
            });
        }
        Ok(())
    }

    /// Removes `wallet`'s delegation by relaying a zero-address
    /// authorization, returning the transaction hash.
    ///
    /// # Errors
    /// - Propagates RPC and signing failures.
    pub async fn revoke_delegation(
        &self,
        wallet: &SmartWallet,
    ) -> Result<FixedBytes<32>, FlowError> {
        let account_nonce = self.rpc.transaction_count(wallet.address).await?;
        let authorization =
            wallet.sign_delegation_revocation(self.chain_id, account_nonce)?;

        let raw = self.sponsor.sign_revocation_transaction(
            self.relay_params().await?,
            wallet.address,
            authorization,
        )?;
        let hash = self.rpc.send_raw_transaction(raw).await?;
        log::info!("revocation transaction sent: {hash}");
        Ok(hash)
    }

    /// Reads the wallet nonce from `owner`'s storage clone.
    ///
    /// A clone that has not been deployed yet reports nonce zero. The
    /// returned value must flow straight into signing; holding it across
    /// other operations risks a stale signature.
    ///
    /// # Errors
    /// - Propagates RPC, derivation and decoding failures.
    pub async fn wallet_nonce(&self, owner: Address) -> Result<U256, FlowError> {
        let storage =
            derive_storage_address(self.deployment.storage_impl, owner)?;
        let code = self.rpc.get_code(storage).await?;
        if code.is_empty() {
            log::debug!("storage clone {storage} not deployed yet, nonce 0");
            return Ok(U256::ZERO);
        }

        let data = IWalletStorage::getNonceCall {}.abi_encode();
        let returned = self.rpc.call(storage, data.into()).await?;
        let nonce = IWalletStorage::getNonceCall::abi_decode_returns(&returned)
            .map_err(|e| FlowError::ViewDecoding(e.to_string()))?;
        log::debug!("storage clone {storage} nonce {nonce}");
        Ok(nonce)
    }

    /// Signs and relays `calls` through the wallet's
    /// `executeWithValidator`, returning the transaction hash.
    ///
    /// The caller must have confirmed delegation first; the on-chain
    /// validator rejects everything else.
    ///
    /// # Errors
    /// - Propagates RPC and signing failures.
    pub async fn execute(
        &self,
        wallet: &SmartWallet,
        calls: Vec<Call>,
    ) -> Result<FixedBytes<32>, FlowError> {
        let wallet_nonce = self.wallet_nonce(wallet.address).await?;
        let signature = wallet.sign_execution(
            self.chain_id,
            self.deployment.wallet_core,
            wallet_nonce,
            &calls,
        )?;

        let raw = self.sponsor.sign_execution_transaction(
            self.relay_params().await?,
            wallet.address,
            calls,
            DEFAULT_VALIDATOR,
            signature,
        )?;
        let hash = self.rpc.send_raw_transaction(raw).await?;
        log::info!("execution transaction sent: {hash}");
        Ok(hash)
    }

    /// Sponsored token transfer: the service fee to `fee_recipient`, then
    /// `send_amount` to `destination`, in one atomic batch.
    ///
    /// # Errors
    /// - Propagates RPC and signing failures.
    pub async fn transfer_with_fee(
        &self,
        wallet: &SmartWallet,
        token: Address,
        destination: Address,
        fee_recipient: Address,
        send_amount: U256,
        fee_amount: U256,
    ) -> Result<FixedBytes<32>, FlowError> {
        let batch = calls::transfer_with_fee_calls(
            token,
            destination,
            fee_recipient,
            send_amount,
            fee_amount,
        );
        self.execute(wallet, batch).await
    }

    /// Sponsored swap through the command router: a fresh Permit2
    /// allowance signature, the fee transfer and the routed swap in one
    /// atomic batch. Prepends an unlimited Permit2 approval when the
    /// token's current allowance cannot cover the sale.
    ///
    /// # Errors
    /// - Propagates RPC, routing and signing failures.
    pub async fn swap_via_router(
        &self,
        wallet: &SmartWallet,
        params: SwapParams,
    ) -> Result<FixedBytes<32>, FlowError> {
        let deadline = execution_deadline();
        let amount_in = widen(params.amount_in);

        // The permit nonce is read immediately before signing; anything
        // older risks an invalid signature.
        let permit_nonce = self
            .permit2_allowance_nonce(wallet.address, params.token_in)
            .await?;
        let permit = PermitSingle {
            details: PermitDetails {
                token: params.token_in,
                amount: params.amount_in,
                expiration: U48::ZERO,
                nonce: permit_nonce,
            },
            spender: self.deployment.swap_router,
            sigDeadline: deadline,
        };
        let permit_signature = wallet.sign_permit_single(self.chain_id, &permit)?;

        let mut planner = RoutePlanner::new();
        planner.add_command(
            CommandType::Permit2Permit,
            &[
                permit.as_dyn_value(),
                DynSolValue::Bytes(permit_signature.to_vec()),
            ],
            false,
        )?;
        let path =
            encode_path(&[params.token_in, params.token_out], &[params.pool_fee])?;
        planner.add_command(
            CommandType::V3SwapExactIn,
            &[
                DynSolValue::Address(MSG_SENDER),
                DynSolValue::Uint(amount_in, 256),
                DynSolValue::Uint(params.min_amount_out, 256),
                DynSolValue::Bytes(path.to_vec()),
                DynSolValue::Bool(SOURCE_MSG_SENDER),
            ],
            false,
        )?;
        let (commands, inputs) = planner.into_parts();

        let current_allowance = self
            .erc20_allowance(params.token_in, wallet.address)
            .await?;
        let needs_approve = current_allowance < amount_in;
        log::debug!(
            "permit2 allowance on {}: {current_allowance}, approval needed: {needs_approve}",
            params.token_in
        );

        let mut batch = Vec::with_capacity(3);
        if needs_approve {
            batch.push(calls::approve_call(
                params.token_in,
                self.deployment.permit2,
                U256::MAX,
            ));
        }
        batch.push(calls::transfer_call(
            params.token_in,
            params.fee_recipient,
            params.fee_amount,
        ));
        batch.push(calls::router_execute_call(
            self.deployment.swap_router,
            commands,
            inputs,
            deadline,
        ));

        self.execute(wallet, batch).await
    }

    /// Sponsor-side fee and nonce parameters for the next relay
    /// transaction.
    async fn relay_params(&self) -> Result<RelayParams, FlowError> {
        let gas_price = self.rpc.gas_price().await?;
        let nonce = self.rpc.transaction_count(self.sponsor.address).await?;
        Ok(RelayParams {
            chain_id: self.chain_id,
            nonce,
            fees: FeeEstimate::from_gas_price(gas_price),
        })
    }

    /// Fresh Permit2 allowance nonce for `(owner, token, router)`.
    async fn permit2_allowance_nonce(
        &self,
        owner: Address,
        token: Address,
    ) -> Result<U48, FlowError> {
        use crate::smart_wallet::IAllowanceTransfer;

        let data = IAllowanceTransfer::allowanceCall {
            user: owner,
            token,
            spender: self.deployment.swap_router,
        }
        .abi_encode();
        let returned = self.rpc.call(self.deployment.permit2, data.into()).await?;
        let allowance =
            IAllowanceTransfer::allowanceCall::abi_decode_returns(&returned)
                .map_err(|e| FlowError::ViewDecoding(e.to_string()))?;
        Ok(allowance.nonce)
    }

    /// The token's current ERC-20 allowance for the Permit2 contract.
    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<U256, FlowError> {
        let data = IERC20::allowanceCall {
            owner,
            spender: self.deployment.permit2,
        }
        .abi_encode();
        let returned = self.rpc.call(token, data.into()).await?;
        IERC20::allowanceCall::abi_decode_returns(&returned)
            .map_err(|e| FlowError::ViewDecoding(e.to_string()))
    }
}

/// Deadline for permits and router execution: now plus a fixed window.
fn execution_deadline() -> U256 {
    let now = Utc::now().timestamp().unsigned_abs();
    U256::from(now.saturating_add(DEADLINE_WINDOW_SECS))
}

/// Widens a `uint160` amount to the `uint256` the swap schema expects.
fn widen(amount: U160) -> U256 {
    U256::from_be_slice(&amount.to_be_bytes::<20>())
}
