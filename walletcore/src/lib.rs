#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

//! `walletcore` is the library which powers sponsored execution for
//! EIP-7702 upgraded EOA wallets.
//!
//! A user's externally-owned account is pointed at the `WalletCore`
//! delegate contract through a signed authorization, after which a funded
//! sponsor account relays batched calls (token transfers, fee payments,
//! DEX swaps) on the user's behalf. This crate covers the off-chain half
//! of that pipeline: deterministic storage-clone addresses, the router
//! command encoding, both user signatures (delegation authorization and
//! execution typed data) and the sponsor's relay transactions.

/// Introduces low level operations with the user's upgraded EOA, including
/// delegation authorizations (EIP-7702), execution typed data (EIP-712)
/// and Permit2 allowances.
pub mod smart_wallet;

/// Introduces low level primitives: supported networks and the per-network
/// contract deployments.
pub mod primitives;

/// Builds opaque command plans for the on-chain swap router interpreter.
pub mod router;

/// JSON-RPC chain access through an embedder-provided HTTP client.
pub mod rpc;

/// Sequences the sponsored upgrade and execution flows end to end.
pub mod flow;

#[cfg(test)]
pub(crate) mod test_utils;
