use alloy::primitives::{address, Address};

use super::Network;

/// The contract addresses the sponsored pipeline talks to on one network.
///
/// `wallet_core` and `storage_impl` are deployed at the same address on
/// every supported network; the swap router is not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    /// The `WalletCore` delegate implementation user accounts point their
    /// code at.
    pub wallet_core: Address,
    /// The storage implementation each per-user clone proxies to.
    pub storage_impl: Address,
    /// The canonical Permit2 allowance contract.
    pub permit2: Address,
    /// The command-interpreting swap router.
    pub swap_router: Address,
}

impl Deployment {
    /// The deployment on BNB Smart Chain.
    #[must_use]
    pub const fn bsc() -> Self {
        Self {
            wallet_core: address!("0x6b483BE98D5fcA84d51Dff932EC1b87A9921F756"),
            storage_impl: address!("0x4bE37E398bB78CBD003c06724f1820aaDA59E6dB"),
            permit2: address!("0x000000000022D473030F116dDEE9F6B43aC78BA3"),
            swap_router: address!("0xcF74F56112f260DdEe729753553FbD18509DEF8F"),
        }
    }

    /// The deployment on Base.
    #[must_use]
    pub const fn base() -> Self {
        Self {
            wallet_core: address!("0x6b483BE98D5fcA84d51Dff932EC1b87A9921F756"),
            storage_impl: address!("0x4bE37E398bB78CBD003c06724f1820aaDA59E6dB"),
            permit2: address!("0x000000000022D473030F116dDEE9F6B43aC78BA3"),
            swap_router: address!("0x7947e5f78E78190eE2d62E36F04Ca008C7b69Afd"),
        }
    }

    /// Returns the deployment for `network`.
    #[must_use]
    pub const fn for_network(network: Network) -> Self {
        match network {
            Network::Bsc => Self::bsc(),
            Network::Base => Self::base(),
        }
    }
}
