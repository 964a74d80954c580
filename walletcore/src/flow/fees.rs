/// Gas limit for the upgrade (type-4) transaction.
pub const UPGRADE_GAS_LIMIT: u64 = 250_000;

/// Gas limit for the execution (type-2) transaction.
pub const EXECUTE_GAS_LIMIT: u64 = 300_000;

/// Flat 0.1 gwei tip added on top of the quoted gas price.
const PRIORITY_FEE_WEI: u128 = 100_000_000;

/// EIP-1559 fee parameters for one relay transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeEstimate {
    /// Cap on the total per-gas price.
    pub max_fee_per_gas: u128,
    /// Tip per gas offered to the block producer.
    pub max_priority_fee_per_gas: u128,
}

impl FeeEstimate {
    /// Derives fees from a quoted gas price: the quoted price plus a flat
    /// 0.1 gwei tip.
    #[must_use]
    pub const fn from_gas_price(gas_price: u128) -> Self {
        Self {
            max_fee_per_gas: gas_price.saturating_add(PRIORITY_FEE_WEI),
            max_priority_fee_per_gas: PRIORITY_FEE_WEI,
        }
    }
}
