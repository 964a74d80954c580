use std::collections::BTreeMap;
use std::sync::LazyLock;

use alloy::dyn_abi::DynSolType;
use alloy::primitives::{address, Address};

/// Top bit of a command byte: when set, the interpreter tolerates this
/// command reverting without aborting the surrounding plan.
pub const FLAG_ALLOW_REVERT: u8 = 0x80;

/// Mask selecting the command id from a command byte.
pub const COMMAND_TYPE_MASK: u8 = 0x7f;

/// Recipient sentinel the interpreter replaces with the caller.
pub const MSG_SENDER: Address =
    address!("0x0000000000000000000000000000000000000001");

/// Recipient sentinel the interpreter replaces with the router itself.
pub const ADDRESS_THIS: Address =
    address!("0x0000000000000000000000000000000000000002");

/// Payer flag: funds for a swap come from the caller (through Permit2).
pub const SOURCE_MSG_SENDER: bool = true;

/// Payer flag: funds for a swap are already held by the router.
pub const SOURCE_ROUTER: bool = false;

/// The command ids the on-chain interpreter dispatches on.
///
/// The numeric values are the wire format; they must match the deployed
/// interpreter exactly. Ids stay within [`COMMAND_TYPE_MASK`] so the
/// allow-revert bit never collides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum CommandType {
    /// Exact-input swap through V3-style pools.
    V3SwapExactIn = 0x00,
    /// Exact-output swap through V3-style pools.
    V3SwapExactOut = 0x01,
    /// Move tokens from the caller via a previously granted Permit2
    /// allowance.
    Permit2TransferFrom = 0x02,
    /// Consume a signed batched Permit2 allowance.
    Permit2PermitBatch = 0x03,
    /// Send the router's whole balance of a token to a recipient.
    Sweep = 0x04,
    /// Send a fixed token amount from the router to a recipient.
    Transfer = 0x05,
    /// Send a basis-point portion of the router's token balance to a
    /// recipient (fee payouts).
    PayPortion = 0x06,
    /// Exact-input swap through V2-style pair hops.
    V2SwapExactIn = 0x08,
    /// Exact-output swap through V2-style pair hops.
    V2SwapExactOut = 0x09,
    /// Consume a signed single-token Permit2 allowance.
    Permit2Permit = 0x0a,
    /// Wrap native currency held by the router.
    WrapEth = 0x0b,
    /// Unwrap wrapped native currency held by the router.
    UnwrapWeth = 0x0c,
    /// Batched [`Self::Permit2TransferFrom`].
    Permit2TransferFromBatch = 0x0d,
    /// Assert a minimum ERC-20 balance, aborting the plan below it.
    BalanceCheckErc20 = 0x0e,
    /// Swap through the V4 pool manager with its own action encoding.
    V4Swap = 0x10,
    /// Run a nested `(commands, inputs)` plan. The only revert-tolerant
    /// command: a failing sub-plan does not abort its parent.
    ExecuteSubPlan = 0x21,
}

impl CommandType {
    /// The wire byte for this command, without flags.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether the interpreter accepts the allow-revert flag on this
    /// command.
    #[must_use]
    pub const fn allows_revert(self) -> bool {
        matches!(self, Self::ExecuteSubPlan)
    }

    /// The fixed ABI schema this command's input blob is encoded against.
    #[must_use]
    pub fn abi_schema(self) -> &'static [DynSolType] {
        &COMMAND_SCHEMAS[&self]
    }
}

/// `((token, amount, expiration, nonce), spender, sigDeadline)`
fn permit_single_type() -> DynSolType {
    DynSolType::Tuple(vec![
        permit_details_type(),
        DynSolType::Address,
        DynSolType::Uint(256),
    ])
}

fn permit_details_type() -> DynSolType {
    DynSolType::Tuple(vec![
        DynSolType::Address,
        DynSolType::Uint(160),
        DynSolType::Uint(48),
        DynSolType::Uint(48),
    ])
}

/// The command → parameter-schema table. Pure lookup data, built once; the
/// on-chain interpreter decodes each input blob against the same rows.
static COMMAND_SCHEMAS: LazyLock<BTreeMap<CommandType, Vec<DynSolType>>> =
    LazyLock::new(|| {
        use CommandType::{
            BalanceCheckErc20, ExecuteSubPlan, PayPortion, Permit2Permit,
            Permit2PermitBatch, Permit2TransferFrom, Permit2TransferFromBatch,
            Sweep, Transfer, UnwrapWeth, V2SwapExactIn, V2SwapExactOut, V3SwapExactIn,
            V3SwapExactOut, V4Swap, WrapEth,
        };
        use DynSolType::{Address, Bool, Bytes, Uint};

        let v3_swap = || vec![Address, Uint(256), Uint(256), Bytes, Bool];
        let v2_swap = || {
            vec![
                Address,
                Uint(256),
                Uint(256),
                DynSolType::Array(Box::new(Address)),
                Bool,
            ]
        };
        let token_recipient_amount = || vec![Address, Address, Uint(256)];

        BTreeMap::from([
            (V3SwapExactIn, v3_swap()),
            (V3SwapExactOut, v3_swap()),
            (Permit2TransferFrom, vec![Address, Address, Uint(160)]),
            (
                Permit2PermitBatch,
                vec![
                    DynSolType::Tuple(vec![
                        DynSolType::Array(Box::new(permit_details_type())),
                        Address,
                        Uint(256),
                    ]),
                    Bytes,
                ],
            ),
            (Sweep, token_recipient_amount()),
            (Transfer, token_recipient_amount()),
            (PayPortion, token_recipient_amount()),
            (V2SwapExactIn, v2_swap()),
            (V2SwapExactOut, v2_swap()),
            (Permit2Permit, vec![permit_single_type(), Bytes]),
            (WrapEth, vec![Address, Uint(256)]),
            (UnwrapWeth, vec![Address, Uint(256)]),
            (
                Permit2TransferFromBatch,
                vec![DynSolType::Array(Box::new(DynSolType::Tuple(vec![
                    Address,
                    Address,
                    Uint(160),
                    Address,
                ])))],
            ),
            (BalanceCheckErc20, token_recipient_amount()),
            (V4Swap, vec![Bytes, DynSolType::Array(Box::new(Bytes))]),
            (ExecuteSubPlan, vec![Bytes, DynSolType::Array(Box::new(Bytes))]),
        ])
    });

/// Every command the table knows, in id order. Exposed for exhaustive
/// checks.
#[cfg(test)]
pub(crate) const ALL_COMMANDS: [CommandType; 16] = [
    CommandType::V3SwapExactIn,
    CommandType::V3SwapExactOut,
    CommandType::Permit2TransferFrom,
    CommandType::Permit2PermitBatch,
    CommandType::Sweep,
    CommandType::Transfer,
    CommandType::PayPortion,
    CommandType::V2SwapExactIn,
    CommandType::V2SwapExactOut,
    CommandType::Permit2Permit,
    CommandType::WrapEth,
    CommandType::UnwrapWeth,
    CommandType::Permit2TransferFromBatch,
    CommandType::BalanceCheckErc20,
    CommandType::V4Swap,
    CommandType::ExecuteSubPlan,
];
