use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::router::ISwapRouter;
use crate::smart_wallet::Call;

sol! {
    /// The ERC20 contract interface.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-20>
    interface IERC20 {
        function transfer(address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
}

/// A [`Call`] transferring `amount` of `token` to `to`.
#[must_use]
pub fn transfer_call(token: Address, to: Address, amount: U256) -> Call {
    Call {
        target: token,
        value: U256::ZERO,
        data: IERC20::transferCall { to, value: amount }.abi_encode().into(),
    }
}

/// A [`Call`] approving `spender` for `amount` of `token`.
#[must_use]
pub fn approve_call(token: Address, spender: Address, amount: U256) -> Call {
    Call {
        target: token,
        value: U256::ZERO,
        data: IERC20::approveCall {
            spender,
            value: amount,
        }
        .abi_encode()
        .into(),
    }
}

/// The fee-then-payout batch of a sponsored token transfer: the service
/// fee goes to `fee_recipient` first, the remainder of the user's intent
/// to `destination`.
#[must_use]
pub fn transfer_with_fee_calls(
    token: Address,
    destination: Address,
    fee_recipient: Address,
    send_amount: U256,
    fee_amount: U256,
) -> Vec<Call> {
    vec![
        transfer_call(token, fee_recipient, fee_amount),
        transfer_call(token, destination, send_amount),
    ]
}

/// A [`Call`] into the swap router's command interpreter.
#[must_use]
pub fn router_execute_call(
    router: Address,
    commands: Bytes,
    inputs: Vec<Bytes>,
    deadline: U256,
) -> Call {
    Call {
        target: router,
        value: U256::ZERO,
        data: ISwapRouter::executeCall {
            commands,
            inputs,
            deadline,
        }
        .abi_encode()
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, hex};

    const USDT: Address = address!("0x55d398326f99059fF775485246999027B3197955");
    const PERMIT2: Address =
        address!("0x000000000022D473030F116dDEE9F6B43aC78BA3");

    #[test]
    fn test_transfer_with_fee_orders_the_fee_first() {
        let destination = address!("0xc474D30fEeA0500aBaf9D169A1A760aBad5f72ef");
        let fee_recipient =
            address!("0x6007723DAC9Bb830f622bB4561E8017f021b9fB5");

        let calls = transfer_with_fee_calls(
            USDT,
            destination,
            fee_recipient,
            U256::from(10_000_000_000_000_000_u64),
            U256::from(1_000_000_000_000_000_u64),
        );

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].target, USDT);
        assert_eq!(calls[1].target, USDT);
        assert_eq!(calls[0].value, U256::ZERO);
        assert_eq!(
            hex::encode(&calls[0].data),
            "a9059cbb0000000000000000000000006007723dac9bb830f622bb4561e8017\
             f021b9fb500000000000000000000000000000000000000000000000000038d7\
             ea4c68000"
        );
        assert_eq!(
            hex::encode(&calls[1].data),
            "a9059cbb000000000000000000000000c474d30feea0500abaf9d169a1a760a\
             bad5f72ef000000000000000000000000000000000000000000000000002386f\
             26fc10000"
        );
    }

    #[test]
    fn test_unlimited_approval_encoding() {
        let call = approve_call(USDT, PERMIT2, U256::MAX);
        assert_eq!(
            hex::encode(&call.data),
            "095ea7b3000000000000000000000000000000000022d473030f116ddee9f6b\
             43ac78ba3fffffffffffffffffffffffffffffffffffffffffffffffffffffff\
             fffffffff"
        );
    }

    #[test]
    fn test_router_execute_call_selector() {
        let call = router_execute_call(
            address!("0xcF74F56112f260DdEe729753553FbD18509DEF8F"),
            Bytes::from_static(&[0x0a, 0x00]),
            vec![Bytes::new(), Bytes::new()],
            U256::from(1_893_456_000_u64),
        );
        assert_eq!(&call.data[..4], &hex!("3593564c"));
    }
}
