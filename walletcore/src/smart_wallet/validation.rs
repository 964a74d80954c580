use alloy::primitives::{Address, FixedBytes, U256};
use alloy::sol;
use alloy::sol_types::{eip712_domain, SolStruct};

use super::{SmartWallet, SmartWalletError, SmartWalletSigner};

sol! {
    /// One unit of execution in a batch. Calls run in order; a failing
    /// call aborts the whole batch unless it is wrapped in a
    /// revert-tolerant router sub-plan.
    #[derive(Debug)]
    struct Call {
        address target;
        uint256 value;
        bytes data;
    }

    /// The typed message the on-chain validator recovers the user's key
    /// from before running a batch.
    #[derive(Debug)]
    struct Validation {
        address account;
        uint256 nonce;
        Call[] calls;
    }

    /// The `WalletCore` delegate contract, executed at the user's own
    /// address once delegation is in place.
    interface IWalletCore {
        function initialize() external;

        function executeWithValidator(
            Call[] calldata calls,
            address validator,
            bytes calldata signature
        ) external payable;
    }
}

/// The EIP-712 name the `WalletCore` validator verifies against.
const DOMAIN_NAME: &str = "WalletCore";

/// The EIP-712 version the `WalletCore` validator verifies against.
const DOMAIN_VERSION: &str = "1";

/// Computes the typed-data digest authorizing `calls` at `nonce`.
///
/// The domain is scoped to the delegate implementation and the chain, the
/// message to the account and its wallet nonce, so a signature can never
/// be replayed across chains, delegate versions or accounts.
#[must_use]
pub fn validation_signing_hash(
    chain_id: u64,
    delegate: Address,
    account: Address,
    nonce: U256,
    calls: &[Call],
) -> FixedBytes<32> {
    let domain = eip712_domain! {
        name: DOMAIN_NAME,
        version: DOMAIN_VERSION,
        chain_id: chain_id,
        verifying_contract: delegate,
    };

    let validation = Validation {
        account,
        nonce,
        calls: calls.to_vec(),
    };

    validation.eip712_signing_hash(&domain)
}

impl SmartWallet {
    /// Signs the execution of `calls` at `wallet_nonce` on behalf of this
    /// account, for on-chain verification by the validator behind
    /// `delegate`.
    ///
    /// `wallet_nonce` must be the value currently held by the account's
    /// storage clone, read immediately before calling this. The validator
    /// rejects signatures over any other nonce, so the caller owns the
    /// read-to-submit window.
    ///
    /// Returns the 65-byte `r ‖ s ‖ v` signature
    /// `executeWithValidator` expects.
    ///
    /// # Errors
    /// - Will throw an error if the signature process unexpectedly fails.
    pub fn sign_execution(
        &self,
        chain_id: u64,
        delegate: Address,
        wallet_nonce: U256,
        calls: &[Call],
    ) -> Result<alloy::primitives::Bytes, SmartWalletError> {
        let digest = validation_signing_hash(
            chain_id,
            delegate,
            self.address,
            wallet_nonce,
            calls,
        );
        log::debug!(
            "signing execution of {} calls for {} at nonce {wallet_nonce}",
            calls.len(),
            self.address
        );
        self.sign_digest_rsv(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TEST_USER_KEY;
    use alloy::primitives::{address, b256, bytes, hex};
    use alloy::sol_types::SolCall;

    const WALLET_CORE: Address =
        address!("0x6b483BE98D5fcA84d51Dff932EC1b87A9921F756");
    const USDT: Address = address!("0x55d398326f99059fF775485246999027B3197955");

    fn transfer_batch() -> Vec<Call> {
        vec![
            Call {
                target: USDT,
                value: U256::ZERO,
                // transfer(feeRecipient, 0.001e18)
                data: bytes!(
                    "0xa9059cbb0000000000000000000000006007723dac9bb830f622bb4561e8017f021b9fb500000000000000000000000000000000000000000000000000038d7ea4c68000"
                ),
            },
            Call {
                target: USDT,
                value: U256::ZERO,
                // transfer(destination, 0.01e18)
                data: bytes!(
                    "0xa9059cbb000000000000000000000000c474d30feea0500abaf9d169a1a760abad5f72ef000000000000000000000000000000000000000000000000002386f26fc10000"
                ),
            },
        ]
    }

    #[test]
    fn test_eip712_type_strings() {
        assert_eq!(
            Validation::eip712_encode_type(),
            "Validation(address account,uint256 nonce,Call[] calls)\
             Call(address target,uint256 value,bytes data)"
        );
        assert_eq!(
            alloy::primitives::keccak256(Call::eip712_encode_type().as_bytes()),
            b256!("0x84fa2cf05cd88e992eae77e851af68a4ee278dcff6ef504e487a55b3baadfbe5")
        );
    }

    #[test]
    fn test_validation_digest_golden_vector() {
        let account = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let digest = validation_signing_hash(
            56,
            WALLET_CORE,
            account,
            U256::ZERO,
            &transfer_batch(),
        );
        assert_eq!(
            digest,
            b256!("0x32742c94df97b79ea76981f91f355f0236edb86efde4b34bba7f57f88650ad19")
        );
    }

    #[test]
    fn test_digest_is_scoped_to_chain_and_nonce() {
        let account = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let calls = transfer_batch();

        assert_eq!(
            validation_signing_hash(8453, WALLET_CORE, account, U256::ZERO, &calls),
            b256!("0x59fb0503e045b60276033675b5ded37df2951a4ac98be82132629607ee4ed70c")
        );
        assert_eq!(
            validation_signing_hash(
                56,
                WALLET_CORE,
                account,
                U256::from(1),
                &calls
            ),
            b256!("0x6e76e28764b0eb69dd7ddab648f57d2aca0495b7ba45dc995fbd12c8e354000f")
        );

        // delegate and account each change the digest as well
        let base = validation_signing_hash(
            56,
            WALLET_CORE,
            account,
            U256::ZERO,
            &calls,
        );
        assert_ne!(
            base,
            validation_signing_hash(56, USDT, account, U256::ZERO, &calls)
        );
        assert_ne!(
            base,
            validation_signing_hash(56, WALLET_CORE, USDT, U256::ZERO, &calls)
        );
    }

    #[test]
    fn test_execution_signature_golden_vector() {
        let wallet = SmartWallet::new(TEST_USER_KEY).unwrap();
        let signature = wallet
            .sign_execution(56, WALLET_CORE, U256::ZERO, &transfer_batch())
            .unwrap();

        assert_eq!(
            hex::encode(&signature),
            "86d767e0b0847156f6d03b6500ef7213c9ddbfd563d9c0e94e13a4965280e8c6\
             62bf68fb8636275b9e7be470b11370018ab7cc5083e0cdbc181281ef1fb4e2f3\
             1b"
        );
    }

    #[test]
    fn test_wallet_core_selectors() {
        assert_eq!(IWalletCore::initializeCall::SELECTOR, hex!("8129fc1c"));
        assert_eq!(
            IWalletCore::executeWithValidatorCall::SELECTOR,
            hex!("fcfbd33a")
        );
    }
}
