use alloy::consensus::{SignableTransaction, TxEip1559, TxEip7702, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::eips::eip2930::AccessList;
use alloy::eips::eip7702::SignedAuthorization;
use alloy::hex;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::signers::{k256::ecdsa::SigningKey, local::LocalSigner, SignerSync};
use alloy::sol_types::SolCall;

use super::fees::{FeeEstimate, EXECUTE_GAS_LIMIT, UPGRADE_GAS_LIMIT};
use super::FlowError;
use crate::smart_wallet::{Call, IWalletCore};

/// Chain id, account nonce and fee parameters for one relay transaction.
/// The nonce is the sponsor's own; the user's account nonce is consumed
/// by the authorization, not by these transactions.
#[derive(Clone, Copy, Debug)]
pub struct RelayParams {
    /// The chain the transaction is for.
    pub chain_id: u64,
    /// The sponsor's current transaction count.
    pub nonce: u64,
    /// EIP-1559 fee parameters.
    pub fees: FeeEstimate,
}

/// The funded account that relays and pays for the user's transactions.
///
/// The sponsor signs ordinary (type-2) and delegation-carrying (type-4)
/// transactions addressed at the user's account; it never holds or sees
/// the user's key.
#[derive(Debug)]
pub struct Sponsor {
    signer: LocalSigner<SigningKey>,
    /// The sponsor's address, i.e. the gas payer.
    pub address: Address,
}

impl Sponsor {
    /// Initializes a new `Sponsor` from a hex-encoded secret key.
    ///
    /// # Errors
    /// - Will return an error if the key is not a validly encoded hex
    ///   string or not a valid point in the k256 curve.
    pub fn new(private_key: &str) -> Result<Self, FlowError> {
        let private_key = private_key.strip_prefix("0x").unwrap_or(private_key);
        let signer = LocalSigner::from_slice(
            &hex::decode(private_key)
                .map_err(|e| FlowError::KeyDecoding(e.to_string()))?,
        )
        .map_err(|e| FlowError::KeyDecoding(e.to_string()))?;

        let address = signer.address();
        log::debug!("initialized sponsor {address}");
        Ok(Self { signer, address })
    }

    /// Signs the type-4 transaction that applies `authorization` to
    /// `account` and calls `initialize()` on the freshly delegated code.
    ///
    /// # Errors
    /// - Will throw an error if the signature process unexpectedly fails.
    pub fn sign_upgrade_transaction(
        &self,
        params: RelayParams,
        account: Address,
        authorization: SignedAuthorization,
    ) -> Result<Bytes, FlowError> {
        self.sign_eip7702_transaction(
            params,
            account,
            authorization,
            IWalletCore::initializeCall {}.abi_encode().into(),
        )
    }

    /// Signs the type-4 transaction that carries a zero-address
    /// (revocation) authorization for `account`, with no calldata.
    ///
    /// # Errors
    /// - Will throw an error if the signature process unexpectedly fails.
    pub fn sign_revocation_transaction(
        &self,
        params: RelayParams,
        account: Address,
        authorization: SignedAuthorization,
    ) -> Result<Bytes, FlowError> {
        self.sign_eip7702_transaction(params, account, authorization, Bytes::new())
    }

    /// Signs the type-2 transaction that runs `calls` on the user's
    /// upgraded account through `executeWithValidator`.
    ///
    /// # Errors
    /// - Will throw an error if the signature process unexpectedly fails.
    pub fn sign_execution_transaction(
        &self,
        params: RelayParams,
        account: Address,
        calls: Vec<Call>,
        validator: Address,
        signature: Bytes,
    ) -> Result<Bytes, FlowError> {
        let input = IWalletCore::executeWithValidatorCall {
            calls,
            validator,
            signature,
        }
        .abi_encode();

        let transaction = TxEip1559 {
            chain_id: params.chain_id,
            nonce: params.nonce,
            gas_limit: EXECUTE_GAS_LIMIT,
            max_fee_per_gas: params.fees.max_fee_per_gas,
            max_priority_fee_per_gas: params.fees.max_priority_fee_per_gas,
            to: TxKind::Call(account),
            value: U256::ZERO,
            access_list: AccessList::default(),
            input: input.into(),
        };

        let signature = self.signer.sign_hash_sync(&transaction.signature_hash())?;
        let envelope = TxEnvelope::from(transaction.into_signed(signature));
        Ok(envelope.encoded_2718().into())
    }

    fn sign_eip7702_transaction(
        &self,
        params: RelayParams,
        account: Address,
        authorization: SignedAuthorization,
        input: Bytes,
    ) -> Result<Bytes, FlowError> {
        let transaction = TxEip7702 {
            chain_id: params.chain_id,
            nonce: params.nonce,
            gas_limit: UPGRADE_GAS_LIMIT,
            max_fee_per_gas: params.fees.max_fee_per_gas,
            max_priority_fee_per_gas: params.fees.max_priority_fee_per_gas,
            to: account,
            value: U256::ZERO,
            access_list: AccessList::default(),
            authorization_list: vec![authorization],
            input,
        };

        let signature = self.signer.sign_hash_sync(&transaction.signature_hash())?;
        let envelope = TxEnvelope::from(transaction.into_signed(signature));
        Ok(envelope.encoded_2718().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smart_wallet::SmartWallet;
    use crate::test_utils::{TEST_SPONSOR_KEY, TEST_USER_KEY};
    use alloy::eips::eip2718::Decodable2718;
    use alloy::primitives::address;

    const WALLET_CORE: Address =
        address!("0x6b483BE98D5fcA84d51Dff932EC1b87A9921F756");

    fn relay_params() -> RelayParams {
        RelayParams {
            chain_id: 56,
            nonce: 3,
            fees: FeeEstimate::from_gas_price(1_000_000_000),
        }
    }

    #[test]
    fn test_sponsor_address() {
        let sponsor = Sponsor::new(TEST_SPONSOR_KEY).unwrap();
        assert_eq!(
            sponsor.address,
            address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn test_upgrade_transaction_round_trips() {
        let sponsor = Sponsor::new(TEST_SPONSOR_KEY).unwrap();
        let user = SmartWallet::new(TEST_USER_KEY).unwrap();
        let authorization = user
            .sign_delegation_authorization(56, 5, WALLET_CORE)
            .unwrap();

        let raw = sponsor
            .sign_upgrade_transaction(relay_params(), user.address, authorization)
            .unwrap();
        assert_eq!(raw[0], 0x04);

        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
        let TxEnvelope::Eip7702(signed) = envelope else {
            panic!("expected a type-4 transaction");
        };

        let tx = signed.tx();
        assert_eq!(tx.chain_id, 56);
        assert_eq!(tx.nonce, 3);
        assert_eq!(tx.gas_limit, UPGRADE_GAS_LIMIT);
        assert_eq!(tx.to, user.address);
        assert_eq!(tx.value, U256::ZERO);
        assert_eq!(tx.input.as_ref(), IWalletCore::initializeCall::SELECTOR);
        assert_eq!(tx.authorization_list.len(), 1);
        assert_eq!(tx.authorization_list[0].address, WALLET_CORE);
        assert_eq!(tx.authorization_list[0].nonce, 5);
    }

    #[test]
    fn test_revocation_transaction_has_no_calldata() {
        let sponsor = Sponsor::new(TEST_SPONSOR_KEY).unwrap();
        let user = SmartWallet::new(TEST_USER_KEY).unwrap();
        let authorization = user.sign_delegation_revocation(56, 6).unwrap();

        let raw = sponsor
            .sign_revocation_transaction(relay_params(), user.address, authorization)
            .unwrap();

        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
        let TxEnvelope::Eip7702(signed) = envelope else {
            panic!("expected a type-4 transaction");
        };
        assert!(signed.tx().input.is_empty());
        assert_eq!(signed.tx().authorization_list[0].address, Address::ZERO);
    }

    #[test]
    fn test_execution_transaction_round_trips() {
        let sponsor = Sponsor::new(TEST_SPONSOR_KEY).unwrap();
        let user = SmartWallet::new(TEST_USER_KEY).unwrap();
        let validator = address!("0x0000000000000000000000000000000000000001");

        let calls = super::super::calls::transfer_with_fee_calls(
            address!("0x55d398326f99059fF775485246999027B3197955"),
            address!("0xc474D30fEeA0500aBaf9D169A1A760aBad5f72ef"),
            address!("0x6007723DAC9Bb830f622bB4561E8017f021b9fB5"),
            U256::from(10_000_000_000_000_000_u64),
            U256::from(1_000_000_000_000_000_u64),
        );
        let signature = user
            .sign_execution(56, WALLET_CORE, U256::ZERO, &calls)
            .unwrap();

        let raw = sponsor
            .sign_execution_transaction(
                relay_params(),
                user.address,
                calls,
                validator,
                signature,
            )
            .unwrap();
        assert_eq!(raw[0], 0x02);

        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap();
        let TxEnvelope::Eip1559(signed) = envelope else {
            panic!("expected a type-2 transaction");
        };
        assert_eq!(signed.tx().gas_limit, EXECUTE_GAS_LIMIT);
        assert_eq!(signed.tx().to, TxKind::Call(user.address));
        assert_eq!(
            &signed.tx().input[..4],
            IWalletCore::executeWithValidatorCall::SELECTOR
        );
    }
}
