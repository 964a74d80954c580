use std::sync::LazyLock;

use alloy::primitives::{keccak256, Address, FixedBytes};
use alloy::sol_types::SolValue;
use alloy::{hex, sol};

use super::SmartWalletError;

sol! {
    /// The per-user storage clone behind each upgraded account. It holds
    /// the wallet nonce the execution signature commits to.
    interface IWalletStorage {
        function getNonce() external view returns (uint256);
    }
}

/// Salt the wallet uses when deploying its storage clone.
static STORAGE_SALT: LazyLock<FixedBytes<32>> =
    LazyLock::new(|| keccak256("storage"));

/// First section of the minimal-proxy runtime: the deployment stub plus the
/// delegation preamble, up to where the implementation address is spliced
/// in.
const CLONE_PREFIX: [u8; 17] = hex!("3d81600a3d39f3363d3d373d3d3d363d73");

/// Remainder of the minimal-proxy runtime after the implementation address.
const CLONE_SUFFIX: [u8; 15] = hex!("5af43d82803e903d91602b57fd5bf3");

/// Fixed length of prefix + implementation + suffix, before the immutable
/// arguments are appended.
const CLONE_BASE_LEN: usize = 45;

/// Longest immutable-argument blob the 16-bit proxy length field can carry
/// without the clone exceeding the EVM contract size ceiling.
const MAX_IMMUTABLE_ARGS_LEN: usize = 24531;

/// Builds the creation bytecode of a minimal-proxy clone of
/// `implementation` carrying `immutable_args` appended after the stub.
///
/// The layout must match the factory's byte for byte, or the derived
/// CREATE2 address will not agree with the chain:
/// `0x61 ‖ u16(args_len + 45) ‖ prefix ‖ implementation ‖ suffix ‖ args`.
///
/// # Errors
/// - `SmartWalletError::CloneArgumentsTooLong` if `immutable_args` exceeds
///   24531 bytes.
pub fn clone_bytecode(
    implementation: Address,
    immutable_args: &[u8],
) -> Result<Vec<u8>, SmartWalletError> {
    if immutable_args.len() > MAX_IMMUTABLE_ARGS_LEN {
        return Err(SmartWalletError::CloneArgumentsTooLong(
            immutable_args.len(),
        ));
    }

    #[allow(clippy::cast_possible_truncation)]
    let total_len = (immutable_args.len() + CLONE_BASE_LEN) as u16;

    let mut bytecode =
        Vec::with_capacity(3 + CLONE_BASE_LEN + immutable_args.len());
    bytecode.push(0x61); // PUSH2
    bytecode.extend_from_slice(&total_len.to_be_bytes());
    bytecode.extend_from_slice(&CLONE_PREFIX);
    bytecode.extend_from_slice(implementation.as_slice());
    bytecode.extend_from_slice(&CLONE_SUFFIX);
    bytecode.extend_from_slice(immutable_args);
    Ok(bytecode)
}

/// Computes the deterministic address of the storage clone an upgraded
/// account deploys for itself.
///
/// The wallet deploys the clone from its own address via CREATE2 with a
/// fixed salt, passing its address as the clone's immutable argument, so
/// the result is a pure function of `(storage_impl, owner)` and can be
/// derived off-chain before the clone exists.
///
/// # Errors
/// - `SmartWalletError::CloneArgumentsTooLong` if the encoded immutable
///   arguments exceed the proxy template's bound (unreachable for a single
///   ABI-encoded address, but part of the template's contract).
pub fn derive_storage_address(
    storage_impl: Address,
    owner: Address,
) -> Result<Address, SmartWalletError> {
    let immutable_args = owner.abi_encode();
    let bytecode = clone_bytecode(storage_impl, &immutable_args)?;
    Ok(owner.create2(*STORAGE_SALT, keccak256(&bytecode)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    const STORAGE_IMPL: Address =
        address!("0x4bE37E398bB78CBD003c06724f1820aaDA59E6dB");

    #[test]
    fn test_storage_salt() {
        assert_eq!(
            *STORAGE_SALT,
            b256!("0x835fe13a5db37080bfbfae639e6c19be9719e0fbdd4db062eb83cceb4d85a7fe")
        );
    }

    #[test]
    fn test_clone_bytecode_layout() {
        let owner = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let bytecode = clone_bytecode(STORAGE_IMPL, &owner.abi_encode()).unwrap();

        assert_eq!(
            hex::encode(bytecode),
            "61004d3d81600a3d39f3363d3d373d3d3d363d734be37e398bb78cbd003c067\
             24f1820aada59e6db5af43d82803e903d91602b57fd5bf300000000000000000\
             0000000f39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_derive_storage_address_golden_vector() {
        // Cross-checked against `Create2.computeAddress` with the same
        // salt and init code hash.
        assert_eq!(
            derive_storage_address(
                STORAGE_IMPL,
                address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
            )
            .unwrap(),
            address!("0x574a3d21b12ec633d75045d63f6c446e8ce30ceb")
        );
        assert_eq!(
            derive_storage_address(
                STORAGE_IMPL,
                address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
            )
            .unwrap(),
            address!("0x9b68165b9a85134898dc0696f01daa8174d458f1")
        );
    }

    #[test]
    fn test_derivation_is_deterministic_and_owner_sensitive() {
        let a = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let b = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

        assert_eq!(
            derive_storage_address(STORAGE_IMPL, a).unwrap(),
            derive_storage_address(STORAGE_IMPL, a).unwrap()
        );
        assert_ne!(
            derive_storage_address(STORAGE_IMPL, a).unwrap(),
            derive_storage_address(STORAGE_IMPL, b).unwrap()
        );
        assert_ne!(
            derive_storage_address(STORAGE_IMPL, a).unwrap(),
            derive_storage_address(a, a).unwrap()
        );
    }

    #[test]
    fn test_immutable_args_boundary() {
        // 24531 bytes keeps the clone exactly at the contract size
        // ceiling; one more byte must be refused.
        let at_bound = vec![0u8; 24531];
        let bytecode = clone_bytecode(STORAGE_IMPL, &at_bound).unwrap();
        assert_eq!(bytecode.len(), 3 + 45 + 24531);
        assert_eq!(&bytecode[1..3], &[0x60, 0x00]); // 24576 == 0x6000

        let over_bound = vec![0u8; 24532];
        let result = clone_bytecode(STORAGE_IMPL, &over_bound);
        assert!(matches!(
            result,
            Err(SmartWalletError::CloneArgumentsTooLong(24532))
        ));
    }
}
