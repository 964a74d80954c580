use alloy::primitives::{Address, Bytes};

use super::RouterError;

/// Largest pool fee the 3-byte path slot can carry.
const MAX_POOL_FEE: u32 = 0x00ff_ffff;

/// Encodes a V3 swap path: `token ‖ fee ‖ token ‖ fee ‖ … ‖ token`, with
/// each fee packed big-endian into 3 bytes.
///
/// # Errors
/// - `RouterError::InvalidPath` unless there are at least two tokens,
///   exactly one fee per hop, and every fee fits in 24 bits.
pub fn encode_path(
    tokens: &[Address],
    fees: &[u32],
) -> Result<Bytes, RouterError> {
    if tokens.len() < 2 {
        return Err(RouterError::InvalidPath(format!(
            "a path needs at least two tokens, got {}",
            tokens.len()
        )));
    }
    if fees.len() + 1 != tokens.len() {
        return Err(RouterError::InvalidPath(format!(
            "{} tokens require {} fees, got {}",
            tokens.len(),
            tokens.len() - 1,
            fees.len()
        )));
    }

    let mut path = Vec::with_capacity(tokens.len() * 20 + fees.len() * 3);
    path.extend_from_slice(tokens[0].as_slice());
    for (token, fee) in tokens[1..].iter().zip(fees) {
        if *fee > MAX_POOL_FEE {
            return Err(RouterError::InvalidPath(format!(
                "pool fee {fee} does not fit in 24 bits"
            )));
        }
        path.extend_from_slice(&fee.to_be_bytes()[1..]);
        path.extend_from_slice(token.as_slice());
    }
    Ok(path.into())
}
