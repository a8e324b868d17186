use crate::dex::MulticallCall;
use ethers::{
    abi::{AbiEncode, Token, encode},
    types::{Address, Bytes, U256},
};
use std::time::{SystemTime, UNIX_EPOCH};

/// `exactInputSingle((address,address,uint24,address,uint256,uint256,uint160))`
pub const EXACT_INPUT_SINGLE_SELECTOR: [u8; 4] = [0x04, 0xe4, 0x5a, 0xaf];

/// Largest value a `uint24` fee tier can hold.
const MAX_FEE: u32 = 0x00ff_ffff;

/// Single-hop V3 path: `token_in ++ fee (3 bytes, big-endian) ++ token_out`.
pub fn encode_path(token_in: Address, fee: u32, token_out: Address) -> Bytes {
    let fee = fee.min(MAX_FEE).to_be_bytes();
    let mut path = Vec::with_capacity(43);
    path.extend_from_slice(token_in.as_bytes());
    path.extend_from_slice(&fee[1..]);
    path.extend_from_slice(token_out.as_bytes());
    path.into()
}

/// Calldata for a router `exactInputSingle` with no price limit.
pub fn encode_exact_input_single(
    token_in: Address,
    token_out: Address,
    fee: u32,
    recipient: Address,
    amount_in: U256,
    amount_out_min: U256,
) -> Bytes {
    let params = encode(&[
        Token::Address(token_in),
        Token::Address(token_out),
        Token::Uint(U256::from(fee.min(MAX_FEE))),
        Token::Address(recipient),
        Token::Uint(amount_in),
        Token::Uint(amount_out_min),
        Token::Uint(U256::zero()),
    ]);
    let mut data = EXACT_INPUT_SINGLE_SELECTOR.to_vec();
    data.extend_from_slice(&params);
    data.into()
}

/// Wrap one router sub-call into `multicall(deadline, [call])`.
pub fn encode_swap_multicall(deadline: U256, call: Bytes) -> Bytes {
    MulticallCall {
        deadline,
        data: vec![call],
    }
    .encode()
    .into()
}

/// Unix timestamp `offset_secs` from now.
pub fn swap_deadline(offset_secs: u64) -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    U256::from(now.saturating_add(offset_secs))
}

/// Gas estimate plus `margin_percent`, floored.
pub fn apply_gas_margin(estimate: U256, margin_percent: u32) -> U256 {
    let factor = U256::from(100u32) + U256::from(margin_percent);
    estimate.saturating_mul(factor) / U256::from(100u32)
}
