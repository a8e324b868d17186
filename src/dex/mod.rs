//! Contract bindings and calldata for the wrapped-native token, the quoter and the
//! swap router.

use ethers::contract::abigen;

pub mod calc;
pub mod client;

pub use calc::{
    apply_gas_margin, encode_exact_input_single, encode_path, encode_swap_multicall,
    swap_deadline,
};
pub use client::{ChainClient, RpcChain};

abigen!(
    WrappedNative,
    r"[
        function deposit() payable
        function balanceOf(address account) view returns (uint256)
        function allowance(address owner, address spender) view returns (uint256)
        function approve(address spender, uint256 amount) returns (bool)
    ]",
);

abigen!(
    Quoter,
    r"[
        function quoteExactInput(bytes path, uint256 amountIn) returns (uint256 amountOut)
    ]",
);

abigen!(
    SwapRouter,
    r"[
        function multicall(uint256 deadline, bytes[] data) payable returns (bytes[])
    ]",
);
