use alloy_sol_types::sol;

sol! {
    /// Read and simulated-write surface of the concentrated-liquidity position NFT manager.
    interface INonfungiblePositionManager {
        struct CollectParams {
            uint256 tokenId;
            address recipient;
            uint128 amount0Max;
            uint128 amount1Max;
        }

        function positions(uint256 tokenId)
            external
            view
            returns (
                uint96 nonce,
                address operator,
                address token0,
                address token1,
                uint24 fee,
                int24 tickLower,
                int24 tickUpper,
                uint128 liquidity,
                uint256 feeGrowthInside0LastX128,
                uint256 feeGrowthInside1LastX128,
                uint128 tokensOwed0,
                uint128 tokensOwed1
            );

        function ownerOf(uint256 tokenId) external view returns (address owner);

        function collect(CollectParams calldata params)
            external
            payable
            returns (uint256 amount0, uint256 amount1);
    }
}

pub use INonfungiblePositionManager::{collectCall, ownerOfCall, positionsCall, CollectParams};
