//! Mock Infrastructure for Testing feeguard
//!
//! Reusable mocks for upstream interactions without real network connections.
//!
//! ## Components
//!
//! - `RpcMockBuilder`: mockito JSON-RPC provider answering `eth_call` by selector
//! - `PriceMockBuilder`: mockito simple-price feed
//! - Test helpers for ABI return data and configurations
//!
//! ## Usage
//!
//! ```ignore
//! use tests::mock_infrastructure::{position_return, positions_selector, RpcMockBuilder};
//!
//! let mut rpc = RpcMockBuilder::new().await;
//! rpc.mock_call(&positions_selector(), &position_return(0, 0, 0), 1).await;
//! ```


pub use rpc_mock::{PriceMockBuilder, RpcMockBuilder};
pub use test_helpers::*;
