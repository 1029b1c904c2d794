//! Common test utilities for batch-relay integration tests

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod relay;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use relay::*;
