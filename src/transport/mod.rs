//! Relay transport
//!
//! A transport delivers one message to one target per call and reports the
//! result as a [`CallOutcome`](crate::types::CallOutcome). Per-call failures
//! (non-2xx, network errors, timeouts, missing success marker) are data, never
//! errors.
//!
//! - [`Transport`]: the seam the dispatcher drives
//! - [`HttpTransport`]: production implementation over `reqwest`

mod http;
mod traits;

pub use http::HttpTransport;
pub use traits::Transport;
