//! Bundled transport implementations.

mod replay;

pub use replay::{ReplayLink, ReplayTransport};
