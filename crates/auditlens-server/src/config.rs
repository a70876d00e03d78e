/// Re-export `Config` from `auditlens-core` for use within this crate.
///
/// All environment-variable parsing lives in `auditlens-core` so tests can
/// build a `Config` literal without depending on the process environment.
pub use auditlens_core::config::{AuthMode, Config};
