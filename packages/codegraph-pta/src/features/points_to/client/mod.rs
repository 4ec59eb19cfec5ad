//! Clients consuming a finished analysis

pub mod may_fail_cast;

pub use may_fail_cast::may_fail_casts;
