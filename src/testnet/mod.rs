//! Test helpers
//!
//! Low-difficulty configuration, throwaway key registries and a fixed
//! unspent set for exercising the transaction engine in isolation.

pub mod test_utils;

pub use test_utils::*;
