//! Cross-crate scenario tests for hook chains.

mod async_test;
mod bail_test;
mod errors_test;
mod helpers;
mod long_chain_test;
mod ordering_test;
