// lib.rs - Library surface of current-test.
//
// The binary entry point lives in main.rs and only handles argument parsing
// and output; everything it composes is exposed here for tests and benches.

pub mod config;
pub mod parser_pool;
pub mod position;
pub mod resolve_command;
pub mod runner;
pub mod test_blocks;
// test_utils is available in test builds and when the `test-support` feature is enabled.
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod utf16;
