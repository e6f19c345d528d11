//! Property test modules

mod backoff_tests;
mod parser_tests;
mod snapshot_tests;
mod worker_tests;
