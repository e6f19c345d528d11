//! Integration test modules

mod common;
mod display_tests;
mod scenario_tests;
