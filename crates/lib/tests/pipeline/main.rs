//! End-to-end tests for the uberjar pipeline.

mod common;

mod build_tests;
mod detect_tests;
mod resolve_tests;
