//! End-to-end tests for the bookstore catalog service.
//!
//! Run with `cargo test --features system_tests` against a service instance
//! listening on 127.0.0.1:8000.
