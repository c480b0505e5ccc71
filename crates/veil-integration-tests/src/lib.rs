//! End-to-end integration tests for Veil
//!
//! These tests wire the analyzer and anonymizer together to verify the full
//! detect-then-rewrite flow. Shared fixtures live in `tests/common.rs`.
