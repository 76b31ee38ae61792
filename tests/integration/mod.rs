//! Integration test suite for the view engine.
//!
//! Every test builds a throwaway view tree on disk with
//! [`vlx_view::test_utils::ViewTree`] and drives the public API or the `vlx`
//! binary against it.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **render**: directives, escaping, scopes and render errors end to end
//! - **layout**: `@extends` chains, sections, yields, includes and depth guards
//! - **cache**: persisted artifacts, invalidation and concurrent renders
//! - **cli**: the `vlx` binary

mod cache;
mod cli;
mod layout;
mod render;
