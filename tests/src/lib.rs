//! # Micro-Application Shell Test Suite
//!
//! Cross-crate tests that drive the fully wired shell through its public
//! surface, with in-memory adapters standing in for the browser.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs     # Wired shell over mock adapters
//!     ├── scenarios.rs   # End-to-end flows (boot, redirects, refresh, route sync)
//!     └── properties.rs  # Invariants (single instance, session gating, timers)
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mf-tests
//! cargo test -p mf-tests integration::properties::
//! ```

pub mod integration;
