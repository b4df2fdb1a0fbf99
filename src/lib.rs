//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-reconcile`, `core-runtime`). Host applications
//! can depend on `retag-workspace` and enable the documented features without
//! needing to wire each crate individually:
//!
//! - `desktop-shims` (default): engine plus the reqwest-backed HTTP bridge,
//!   ready to run on desktop targets.
//! - `engine-only`: the reconciliation engine with no platform bridges; the
//!   host injects its own `HttpClient` implementation.
