//! Scenario tests for the auth context.
//!
//! - `harness.rs`     - mock authority, sleepers, bridge, opener and the wired context
//! - `bootstrap.rs`   - startup resolution and retry policy
//! - `exchange.rs`    - token exchange, identity forwarding, Google sign-in trigger
//! - `logout.rs`      - logout and session store clearing
//! - `concurrency.rs` - re-entry guard and overlapping resolutions

mod bootstrap;
mod exchange;
