// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "images/mod.rs"]
pub mod images;

#[path = "accounts/mod.rs"]
pub mod accounts;
