// The core module contains all business logic.
// Each feature gets its own submodule; none of them know about HTTP or SQLite.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "medical/mod.rs"]
pub mod medical;

#[path = "images/mod.rs"]
pub mod images;

#[path = "accounts/mod.rs"]
pub mod accounts;
