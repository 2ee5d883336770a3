//! Process-local adapters. Used by the `memory` store backend and by tests;
//! state is lost on restart.

mod clock_manual;
mod refresh_token_repo_memory;
mod user_repo_memory;

pub use clock_manual::*;
pub use refresh_token_repo_memory::*;
pub use user_repo_memory::*;
