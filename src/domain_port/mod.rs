// time

mod clock;

pub use clock::*;

// repo

mod refresh_token_repo;
mod user_repo;

pub use refresh_token_repo::*;
pub use user_repo::*;
