//! Settings come from a TOML file chosen by `--settings` (defaulting per build
//! profile) with `CHIRPY_*` environment overrides for secrets.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
