use super::Parser;

/// chirpy auth/session server.
#[derive(Parser, Debug)]
#[command(name = "chirpy", version)]
pub struct Cli {
    /// TOML settings file; defaults to settings/dev.toml or settings/release.toml
    /// depending on the build profile.
    #[arg(long)]
    pub settings: Option<String>,

    /// Overrides `log.filter` from the settings file.
    #[arg(long)]
    pub log_filter: Option<String>,
}
