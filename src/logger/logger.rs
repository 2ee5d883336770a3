use anyhow::{Result, anyhow};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

const BOOTSTRAP_FILTER: &str = "info";

/// Per-query sqlx logging and hyper connection chatter drown out auth events
/// at `debug`. Applied unless the configured filter names the target itself.
const QUIET_DEPENDENCIES: &[(&str, &str)] = &[("sqlx", "sqlx=warn"), ("hyper", "hyper=info")];

pub struct LogConfig {
    pub filter: String,
}

impl LogConfig {
    pub fn effective_filter(&self) -> String {
        let configured = self.filter.trim();
        let mut directives: Vec<&str> = Vec::new();
        if !configured.is_empty() {
            directives.push(configured);
        }
        for (target, directive) in QUIET_DEPENDENCIES {
            if !configured.contains(target) {
                directives.push(*directive);
            }
        }
        directives.join(",")
    }
}

pub struct Logger {
    reload_handle: reload::Handle<EnvFilter, Registry>,
}

impl Logger {
    /// Installs the global subscriber. `RUST_LOG` wins until settings are
    /// loaded, otherwise `info`.
    pub fn new_bootstrap() -> Self {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(BOOTSTRAP_FILTER));
        let (filter, reload_handle) = reload::Layer::new(filter);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();

        Self { reload_handle }
    }

    pub fn reload_from_config(&self, config: &LogConfig) -> Result<()> {
        let effective = config.effective_filter();
        let filter = EnvFilter::try_new(&effective).map_err(|e| anyhow!(e))?;
        self.reload_handle.reload(filter).map_err(|e| anyhow!(e))?;
        info!(filter = %effective, "log filter applied");
        Ok(())
    }
}
