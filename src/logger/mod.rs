//! Process-wide tracing setup. Bootstrapped before settings are read, then
//! re-filtered from `log.filter`.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
