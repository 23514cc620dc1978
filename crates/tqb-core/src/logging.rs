use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Default directives when `RUST_LOG` is unset.
pub fn default_directives(service_name: &str) -> String {
    let service = service_name.replace('-', "_");
    format!("info,tqb_core=info,tqb_telegram=info,{service}=info")
}

/// Initialize tracing for the bot.
///
/// Can be overridden with `RUST_LOG`.
pub fn init(service_name: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install tracing subscriber: {e}")))
}
