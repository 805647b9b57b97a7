use amrconfig::Config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Niveau de log effectif, par ordre de priorité :
/// 1. les options `-v` de la ligne de commande
/// 2. la variable `RUST_LOG`
/// 3. `logger.min_level` de la configuration
fn build_filter(verbose: u8, config: &Config) -> EnvFilter {
    let level = match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };
    if let Some(level) = level {
        return EnvFilter::new(level);
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let configured = config.get_log_min_level().to_ascii_lowercase();
        EnvFilter::try_new(&configured).unwrap_or_else(|_| EnvFilter::new("warn"))
    })
}

/// Installs the global subscriber. Logs go to stderr so that stdout only
/// carries command results.
pub fn init_logging(verbose: u8, config: &Config) {
    let filter = build_filter(verbose, config);

    let enable_console = match config.get_log_enable_console() {
        Ok(b) => b,
        Err(_) => true,
    };

    let subscriber = tracing_subscriber::registry().with(filter);
    if enable_console || verbose > 0 {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .init();
    } else {
        subscriber.init();
    }
}
