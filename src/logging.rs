use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "MUSKYFIT_LOG";

/// Level used when `MUSKYFIT_LOG` is unset: warn, then info/debug/trace per `-v`.
pub fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. Stdout stays reserved for command output.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("muskyfit={}", default_level(verbose))));

    // A subscriber may already be installed (tests); that is fine.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
