use env_logger::Env;

const DEFAULT_FILTER: &str = "simlens=info";

/// Installs the global logger. `RUST_LOG` overrides the default filter.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .format_timestamp_millis()
        .try_init();
}
