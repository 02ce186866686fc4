//! Tracing subscriber setup.
//!
//! Logs go to stderr so JSON results on stdout stay machine-readable.
//! `RUST_LOG` overrides the default `info` filter. JSON output is selected by
//! `--log-json` or `SCREENLAB_LOG_FORMAT=json`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const FORMAT_ENV: &str = "SCREENLAB_LOG_FORMAT";

/// Whether JSON logs were requested, by flag or environment.
pub fn wants_json(flag: bool, env_value: Option<&str>) -> bool {
    flag || env_value.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

pub fn init_logging(json_flag: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = wants_json(json_flag, std::env::var(FORMAT_ENV).ok().as_deref());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
