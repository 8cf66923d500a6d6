//! Logging setup: a `tracing-subscriber` formatter filtered by `RUST_LOG`, with `log`
//! records of dependencies bridged into it.

use std::str::FromStr;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Crates whose log level follows the level given for `mvtiler`
const LIBRARY_TARGETS: [&str; 2] = ["mvtiler_core", "mbtiles"];

/// Output format, selected with `MVTILER_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line logs with timestamps and targets
    #[default]
    Compact,
    /// Level and message only, without colors, for piping into files
    Bare,
    /// Newline-delimited JSON
    Json,
}

impl LogFormat {
    /// Install the global subscriber. A subscriber that is already installed is kept.
    pub fn init(self, env_filter: EnvFilter) {
        let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
        let dispatch = match self {
            Self::Compact => builder.compact().finish().into(),
            Self::Bare => builder
                .compact()
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .finish()
                .into(),
            Self::Json => builder.json().finish().into(),
        };
        // `SubscriberInitExt::init()` would install a second `LogTracer`
        if let Err(e) = tracing::dispatcher::set_global_default(dispatch) {
            eprintln!("Warning: {e}");
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "bare" => Ok(Self::Bare),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown log format '{s}', expected compact, bare or json"
            )),
        }
    }
}

/// Forward `log` records (used by sqlx) to `tracing`, up to the filter's most verbose level
fn init_log_bridge(env_filter: &EnvFilter) {
    let mut builder = tracing_log::LogTracer::builder()
        .with_interest_cache(tracing_log::InterestCacheConfig::default());
    if let Some(Some(level)) = env_filter.max_level_hint().map(LevelFilter::into_level) {
        builder = builder.with_max_level(match level {
            Level::TRACE => log::LevelFilter::Trace,
            Level::DEBUG => log::LevelFilter::Debug,
            Level::INFO => log::LevelFilter::Info,
            Level::WARN => log::LevelFilter::Warn,
            Level::ERROR => log::LevelFilter::Error,
        });
    }
    if let Err(e) = builder.init() {
        eprintln!("Warning: {e}");
    }
}

/// Parses a log format, falling back to the default with a warning on stderr.
///
/// The subscriber is not installed yet when this runs, so the warning cannot go through `tracing`.
#[must_use]
pub fn parse_log_format(format: Option<String>) -> LogFormat {
    match format.as_deref().map(str::parse::<LogFormat>) {
        Some(Ok(format)) => format,
        Some(Err(e)) => {
            eprintln!("Warning: {e}, using {:?}", LogFormat::default());
            LogFormat::default()
        }
        None => LogFormat::default(),
    }
}

/// Initialize the global tracing subscriber for the given filter and format.
pub fn init_tracing(filter: &str, format: Option<String>) {
    let env_filter = EnvFilter::from_str(filter).unwrap_or_else(|e| {
        eprintln!("Warning: invalid log filter '{filter}' ({e}), logging at debug level");
        EnvFilter::new("debug")
    });

    init_log_bridge(&env_filter);
    parse_log_format(format).init(env_filter);
}

/// Ensures that the library crates log at the level given for `replacement`.
///
/// `replacement` is the filter prefix of the binary, e.g. `mvtiler=`. Without a filter,
/// everything logs at `info`.
#[must_use]
pub fn ensure_library_log_levels_match(
    env_filter: Option<String>,
    replacement: &'static str,
) -> String {
    let Some(rust_log) = env_filter else {
        let mut filter = format!("{replacement}info");
        for target in LIBRARY_TARGETS {
            filter.push_str(&format!(",{target}=info"));
        }
        return filter;
    };

    let Some(level) = rust_log
        .split(',')
        .find_map(|s| s.strip_prefix(replacement))
        .map(str::to_string)
    else {
        return rust_log;
    };

    let mut filter = rust_log;
    for target in LIBRARY_TARGETS {
        if !filter.contains(&format!("{target}=")) {
            filter.push_str(&format!(",{target}={level}"));
        }
    }
    filter
}
