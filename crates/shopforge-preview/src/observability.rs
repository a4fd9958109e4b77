use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

pub const OBSERVABILITY_ENV: &str = "SHOPFORGE_OBSERVABILITY";
pub const LOG_LEVEL_ENV: &str = "SHOPFORGE_LOG_LEVEL";
pub const JSON_LOG_PATH_ENV: &str = "SHOPFORGE_JSON_LOG_PATH";

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn observability_enabled() -> bool {
    std::env::var(OBSERVABILITY_ENV)
        .ok()
        .map(|value| parse_bool_env(&value).unwrap_or(true))
        .unwrap_or(true)
}

/// Workspace crates log at info; dependencies only warn.
pub const DEFAULT_LOG_FILTER: &str =
    "warn,shopforge=info,shopforge_preview=info,shopforge_generate=info";
pub const DEFAULT_JSON_LOG_FILE: &str = "shopforge-preview.jsonl";

/// First parseable directive wins: `SHOPFORGE_LOG_LEVEL`, then `RUST_LOG`,
/// then [`DEFAULT_LOG_FILTER`].
fn pick_env_filter(level: Option<&str>, rust_log: Option<&str>) -> tracing_subscriber::EnvFilter {
    [level, rust_log]
        .into_iter()
        .flatten()
        .find_map(|directives| tracing_subscriber::EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn resolve_env_filter() -> tracing_subscriber::EnvFilter {
    let level = std::env::var(LOG_LEVEL_ENV).ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    pick_env_filter(level.as_deref(), rust_log.as_deref())
}

/// Initialize logging once per process.
///
/// Environment variables:
/// - `SHOPFORGE_OBSERVABILITY`: optional enable/disable flag (default enabled).
/// - `SHOPFORGE_LOG_LEVEL`: optional level/filter override (`info`, `debug`, etc.).
/// - `SHOPFORGE_JSON_LOG_PATH`: optional log file path. If set, logs are JSONL in that file.
///   If unset, logs go to stderr in a compact console format; stdout stays free
///   for command output.
/// - `RUST_LOG`: optional filter override.
pub fn init_observability() {
    INIT.get_or_init(|| {
        if !observability_enabled() {
            return;
        }

        let env_filter = resolve_env_filter();
        if let Ok(path_raw) = std::env::var(JSON_LOG_PATH_ENV) {
            let path = std::path::PathBuf::from(path_raw);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                let _ = std::fs::create_dir_all(parent);
            }
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(DEFAULT_JSON_LOG_FILE);
            let writer = tracing_appender::rolling::never(dir, file_name);
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(false)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init();
        } else {
            let console_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init();
        }
    });
}
