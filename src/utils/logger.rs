use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// HTTP 客戶端在 debug 下太吵，長輪詢每 30 秒就一堆連線日誌
const HTTP_NOISE: &str = "reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn";

/// Directives used when `RUST_LOG` is not set.
pub fn default_directives(verbose: bool) -> String {
    if verbose {
        format!("sales_desk=debug,probe_sources=debug,{},info", HTTP_NOISE)
    } else {
        format!("sales_desk=info,probe_sources=info,{},warn", HTTP_NOISE)
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// One JSON object per line, for container log collectors.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .json()
                .with_current_span(false),
        )
        .init();
}
