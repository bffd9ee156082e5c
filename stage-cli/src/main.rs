//! # Stage
//!
//! Command-line entry point.

use clap::Parser;
use stage_cli::{run, CliArgs, CliConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing on stderr with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: `stage_cli=info,stage_core=info`).
/// Set `RUST_LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stage_cli=info,stage_core=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from(&args);
    tracing::debug!(
        "Canvas {}x{}",
        config.canvas_width,
        config.canvas_height
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&config, &args.command, &mut out)
}
