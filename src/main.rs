//! geolink - geo link-graph diagnostics and internal-link planning CLI

use clap::Parser;
use console::style;
use geolink::cli::{self, exit::GeoExit, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> GeoExit {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("geolink={}", cli.log_level)));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli::run(cli) {
        Ok(exit) => exit,
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            GeoExit::from_error(&e)
        }
    }
}
