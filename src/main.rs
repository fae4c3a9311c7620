use std::io;

use anyhow::{Context,Result};
use nix::unistd;
use tracing_subscriber::{fmt,prelude::*,EnvFilter};

use trash::config::Config;
use trash::input::{EditorReader,PipedReader};
use trash::{signal,Shell};

fn main() -> Result<()> {
	tracing_subscriber::registry()
		.with(fmt::layer().with_writer(io::stderr))
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.init();

	let config = Config::from_env();
	signal::install(unistd::getpid()).context("unable to set signal handler")?;

	if config.interactive {
		let reader = EditorReader::new(&config)?;
		Shell::new(config, reader).run()
	} else {
		let reader = PipedReader::new(io::stdin().lock());
		Shell::new(config, reader).run()
	}
}
