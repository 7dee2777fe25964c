use anyhow::Context;
use clap::Parser;
use nubrick_cli::cli::{Cli, Commands};
use nubrick_cli::host::{self, HostConfig};
use nubrick_cli::logging;
use nubrick_protocol::BridgeMethod;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = run(cli).await {
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	match cli.command {
		Commands::Serve(args) => {
			let mut config = match &cli.config {
				Some(path) => HostConfig::load(path).context("loading host config")?,
				None => HostConfig::default(),
			};
			if let Some(namespace) = cli.namespace {
				config.bridge.namespace = namespace;
			}

			let summary = host::serve_stdio(config, args.into()).await?;
			tracing::info!(
				requests = summary.requests,
				delivered = summary.delivered,
				"Host finished"
			);
		}
		Commands::Methods => {
			for method in BridgeMethod::ALL {
				println!("{}", method.name());
			}
		}
	}
	Ok(())
}
