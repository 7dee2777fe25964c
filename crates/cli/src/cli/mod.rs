#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::host::HostOptions;

/// Root CLI for the bridge host.
#[derive(Parser, Debug)]
#[command(name = "nubrick")]
#[command(about = "Nubrick bridge host - NDJSON method calls in, channel messages out")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Host config file (bridge settings and SDK catalog).
	#[arg(short, long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Channel namespace, overrides the config file.
	#[arg(long, global = true, env = "NUBRICK_NAMESPACE", value_name = "NAME")]
	pub namespace: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Read method calls from stdin and stream results and messages to stdout.
	Serve(ServeArgs),
	/// List the method names the bridge understands.
	Methods,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
	/// Start without an SDK client, as before the shell initializes it.
	#[arg(long)]
	pub no_sdk: bool,
}

impl From<ServeArgs> for HostOptions {
	fn from(args: ServeArgs) -> Self {
		Self {
			install_sdk: !args.no_sdk,
		}
	}
}
