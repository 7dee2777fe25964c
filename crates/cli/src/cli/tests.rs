use std::path::PathBuf;

use clap::Parser;

use super::*;

#[test]
fn parse_serve_with_config() {
	let cli = Cli::try_parse_from(["nubrick", "serve", "--config", "/tmp/host.json"]).unwrap();
	assert_eq!(cli.config, Some(PathBuf::from("/tmp/host.json")));
	match cli.command {
		Commands::Serve(args) => assert!(!args.no_sdk),
		_ => panic!("Expected Serve command"),
	}
}

#[test]
fn parse_serve_without_sdk() {
	let cli = Cli::try_parse_from(["nubrick", "serve", "--no-sdk"]).unwrap();
	match cli.command {
		Commands::Serve(args) => {
			let options = HostOptions::from(args);
			assert!(!options.install_sdk);
		}
		_ => panic!("Expected Serve command"),
	}
}

#[test]
fn verbose_flag_counts() {
	let cli = Cli::try_parse_from(["nubrick", "-vv", "methods"]).unwrap();
	assert_eq!(cli.verbose, 2);

	let cli = Cli::try_parse_from(["nubrick", "methods", "--verbose"]).unwrap();
	assert_eq!(cli.verbose, 1);
}

#[test]
fn namespace_flag_is_global() {
	let cli = Cli::try_parse_from(["nubrick", "serve", "--namespace", "Nativebrik"]).unwrap();
	assert_eq!(cli.namespace.as_deref(), Some("Nativebrik"));
}

#[test]
fn subcommand_is_required() {
	assert!(Cli::try_parse_from(["nubrick"]).is_err());
}
