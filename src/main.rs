use std::process::exit;

use clap::Parser;
use env_logger::Env;

use vendorize::{cli::args::CliArgs, config::VendorizeConfig, Vendorize};

fn main() {
    let cli_args = CliArgs::parse();

    let default_filter = if cli_args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = run(cli_args) {
        log::error!("{}", e);
        exit(1)
    }
}

fn run(cli_args: CliArgs) -> anyhow::Result<()> {
    let config = VendorizeConfig::load()?;

    let mut builder = Vendorize::builder()
        .dry_run(cli_args.dry_run)
        .ignore_all(cli_args.ignore)
        .ignore_all(config.ignore);
    if let Some(gopath) = cli_args.gopath {
        builder = builder.gopath_list(gopath);
    }
    if let Some(goroot) = cli_args.goroot {
        builder = builder.goroot(goroot);
    }
    if let Some(on_parse_error) = cli_args.on_parse_error.or(config.on_parse_error) {
        builder = builder.on_parse_error(on_parse_error);
    }

    builder
        .try_build()?
        .vendorize(&cli_args.package, &cli_args.destination)?;
    Ok(())
}
