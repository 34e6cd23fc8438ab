use anyhow::anyhow;
use log::info;

use crate::{
    gopath::choose_gopath,
    model::package::ImportPath,
    resolver::GoPathResolver,
    vendor::{self, OnParseError, VendorOptions, VendorReport},
};

/// Handler to the vendorize command
/// Picks the GOPATH entry receiving the destination tree and runs the walker
pub fn do_vendorize(
    resolver: &GoPathResolver,
    package: &str,
    destination: &str,
    ignore: &[String],
    dry_run: bool,
    on_parse_error: OnParseError,
) -> anyhow::Result<VendorReport> {
    let package = ImportPath::new(package)?;
    let destination = ImportPath::new(destination)?;

    let gopath = choose_gopath(resolver.gopath(), &destination)
        .ok_or_else(|| anyhow!("No GOPATH entry configured"))?;
    let destination_dir = gopath.join("src").join(destination.to_path());
    info!(
        "Vendoring {} into {} at {}",
        package,
        destination,
        destination_dir.display()
    );
    if dry_run {
        info!("Dry run, no files will be written");
    }

    let options = VendorOptions {
        destination,
        destination_dir,
        ignore: ignore.to_vec(),
        dry_run,
        on_parse_error,
    };
    let report = vendor::vendorize(resolver, &options, &package)?;

    info!(
        "Copied {} packages, rewrote {} files",
        report.copied.len(),
        report.rewritten()
    );
    Ok(report)
}
