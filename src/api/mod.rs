use crate::{
    cli::command_handlers::do_vendorize,
    resolver::GoPathResolver,
    vendor::{OnParseError, VendorReport},
};

mod builder;

pub use builder::VendorizeBuilder;

pub struct Vendorize {
    resolver: GoPathResolver,
    ignore: Vec<String>,
    dry_run: bool,
    on_parse_error: OnParseError,
}

impl Vendorize {
    pub fn builder() -> VendorizeBuilder {
        VendorizeBuilder::default()
    }

    /// Copies `package` and its dependencies below `destination` and
    /// rewrites their imports.
    pub fn vendorize(&self, package: &str, destination: &str) -> anyhow::Result<VendorReport> {
        do_vendorize(
            &self.resolver,
            package,
            destination,
            &self.ignore,
            self.dry_run,
            self.on_parse_error,
        )
    }

    pub fn gopath(&self) -> &[std::path::PathBuf] {
        self.resolver.gopath()
    }
}
