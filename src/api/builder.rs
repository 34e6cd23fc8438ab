use std::{ffi::OsStr, path::PathBuf};

use anyhow::anyhow;
use home::home_dir;

use crate::{resolver::GoPathResolver, vendor::OnParseError, Vendorize};

#[derive(Default)]
pub struct VendorizeBuilder {
    gopath: Vec<PathBuf>,
    goroot: Option<PathBuf>,
    ignore: Vec<String>,
    dry_run: bool,
    on_parse_error: OnParseError,
}

impl VendorizeBuilder {
    /// Appends a GOPATH entry. Entries are searched in the order added.
    ///
    /// Defaults to `$HOME/go`.
    pub fn gopath(mut self, path: impl Into<PathBuf>) -> Self {
        self.gopath.push(path.into());
        self
    }

    /// Appends every entry of a `GOPATH`-style list, split with the
    /// platform's path separator. Empty entries are dropped.
    pub fn gopath_list(mut self, paths: impl AsRef<OsStr>) -> Self {
        self.gopath.extend(
            std::env::split_paths(paths.as_ref()).filter(|path| !path.as_os_str().is_empty()),
        );
        self
    }

    /// Standard library root. Without it, packages whose first path element
    /// has no dot are assumed to be standard.
    pub fn goroot(mut self, path: impl Into<PathBuf>) -> Self {
        self.goroot = Some(path.into());
        self
    }

    /// Import path prefix of packages that must never be copied.
    pub fn ignore(mut self, prefix: impl Into<String>) -> Self {
        self.ignore.push(prefix.into());
        self
    }

    pub fn ignore_all(mut self, prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignore.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Log every action without touching the filesystem.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Defaults to [`OnParseError::Abort`].
    pub fn on_parse_error(mut self, on_parse_error: OnParseError) -> Self {
        self.on_parse_error = on_parse_error;
        self
    }

    pub fn try_build(self) -> anyhow::Result<Vendorize> {
        let Self {
            gopath,
            goroot,
            ignore,
            dry_run,
            on_parse_error,
        } = self;

        let gopath = if gopath.is_empty() {
            vec![default_gopath()?]
        } else {
            gopath
        };

        Ok(Vendorize {
            resolver: GoPathResolver::new(goroot, gopath),
            ignore,
            dry_run,
            on_parse_error,
        })
    }
}

fn default_gopath() -> anyhow::Result<PathBuf> {
    let mut gopath = home_dir()
        .ok_or_else(|| anyhow!("Could not find home dir. Please define $HOME or $GOPATH."))?;
    gopath.push("go");
    Ok(gopath)
}
