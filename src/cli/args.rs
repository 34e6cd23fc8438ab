use std::{ffi::OsString, path::PathBuf};

use clap::Parser;

use crate::vendor::OnParseError;

/// Copies a Go package's dependencies into a private tree and rewrites their imports.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    /// Import path of the package to vendor
    pub package: String,
    /// Import path under which dependencies are copied
    pub destination: String,
    ///Log what would be done without touching the filesystem
    #[clap(short = 'n', long)]
    pub dry_run: bool,
    #[clap(short, long)]
    pub verbose: bool,
    ///Import path prefix that must not be copied, may be repeated
    #[clap(short, long, value_name = "PREFIX")]
    pub ignore: Vec<String>,
    #[clap(long, env = "GOPATH")]
    pub gopath: Option<OsString>,
    #[clap(long, env = "GOROOT")]
    pub goroot: Option<PathBuf>,
    ///What to do with source files that cannot be parsed
    #[clap(long, value_enum)]
    pub on_parse_error: Option<OnParseError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn parse_full_command_line() {
        let args = CliArgs::try_parse_from([
            "vendorize",
            "-n",
            "-v",
            "-i",
            "golang.org/x/",
            "--ignore",
            "github.com/bigcorp",
            "--gopath",
            "/go",
            "--on-parse-error",
            "skip",
            "github.com/me/app",
            "github.com/me/app/third_party",
        ])
        .unwrap();

        assert!(args.dry_run);
        assert!(args.verbose);
        assert_eq!(args.ignore, vec!["golang.org/x/", "github.com/bigcorp"]);
        assert_eq!(args.gopath, Some(OsString::from("/go")));
        assert_eq!(args.on_parse_error, Some(OnParseError::Skip));
        assert_eq!(args.package, "github.com/me/app");
        assert_eq!(args.destination, "github.com/me/app/third_party");
    }

    #[test]
    fn require_package_and_destination() {
        assert!(CliArgs::try_parse_from(["vendorize", "github.com/me/app"]).is_err());
    }
}
