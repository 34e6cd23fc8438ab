mod gopath;

use std::path::PathBuf;

use thiserror::Error;

use crate::{
    imports::SyntaxError,
    model::{package::ImportPath, package::Package, ParseError},
};

pub use gopath::GoPathResolver;

pub trait PackageResolver {
    fn resolve(&self, import_path: &ImportPath) -> Result<Package, ResolveError>;
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cannot find package {0} in GOROOT or any GOPATH entry")]
    NotFound(ImportPath),
    #[error("no buildable Go source files in {}", .0.display())]
    NoGoFiles(PathBuf),
    #[error("found packages {first} and {second} in {}", dir.display())]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        second: String,
    },
    #[error("{}: {source}", file.display())]
    Source { file: PathBuf, source: SyntaxError },
    #[error("{}: bad import: {source}", file.display())]
    InvalidImport { file: PathBuf, source: ParseError },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}
