use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::{
    imports,
    model::package::{FileRole, ImportPath, InvalidFile, Package},
};

use super::{PackageResolver, ResolveError};

/// Package name reserved for documentation-only files.
const DOCUMENTATION_PACKAGE: &str = "documentation";

/// Resolves import paths against a GOROOT and a list of GOPATH entries,
/// in that order, the way the go tool does in GOPATH mode.
#[derive(Debug, Clone)]
pub struct GoPathResolver {
    goroot: Option<PathBuf>,
    gopath: Vec<PathBuf>,
}

impl GoPathResolver {
    pub fn new(goroot: Option<PathBuf>, gopath: Vec<PathBuf>) -> Self {
        GoPathResolver { goroot, gopath }
    }

    pub fn gopath(&self) -> &[PathBuf] {
        &self.gopath
    }

    fn load(
        &self,
        import_path: &ImportPath,
        dir: PathBuf,
        goroot: bool,
    ) -> Result<Package, ResolveError> {
        debug!("Loading package {} from {}", import_path, dir.display());
        let mut package = Package::new(import_path.clone(), dir, goroot);
        let mut first_error = None;

        for file_name in go_file_names(&package.dir)? {
            let file = package.dir.join(&file_name);
            let bytes = std::fs::read(&file)?;
            let header = match imports::decode(&bytes).and_then(imports::parse_header) {
                Ok(header) => header,
                Err(error) => {
                    debug!("Could not parse {}: {}", file.display(), error);
                    if first_error.is_none() {
                        first_error = Some((file.clone(), error.clone()));
                    }
                    package.invalid_go_files.push(InvalidFile {
                        name: file_name,
                        error,
                    });
                    continue;
                }
            };
            if header.build_ignored {
                trace!("Skipping {}: excluded by build constraint", file.display());
                continue;
            }
            if header.package == DOCUMENTATION_PACKAGE {
                trace!("Skipping documentation file {}", file.display());
                continue;
            }

            let is_test = file_name.ends_with("_test.go");
            let mut name = header.package.as_str();
            let xtest = is_test && name.ends_with("_test") && package.name != name;
            if xtest {
                name = &name[..name.len() - "_test".len()];
            }
            if package.name.is_empty() {
                package.name = name.to_owned();
            } else if package.name != name {
                return Err(ResolveError::MultiplePackages {
                    dir: package.dir.clone(),
                    first: package.name.clone(),
                    second: name.to_owned(),
                });
            }

            let imports = header
                .imports
                .into_iter()
                .map(|spec| ImportPath::new(spec.path))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| ResolveError::InvalidImport {
                    file: file.clone(),
                    source,
                })?;

            let role = if xtest {
                FileRole::XTest
            } else if is_test {
                FileRole::Test
            } else if imports.iter().any(ImportPath::is_cgo) {
                FileRole::Cgo
            } else {
                FileRole::Go
            };
            package.add_file(role, file_name, imports);
        }

        if !package.has_source_files() {
            return Err(match first_error {
                Some((file, source)) => ResolveError::Source { file, source },
                None => ResolveError::NoGoFiles(package.dir),
            });
        }
        Ok(package)
    }
}

impl PackageResolver for GoPathResolver {
    fn resolve(&self, import_path: &ImportPath) -> Result<Package, ResolveError> {
        let relative = import_path.to_path();
        if let Some(goroot) = &self.goroot {
            let dir = goroot.join("src").join(&relative);
            if dir.is_dir() {
                return self.load(import_path, dir, true);
            }
        }
        for entry in &self.gopath {
            let dir = entry.join("src").join(&relative);
            if dir.is_dir() {
                return self.load(import_path, dir, false);
            }
        }
        if self.goroot.is_none() && import_path.looks_standard() {
            debug!(
                "Assuming {} is a standard package, GOROOT is not configured",
                import_path
            );
            return Ok(Package::new(import_path.clone(), PathBuf::new(), true));
        }
        Err(ResolveError::NotFound(import_path.clone()))
    }
}

/// Names of the Go files directly inside `dir`, sorted. Files starting with
/// `_` or `.` are ignored by the go tool and skipped here as well.
fn go_file_names(dir: &Path) -> Result<Vec<String>, ResolveError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(".go") || name.starts_with('_') || name.starts_with('.') {
            continue;
        }
        if std::fs::metadata(entry.path())?.is_file() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
