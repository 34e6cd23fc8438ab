use std::{
    collections::{BTreeSet, HashMap, HashSet},
    path::{Path, PathBuf},
    rc::Rc,
};

use log::{debug, trace, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    copy::{CopyError, DirectoryCopier},
    ignore::IgnoreRules,
    imports::SyntaxError,
    model::package::{ImportPath, Package},
    resolver::{PackageResolver, ResolveError},
    rewrite::{RewriteError, RewriteMap, Rewriter},
};

/// What to do with a source file that cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OnParseError {
    /// Stop the whole run.
    #[default]
    Abort,
    /// Warn and leave the file as it is.
    Skip,
}

#[derive(Debug, Clone)]
pub struct VendorOptions {
    /// Import path under which dependencies are copied.
    pub destination: ImportPath,
    /// Directory backing `destination`, i.e. `<gopath>/src/<destination>`.
    pub destination_dir: PathBuf,
    pub ignore: Vec<String>,
    pub dry_run: bool,
    pub on_parse_error: OnParseError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Copy { from: PathBuf, to: PathBuf },
    Rewrite { path: PathBuf },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorReport {
    /// Every file operation of the run, in execution order.
    pub actions: Vec<Action>,
    /// Original import paths of the copied packages, in post-order.
    pub copied: Vec<ImportPath>,
}

impl VendorReport {
    pub fn rewritten(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, Action::Rewrite { .. }))
            .count()
    }
}

#[derive(Error, Debug)]
pub enum VendorError {
    #[error("Could not resolve {reference}: {source}")]
    Resolution {
        reference: ImportPath,
        source: ResolveError,
    },
    #[error("{0} is a standard package and cannot be vendored")]
    GorootViolation(ImportPath),
    #[error("Could not parse {} in {reference}: {source}", file.display())]
    Parse {
        reference: ImportPath,
        file: PathBuf,
        source: SyntaxError,
    },
    #[error("Could not copy {reference}: {source}")]
    Copy {
        reference: ImportPath,
        source: CopyError,
    },
    #[error("IO error while vendoring {reference}: {source}")]
    IO {
        reference: ImportPath,
        source: std::io::Error,
    },
    #[error("{reference}: {source}")]
    Dependency {
        reference: ImportPath,
        source: Box<VendorError>,
    },
}

impl VendorError {
    /// The innermost error, past all dependency context.
    pub fn root_cause(&self) -> &VendorError {
        match self {
            VendorError::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Copies `root`'s dependency closure below `options.destination` and
/// rewrites every affected import.
///
/// Dependencies are processed depth-first in post-order, so a package is
/// copied and rewritten only after all of its own dependencies are. Standard
/// packages, packages below the destination and packages matching an ignore
/// prefix are left alone. Packages below `root` itself are rewritten in place
/// but never copied.
pub fn vendorize<R>(
    resolver: &R,
    options: &VendorOptions,
    root: &ImportPath,
) -> Result<VendorReport, VendorError>
where
    R: PackageResolver + ?Sized,
{
    let mut traversal = Traversal {
        resolver,
        options,
        rules: IgnoreRules::new(
            root.clone(),
            options.destination.clone(),
            options.ignore.iter().cloned(),
        ),
        copier: DirectoryCopier::new(options.dry_run),
        cache: HashMap::new(),
        visited: HashSet::new(),
        assigned: RewriteMap::new(),
        report: VendorReport::default(),
    };

    let package = traversal.resolve(root)?;
    if package.goroot {
        return Err(VendorError::GorootViolation(root.clone()));
    }
    traversal.visit(root)?;
    Ok(traversal.report)
}

/// State of a single run. Nothing here outlives [`vendorize`].
struct Traversal<'a, R: ?Sized> {
    resolver: &'a R,
    options: &'a VendorOptions,
    rules: IgnoreRules,
    copier: DirectoryCopier,
    /// Successful resolutions only; failures abort the run anyway.
    cache: HashMap<ImportPath, Rc<Package>>,
    visited: HashSet<ImportPath>,
    /// Destination import path of every package scheduled for copying.
    assigned: RewriteMap,
    report: VendorReport,
}

impl<R> Traversal<'_, R>
where
    R: PackageResolver + ?Sized,
{
    fn resolve(&mut self, reference: &ImportPath) -> Result<Rc<Package>, VendorError> {
        if let Some(package) = self.cache.get(reference) {
            return Ok(Rc::clone(package));
        }
        trace!("Resolving {}", reference);
        let package = self
            .resolver
            .resolve(reference)
            .map_err(|source| VendorError::Resolution {
                reference: reference.clone(),
                source,
            })?;
        let package = Rc::new(package);
        self.cache.insert(reference.clone(), Rc::clone(&package));
        Ok(package)
    }

    fn visit(&mut self, reference: &ImportPath) -> Result<(), VendorError> {
        // Marking before recursing is what ends dependency cycles.
        if !self.visited.insert(reference.clone()) {
            trace!("Already visited {}", reference);
            return Ok(());
        }
        let package = self.resolve(reference)?;
        self.check_sources(&package)?;

        let copy = !self.rules.is_ignored(reference, &self.assigned);
        if copy {
            let destination = self.rules.destination_for(reference);
            debug!("Scheduling {} as {}", reference, destination);
            self.assigned.insert(reference.clone(), destination);
        } else {
            debug!("{} stays in place", reference);
        }

        let in_context = |source| VendorError::Dependency {
            reference: reference.clone(),
            source: Box::new(source),
        };
        let dependencies = self.dependencies(&package).map_err(in_context)?;
        for dependency in &dependencies {
            self.visit(dependency).map_err(in_context)?;
        }

        // A copy's external tests import the package itself, which must
        // point at the copy as well.
        let rewrites: RewriteMap = dependencies
            .iter()
            .chain(copy.then_some(reference))
            .filter_map(|dependency| {
                self.assigned
                    .get(dependency)
                    .map(|destination| (dependency.clone(), destination.clone()))
            })
            .collect();

        if copy {
            let target_dir = self.options.destination_dir.join(reference.to_path());
            self.copy(&package, &target_dir)?;
            self.rewrite(&package, &target_dir, &rewrites, true)?;
            self.report.copied.push(reference.clone());
        } else if !rewrites.is_empty() {
            self.rewrite(&package, &package.dir, &rewrites, false)?;
        }
        Ok(())
    }

    /// Direct dependencies that take part in the traversal: external
    /// packages and standard packages are dropped.
    fn dependencies(&mut self, package: &Package) -> Result<BTreeSet<ImportPath>, VendorError> {
        let mut dependencies = BTreeSet::new();
        for dependency in package.dependencies() {
            if self.rules.is_external(&dependency) {
                trace!("Leaving external package {} alone", dependency);
                continue;
            }
            if self.resolve(&dependency)?.goroot {
                continue;
            }
            dependencies.insert(dependency);
        }
        Ok(dependencies)
    }

    fn check_sources(&self, package: &Package) -> Result<(), VendorError> {
        let Some(invalid) = package.invalid_go_files.first() else {
            return Ok(());
        };
        match self.options.on_parse_error {
            OnParseError::Abort => Err(VendorError::Parse {
                reference: package.import_path.clone(),
                file: package.dir.join(&invalid.name),
                source: invalid.error.clone(),
            }),
            OnParseError::Skip => {
                for invalid in &package.invalid_go_files {
                    warn!(
                        "Skipping {} in {}: {}",
                        invalid.name, package.import_path, invalid.error
                    );
                }
                Ok(())
            }
        }
    }

    fn copy(&mut self, package: &Package, target_dir: &Path) -> Result<(), VendorError> {
        let files = self
            .copier
            .copy(target_dir, &package.dir)
            .map_err(|source| VendorError::Copy {
                reference: package.import_path.clone(),
                source,
            })?;
        self.report.actions.extend(
            files
                .into_iter()
                .map(|file| Action::Copy {
                    from: file.from,
                    to: file.to,
                }),
        );
        Ok(())
    }

    fn rewrite(
        &mut self,
        package: &Package,
        target_dir: &Path,
        rewrites: &RewriteMap,
        neutralize_import_comment: bool,
    ) -> Result<(), VendorError> {
        let rewriter = Rewriter::new(rewrites, neutralize_import_comment);
        for file in package.source_files() {
            let source = package.dir.join(file);
            let target = target_dir.join(file);
            match rewriter.rewrite_file(&source, &target, self.options.dry_run) {
                Ok(true) => self.report.actions.push(Action::Rewrite { path: target }),
                Ok(false) => trace!("{} needs no rewrite", target.display()),
                Err(RewriteError::Syntax { path, source })
                    if self.options.on_parse_error == OnParseError::Skip =>
                {
                    warn!(
                        "Skipping {} in {}: {}",
                        path.display(),
                        package.import_path,
                        source
                    );
                }
                Err(RewriteError::Syntax { path, source }) => {
                    return Err(VendorError::Parse {
                        reference: package.import_path.clone(),
                        file: path,
                        source,
                    })
                }
                Err(RewriteError::IO(source)) => {
                    return Err(VendorError::IO {
                        reference: package.import_path.clone(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}
