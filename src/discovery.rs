//! Test discovery and grouping.
//!
//! Discovery walks a tests root top-down and collects every file into exactly
//! one [`TestUnit`](crate::unit::TestUnit):
//!
//! - a file directly inside the root is its own unit, keyed by its file name
//! - a directory directly inside the root becomes a grouping root, and every
//!   file anywhere below it joins that root's unit
//!
//! The grouping rule itself lives in [`Grouper`], which only sees one
//! directory listing at a time. [`discover`] is the filesystem walk that feeds
//! it. Keeping those apart means the rule can be exercised without touching
//! the disk.

use std::{
    collections::HashMap,
    fs,
    path::{Component, Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    unit::TestUnits,
};

/// Applies the ancestor grouping rule one directory at a time.
///
/// Directories are identified by their path relative to the tests root; the
/// root itself is the empty path. [`visit`](Self::visit) must be called for a
/// directory before it is called for any of that directory's children, which
/// is exactly the order of a top-down walk.
#[derive(Debug, Default)]
pub struct Grouper {
    /// Directory (relative to the root) to the key of the unit it belongs to.
    ancestors: HashMap<PathBuf, String>,
    units: TestUnits,
}

impl Grouper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one directory listing.
    ///
    /// `files` are the member paths as they should be handed to the compiler,
    /// in listing order. `subdirs` are the names of the directory's immediate
    /// subdirectories.
    pub fn visit<F, S>(&mut self, dir: &Path, files: F, subdirs: S)
    where
        F: IntoIterator<Item = PathBuf>,
        S: IntoIterator,
        S::Item: AsRef<Path>,
    {
        if dir.as_os_str().is_empty() {
            for file in files {
                let Some(name) = file.file_name() else {
                    continue;
                };
                let key = name.to_string_lossy().into_owned();
                self.units.entry(&key).files.push(file);
            }
            return;
        }

        let key = match self.ancestors.get(dir) {
            Some(key) => key.clone(),
            None => unit_key(dir),
        };

        self.units.entry(&key).files.extend(files);

        for subdir in subdirs {
            self.ancestors.insert(dir.join(subdir), key.clone());
        }
    }

    /// The root key `dir` resolves to, if an ancestor registered it.
    pub fn root_of(&self, dir: &Path) -> Option<&str> {
        self.ancestors.get(dir).map(String::as_str)
    }

    pub fn finish(self) -> TestUnits {
        self.units
    }
}

/// Render a root-relative directory as a unit key.
///
/// Keys always use `/` so they sort and compare the same on every platform.
fn unit_key(dir: &Path) -> String {
    dir.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Walk `root` and group every file below it into test units.
///
/// Entries of each directory are visited in file name order, which makes the
/// member order of each unit (and thereby the compiler argument order)
/// independent of the filesystem's native listing order.
///
/// Symlinked directories are not followed. A dangling symlink is a member
/// file like any other; it fails later, when the compiler cannot read it.
pub fn discover(root: &Path) -> Result<TestUnits> {
    let mut grouper = Grouper::new();
    walk(root, Path::new(""), &mut grouper)?;

    let units = grouper.finish();
    tracing::info!(
        root = %root.display(),
        units = units.len(),
        files = units.file_count(),
        "discovered test units"
    );
    Ok(units)
}

fn walk(root: &Path, rel: &Path, grouper: &mut Grouper) -> Result<()> {
    let dir = root.join(rel);
    let (files, subdirs) = list_dir(&dir)?;

    grouper.visit(
        rel,
        files.iter().map(|name| dir.join(name)),
        subdirs.iter(),
    );

    for subdir in subdirs {
        walk(root, &rel.join(subdir), grouper)?;
    }

    Ok(())
}

/// Split a directory's entries into sorted file names and sorted names of
/// subdirectories worth descending into.
fn list_dir(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let discovery_err = |source| Error::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(discovery_err)? {
        let entry = entry.map_err(discovery_err)?;
        let file_type = entry.file_type().map_err(discovery_err)?;
        let name = PathBuf::from(entry.file_name());

        if file_type.is_dir() {
            subdirs.push(name);
        } else if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => {
                    tracing::debug!(path = %entry.path().display(), "not following symlinked directory");
                }
                Ok(_) => files.push(name),
                Err(err) => {
                    tracing::debug!(path = %entry.path().display(), %err, "dangling symlink");
                    files.push(name);
                }
            }
        } else {
            files.push(name);
        }
    }

    files.sort();
    subdirs.sort();
    Ok((files, subdirs))
}
