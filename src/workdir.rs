//! Scoped working directories.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// An exclusively owned, initially empty working directory.
///
/// Acquiring wipes whatever a previous (possibly crashed) run left at the
/// path. The directory is removed again by [`release`](Self::release) or, if
/// that is never reached, when the guard is dropped.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    released: bool,
}

impl WorkDir {
    pub fn acquire(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        remove(&path)?;
        fs::create_dir_all(&path)?;
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory, reporting failure instead of only logging it.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        remove(&self.path)
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        if let Err(err) = remove(&self.path) {
            tracing::warn!(path = %self.path.display(), %err, "failed to remove working directory");
        }
    }
}

fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        res => res,
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn acquire_starts_empty() {
        let root = tempdir().unwrap();
        let path = root.path().join("shard-0");
        fs::create_dir_all(path.join("output")).unwrap();
        fs::write(path.join("a.out"), "stale").unwrap();

        let workdir = WorkDir::acquire(&path).unwrap();
        assert!(workdir.path().is_dir());
        assert_eq!(fs::read_dir(workdir.path()).unwrap().count(), 0);
    }

    #[test]
    fn release_removes_everything() {
        let root = tempdir().unwrap();
        let path = root.path().join("shard-1");

        let workdir = WorkDir::acquire(&path).unwrap();
        fs::create_dir_all(path.join("output/deep")).unwrap();
        fs::write(path.join("output/deep/x.s"), "").unwrap();
        workdir.release().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_on_early_exit() {
        let root = tempdir().unwrap();
        let path = root.path().join("shard-2");

        let early = || -> io::Result<()> {
            let workdir = WorkDir::acquire(&path)?;
            fs::write(workdir.path().join("partial"), "")?;
            Err(io::Error::other("stage blew up"))
        };
        assert!(early().is_err());
        assert!(!path.exists());
    }
}
