//! Files every unit gets on top of its own sources.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Standard library sources, relative to the standard library root, in the
/// order they follow a unit's own files on the compiler command line.
pub const STDLIB_SOURCES: &[&str] = &[
    "java/util/Arrays.java",
    "java/io/PrintStream.java",
    "java/io/Serializable.java",
    "java/io/OutputStream.java",
    "java/lang/Short.java",
    "java/lang/Boolean.java",
    "java/lang/Class.java",
    "java/lang/Number.java",
    "java/lang/String.java",
    "java/lang/Integer.java",
    "java/lang/System.java",
    "java/lang/Byte.java",
    "java/lang/Cloneable.java",
    "java/lang/Character.java",
    "java/lang/Object.java",
];

/// Runtime support file shipped with the standard library.
pub const RUNTIME_SOURCE: &str = "runtime.s";

/// Where the compiler puts its output, relative to the working directory.
pub const OUTPUT_DIR: &str = "output";

/// A file copied verbatim into every fresh working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub source: PathBuf,
    /// Destination relative to the working directory.
    pub dest: PathBuf,
}

/// The fixture set: extra compiler inputs plus working directory seeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureSet {
    /// Appended to every unit's compiler arguments, in this order.
    pub sources: Vec<PathBuf>,
    pub seeds: Vec<Seed>,
}

impl FixtureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard library found at `root` together with its runtime file.
    pub fn stdlib(root: &Path) -> Self {
        Self {
            sources: STDLIB_SOURCES.iter().map(|rel| root.join(rel)).collect(),
            seeds: vec![Seed {
                source: root.join(RUNTIME_SOURCE),
                dest: Path::new(OUTPUT_DIR).join(RUNTIME_SOURCE),
            }],
        }
    }

    pub fn with_sources(self, sources: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
            ..self
        }
    }

    pub fn with_seed(mut self, source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        self.seeds.push(Seed {
            source: source.into(),
            dest: dest.into(),
        });
        self
    }

    /// Copy every seed into `workdir`, creating parent directories as needed.
    pub fn seed_into(&self, workdir: &Path) -> io::Result<()> {
        for seed in &self.seeds {
            let dest = workdir.join(&seed.dest);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&seed.source, &dest).map_err(|err| {
                io::Error::new(
                    err.kind(),
                    format!("copying {}: {err}", seed.source.display()),
                )
            })?;
        }
        Ok(())
    }
}
