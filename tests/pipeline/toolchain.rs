use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::PathBuf,
    sync::{Mutex, MutexGuard},
};

use tempfile::TempDir;

/// The compiler concatenates its inputs into `output/program.sh`, failing
/// when any input mentions `compile-error`.
const COMPILER: &str = r#"#!/bin/sh
if grep -q compile-error "$@"; then
    exit 1
fi
mkdir -p output
cat "$@" > output/program.sh
"#;

/// The assembler needs the seeded runtime and turns the compiler output into
/// an executable `a.out`.
const ASSEMBLER: &str = r#"#!/bin/sh
[ -f output/runtime.s ] || exit 3
if grep -q assemble-error output/program.sh; then
    exit 2
fi
printf '#!/bin/sh\n' > a.out
cat output/program.sh >> a.out
chmod +x a.out
"#;

/// Writing an executable while another thread forks can make executing it
/// fail with `ETXTBSY`, so tests touching scripts take turns.
static SERIAL: Mutex<()> = Mutex::new(());

/// A scratch directory holding a fake toolchain, a fixture set and a test
/// tree.
///
/// Test sources are shell snippets: whatever they do is what the assembled
/// program does.
pub struct Toolchain {
    pub root: TempDir,
    _serial: MutexGuard<'static, ()>,
}

impl Toolchain {
    pub fn new() -> Self {
        let serial = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let root = tempfile::tempdir().unwrap();
        let toolchain = Self {
            root,
            _serial: serial,
        };
        toolchain.script("bin/compiler", COMPILER);
        toolchain.script("bin/assembler", ASSEMBLER);
        toolchain.file("stdlib/Object.java", ": fixture\n");
        toolchain.file("stdlib/runtime.s", "; runtime\n");
        fs::create_dir_all(toolchain.tests_dir()).unwrap();
        toolchain
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    pub fn compiler(&self) -> PathBuf {
        self.path("bin/compiler")
    }

    pub fn assembler(&self) -> PathBuf {
        self.path("bin/assembler")
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.path("tests")
    }

    pub fn workdir(&self) -> PathBuf {
        self.path("work/shard")
    }

    pub fn file(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    /// Add a test source below the tests root.
    pub fn test(&self, rel: &str, contents: &str) {
        self.file(&format!("tests/{rel}"), contents);
    }

    fn script(&self, rel: &str, contents: &str) {
        self.file(rel, contents);
        let path = self.path(rel);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn stdlib(&self) -> (PathBuf, PathBuf) {
        (self.path("stdlib/Object.java"), self.path("stdlib/runtime.s"))
    }
}
