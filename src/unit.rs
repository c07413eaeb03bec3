//! Test units and the sorted collection that holds them.
//!
//! A [`TestUnit`] is one logical test case. It may span many source files that
//! live somewhere below a single grouping directory. The files keep the order
//! in which discovery found them, since that order becomes the compiler's
//! argument order.

use std::{
    collections::{BTreeMap, btree_map},
    path::PathBuf,
};

/// One logical test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUnit {
    /// Either the bare file name of a root-level test or the grouping
    /// directory's path relative to the tests root, `/` separated.
    pub key: String,

    /// Member source files in discovery order.
    pub files: Vec<PathBuf>,
}

impl TestUnit {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            files: Vec::new(),
        }
    }

    pub fn with_files(key: impl Into<String>, files: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            key: key.into(),
            files: files.into_iter().collect(),
        }
    }
}

/// All units of a test tree, ordered by key.
///
/// Ordering by key is what gives every unit a stable global position, which
/// the shard partitioner relies on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestUnits(BTreeMap<String, TestUnit>);

impl TestUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the unit for `key`, creating an empty one if it does not exist.
    pub fn entry(&mut self, key: &str) -> &mut TestUnit {
        self.0
            .entry(key.to_owned())
            .or_insert_with(|| TestUnit::new(key))
    }

    pub fn insert(&mut self, unit: TestUnit) -> Option<TestUnit> {
        self.0.insert(unit.key.clone(), unit)
    }

    pub fn get(&self, key: &str) -> Option<&TestUnit> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of member files over all units.
    pub fn file_count(&self) -> usize {
        self.0.values().map(|unit| unit.files.len()).sum()
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, TestUnit> {
        self.0.values()
    }
}

impl<'u> IntoIterator for &'u TestUnits {
    type Item = &'u TestUnit;
    type IntoIter = btree_map::Values<'u, String, TestUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<TestUnit> for TestUnits {
    fn from_iter<T: IntoIterator<Item = TestUnit>>(iter: T) -> Self {
        let mut units = TestUnits::new();
        for unit in iter {
            units.insert(unit);
        }
        units
    }
}
