//! Collecting file names from every unit into one ordered, duplicate free list.

use std::collections::btree_set;
use std::collections::BTreeSet;

/// A set of source file names.
///
/// Names are kept verbatim: no path separator or case normalization is done,
/// so `a/b.go` and `a//b.go` are different names. Iteration is in byte order of
/// the UTF-8 names.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSet {
    names: BTreeSet<String>,
}

impl FileSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns false if it was already present.
    pub fn insert(&mut self, name: String) -> bool {
        self.names.insert(name)
    }

    /// The number of distinct names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return true if no names have been added.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate the names in sorted order.
    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.names.iter()
    }

    /// Consume the set, returning the names in sorted order.
    pub fn into_sorted_vec(self) -> Vec<String> {
        self.names.into_iter().collect()
    }
}

impl Extend<String> for FileSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.names.extend(iter);
    }
}

impl FromIterator<String> for FileSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        FileSet {
            names: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FileSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Deduplicate and sort a sequence of file names.
///
/// ```
/// let files = dwsrc::aggregate(["b.go", "a.go", "b.go", "c.go"]);
/// assert_eq!(files, ["a.go", "b.go", "c.go"]);
/// ```
pub fn aggregate<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(Into::into)
        .collect::<FileSet>()
        .into_sorted_vec()
}
