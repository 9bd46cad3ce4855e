use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::{Error, Result};

/// Which kinds of directory children to yield.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirFilter {
    files:  bool,
    dirs:   bool,
    hidden: bool,
}

impl Default for DirFilter {
    fn default() -> Self { Self::all() }
}

impl DirFilter {
    pub fn files() -> Self {
        Self {
            files:  true,
            dirs:   false,
            hidden: false,
        }
    }

    pub fn dirs() -> Self {
        Self {
            files:  false,
            dirs:   true,
            hidden: false,
        }
    }

    pub fn all() -> Self {
        Self {
            files:  true,
            dirs:   true,
            hidden: false,
        }
    }

    /// Also yield dot-files.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    fn accepts(&self, name: &str, is_dir: bool) -> bool {
        if !self.hidden && name.starts_with('.') {
            return false;
        }
        if is_dir { self.dirs } else { self.files }
    }
}

/// Immediate children of a directory, by name.
#[derive(Clone, Debug)]
pub struct DirIter {
    path: PathBuf,
}

impl DirIter {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().to_path_buf();
        fs::read_dir(&path).map_err(|e| Error::Dir {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Children accepted by `filter` whose name matches the wildcard `mask`.
    ///
    /// An empty mask matches every name. Names are yielded in the order the
    /// operating system lists them.
    pub fn entries(&self, filter: DirFilter, mask: &str) -> Result<Entries> {
        let pattern = if mask.is_empty() {
            None
        } else {
            Some(Pattern::new(mask)?)
        };
        let inner = fs::read_dir(&self.path).map_err(|e| Error::Dir {
            path: self.path.clone(),
            source: e,
        })?;

        Ok(Entries {
            inner,
            filter,
            pattern,
        })
    }

    pub fn has_sub_dirs(&self, mask: &str) -> bool {
        self.entries(DirFilter::dirs().with_hidden(true), mask)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }
}

pub struct Entries {
    inner:   ReadDir,
    filter:  DirFilter,
    pattern: Option<Pattern>,
}

impl Iterator for Entries {
    type Item = PathBuf;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.inner.by_ref() {
            // Children that vanish or cannot be stat'ed mid-listing are skipped.
            let Ok(entry) = entry else { continue };
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            if let Some(pattern) = &self.pattern {
                if !pattern.matches(&name) {
                    continue;
                }
            }

            // Follows symlinks, so a link to a directory counts as a directory.
            let is_dir = entry.path().is_dir();
            if self.filter.accepts(&name, is_dir) {
                return Some(PathBuf::from(file_name));
            }
        }
        None
    }
}
