//! Change-line index
//!
//! For every FILE the upstream report lists the changesets that touched it
//! and, per source line, the index of the changeset that last changed the
//! line. Only the new-code pass and the last-commit step read it.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ComputeError, Result};

/// One commit touching a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Commit date. A changeset without date has unknown authorship.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl Changeset {
    pub fn dated(date: DateTime<Utc>) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Changesets of one file plus the changeset index of every line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changesets {
    pub component_ref: u32,
    pub changesets: Vec<Changeset>,
    /// Entry `n` is the changeset index of line `n + 1`
    pub changeset_index_by_line: Vec<usize>,
}

impl Changesets {
    pub fn new(component_ref: u32, changesets: Vec<Changeset>, changeset_index_by_line: Vec<usize>) -> Self {
        Self {
            component_ref,
            changesets,
            changeset_index_by_line,
        }
    }

    pub fn line_count(&self) -> usize {
        self.changeset_index_by_line.len()
    }

    /// Changeset that last touched `line` (1-based)
    pub fn changeset_for_line(&self, line: u32) -> Result<&Changeset> {
        let index = line
            .checked_sub(1)
            .and_then(|i| self.changeset_index_by_line.get(i as usize))
            .copied()
            .ok_or(ComputeError::MissingChangesetLine {
                component_ref: self.component_ref,
                line,
            })?;
        self.changesets
            .get(index)
            .ok_or(ComputeError::ChangesetIndexOutOfRange {
                component_ref: self.component_ref,
                index,
                count: self.changesets.len(),
            })
    }

    /// Most recent commit date across all changesets of the file
    pub fn last_commit_date(&self) -> Option<DateTime<Utc>> {
        self.changesets.iter().filter_map(|c| c.date).max()
    }
}

/// Source of changesets, keyed by FILE component ref
pub trait ChangesetRepository: Send + Sync {
    fn get_changesets(&self, component_ref: u32) -> Option<&Changesets>;
}

/// Changesets held in memory, as decoded from the analysis report
#[derive(Debug, Clone, Default)]
pub struct InMemoryChangesetRepository {
    by_ref: FxHashMap<u32, Changesets>,
}

impl InMemoryChangesetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register changesets, replacing any previous entry for the same file
    pub fn insert(&mut self, changesets: Changesets) {
        self.by_ref.insert(changesets.component_ref, changesets);
    }

    pub fn with(mut self, changesets: Changesets) -> Self {
        self.insert(changesets);
        self
    }

    pub fn len(&self) -> usize {
        self.by_ref.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ref.is_empty()
    }
}

impl ChangesetRepository for InMemoryChangesetRepository {
    fn get_changesets(&self, component_ref: u32) -> Option<&Changesets> {
        self.by_ref.get(&component_ref)
    }
}
