use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Identity of one acquisition series.
///
/// Two slices with the same series number and image dimensions belong to the
/// same series, even when they were found in different sub-directories of the
/// same scan. Ordering is lexicographic over (series number, rows, columns).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SeriesKey {
    pub series_number: i32,
    pub rows: u32,
    pub columns: u32,
}

/// One logical acquisition series and its member slices.
///
/// Members are kept in insertion order until [`SeriesRecord::sorted_paths`] is
/// called, which sorts them ascending by instance number and memoizes that
/// order until the next [`SeriesRecord::add_dicom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    key: SeriesKey,
    description: String,
    members: Vec<(i32, PathBuf)>,
    is_sorted: bool,
}

impl SeriesRecord {
    pub fn new(key: SeriesKey, description: Option<String>) -> Self {
        Self {
            key,
            description: description.unwrap_or_else(|| String::from("None")),
            members: Vec::new(),
            is_sorted: true,
        }
    }

    pub fn key(&self) -> SeriesKey {
        self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of member slices.
    pub fn num_images(&self) -> usize {
        self.members.len()
    }

    /// Member slices as (instance number, path) pairs, in insertion order
    /// unless a previous [`SeriesRecord::sorted_paths`] call sorted them.
    pub fn members(&self) -> &[(i32, PathBuf)] {
        &self.members
    }

    /// Add a member slice to this series.
    ///
    /// A second slice with an instance number that is already present is
    /// skipped with a warning and the record is left unchanged. Returns
    /// whether the slice was added.
    pub fn add_dicom(&mut self, instance_number: i32, path: PathBuf) -> bool {
        if self.members.iter().any(|(n, _)| *n == instance_number) {
            warn!(
                instance_number,
                path = %path.display(),
                "ignoring duplicate instance in series"
            );
            return false;
        }
        self.is_sorted = false;
        self.members.push((instance_number, path));
        true
    }

    /// Member paths ascending by instance number.
    ///
    /// The first call sorts the members in place; later calls return the same
    /// order without re-sorting until a new slice is added.
    pub fn sorted_paths(&mut self) -> impl Iterator<Item = &Path> {
        if !self.is_sorted {
            self.members.sort_by_key(|(n, _)| *n);
            self.is_sorted = true;
        }
        self.members.iter().map(|(_, path)| path.as_path())
    }

    /// Human-readable one-line summary for display in a series picker.
    pub fn summary(&self) -> String {
        format!(
            "(Series {}) \"{}\" [{} x {} x {}]",
            self.key.series_number,
            self.description,
            self.key.rows,
            self.key.columns,
            self.members.len()
        )
    }
}

/// All series found by one scan, sorted ascending by [`SeriesKey`] with no
/// duplicate keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesIndex {
    records: Vec<SeriesRecord>,
}

impl SeriesIndex {
    pub fn records(&self) -> &[SeriesRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [SeriesRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesRecord> {
        self.records.iter()
    }
}

impl IntoIterator for SeriesIndex {
    type Item = SeriesRecord;
    type IntoIter = std::vec::IntoIter<SeriesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Fold of per-directory contributions into one merged, key-sorted index.
#[derive(Debug, Default)]
pub(crate) struct SeriesAccumulator {
    map: BTreeMap<SeriesKey, SeriesRecord>,
}

impl SeriesAccumulator {
    fn record_for(&mut self, key: SeriesKey, description: Option<String>) -> &mut SeriesRecord {
        self.map
            .entry(key)
            .or_insert_with(|| SeriesRecord::new(key, description))
    }

    /// Fold one freshly decoded slice into the index.
    pub(crate) fn add_slice(
        &mut self,
        key: SeriesKey,
        description: Option<String>,
        instance_number: i32,
        path: PathBuf,
    ) {
        self.record_for(key, description)
            .add_dicom(instance_number, path);
    }

    /// Merge a whole record, typically read back from a directory cache.
    /// Members go through the same duplicate-instance check as fresh slices.
    pub(crate) fn absorb(&mut self, record: SeriesRecord) {
        let SeriesRecord {
            key,
            description,
            members,
            is_sorted: _,
        } = record;
        let target = self.record_for(key, Some(description));
        for (instance_number, path) in members {
            target.add_dicom(instance_number, path);
        }
    }

    pub(crate) fn finish(self) -> SeriesIndex {
        SeriesIndex {
            records: self.map.into_values().collect(),
        }
    }
}
