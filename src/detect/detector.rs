//! Duplicate grouping and master selection.
//!
//! # Overview
//!
//! [`DuplicateDetector`] runs detection in two stages:
//!
//! 1. [`DuplicateDetector::group`] partitions the input into
//!    [`RecordGroup`]s by match key. Every record lands in exactly one
//!    group, singletons included, and both group order and within-group
//!    record order follow first appearance in the input.
//! 2. [`DuplicateDetector::select_masters`] drops singleton groups and
//!    picks a master for each group that remains, yielding one
//!    [`Detection`] per duplicate group.
//!
//! [`DuplicateDetector::find_duplicates`] chains the two for the common
//! case; [`DuplicateDetector::detect_with_summary`] additionally reports
//! a timed [`DetectionSummary`] built from the intermediate partition.
//!
//! # Example
//!
//! ```
//! use recdupe::detect::{DuplicateDetector, MasterRule, MatchingRule};
//! use recdupe::record::{Record, Value};
//!
//! let detector = DuplicateDetector::new(
//!     MatchingRule::new(["email"])?,
//!     MasterRule::highest("score")?,
//! );
//!
//! let records: Vec<Record> = vec![
//!     [("email", Value::text("a@x.io")), ("score", Value::number(1.0))].into_iter().collect(),
//!     [("email", Value::text("b@x.io")), ("score", Value::number(2.0))].into_iter().collect(),
//!     [("email", Value::text("a@x.io")), ("score", Value::number(9.0))].into_iter().collect(),
//! ];
//!
//! let detections = detector.find_duplicates(records)?;
//! assert_eq!(detections.len(), 1);
//! assert_eq!(detections[0].master.get("score"), &Value::number(9.0));
//! assert_eq!(detections[0].duplicates.len(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use super::rules::{MasterRule, MatchKey, MatchingRule, SelectError};
use crate::record::Record;

/// All records sharing one match key, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordGroup {
    /// The shared match key.
    pub key: MatchKey,
    /// Member records, ordered by first appearance in the input.
    pub records: Vec<Record>,
}

impl RecordGroup {
    /// Number of records in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check if this group holds actual duplicates (2+ records).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.records.len() > 1
    }
}

/// One confirmed duplicate group with its selected master.
///
/// `duplicates` is the complete group in input order; the master also
/// appears in it. Consumers that want only the records to discard filter
/// the master back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    /// The match key shared by every record in the group.
    pub match_key: MatchKey,
    /// The record chosen to survive.
    pub master: Record,
    /// All group members, master included, in input order.
    pub duplicates: Vec<Record>,
}

impl Detection {
    /// Total number of records in the group.
    #[must_use]
    pub fn group_size(&self) -> usize {
        self.duplicates.len()
    }

    /// Number of records that lose to the master (total - 1).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len().saturating_sub(1)
    }
}

/// Errors raised while resolving duplicate groups.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectError {
    /// Master selection failed inside one group.
    #[error("master selection failed for group {key}: {source}")]
    Selection {
        /// Match key of the offending group.
        key: MatchKey,
        /// The underlying selection failure.
        #[source]
        source: SelectError,
    },
}

/// Orchestrates grouping and master selection.
///
/// Composed of one [`MatchingRule`] and one [`MasterRule`]; holds no other
/// state, so a detector can be shared freely across threads for
/// independent inputs.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    matching: MatchingRule,
    master: MasterRule,
}

impl DuplicateDetector {
    /// Build a detector from its two rules.
    #[must_use]
    pub fn new(matching: MatchingRule, master: MasterRule) -> Self {
        Self { matching, master }
    }

    /// The matching rule in use.
    #[must_use]
    pub fn matching_rule(&self) -> &MatchingRule {
        &self.matching
    }

    /// The master-selection rule in use.
    #[must_use]
    pub fn master_rule(&self) -> &MasterRule {
        &self.master
    }

    /// Partition records into groups by match key.
    ///
    /// Single pass, no comparisons beyond key equality. The returned
    /// groups cover every input record exactly once (singletons included),
    /// ordered by the first appearance of each key; records inside a group
    /// keep their input order.
    #[must_use]
    pub fn group(&self, records: impl IntoIterator<Item = Record>) -> Vec<RecordGroup> {
        let mut groups: Vec<RecordGroup> = Vec::new();
        let mut positions: HashMap<MatchKey, usize> = HashMap::new();
        let mut total = 0usize;

        for record in records {
            total += 1;
            let key = self.matching.apply(&record);
            match positions.entry(key) {
                Entry::Occupied(slot) => groups[*slot.get()].records.push(record),
                Entry::Vacant(slot) => {
                    let key = slot.key().clone();
                    slot.insert(groups.len());
                    groups.push(RecordGroup {
                        key,
                        records: vec![record],
                    });
                }
            }
        }

        log::debug!("grouped {} records into {} groups", total, groups.len());
        groups
    }

    /// Drop singleton groups and select a master for each group left.
    ///
    /// Group order is preserved. A selection failure aborts the run and
    /// carries the offending group's match key.
    ///
    /// # Errors
    ///
    /// [`DetectError::Selection`] when the master rule cannot order two
    /// values within a group.
    pub fn select_masters(
        &self,
        groups: Vec<RecordGroup>,
    ) -> Result<Vec<Detection>, DetectError> {
        let mut detections = Vec::new();

        for group in groups {
            if !group.has_duplicates() {
                log::trace!("eliminated singleton group {}", group.key);
                continue;
            }
            log::debug!("group {}: {} records", group.key, group.len());

            let master = self
                .master
                .select(&group.records)
                .map_err(|source| DetectError::Selection {
                    key: group.key.clone(),
                    source,
                })?
                .clone();

            detections.push(Detection {
                match_key: group.key,
                master,
                duplicates: group.records,
            });
        }

        Ok(detections)
    }

    /// Group the input and resolve every duplicate group to a detection.
    ///
    /// Empty input yields an empty result, not an error. Running the
    /// output's masters back through detection finds nothing: masters of
    /// distinct groups have distinct keys by construction.
    ///
    /// # Errors
    ///
    /// [`DetectError::Selection`] when master selection fails for a group.
    pub fn find_duplicates(
        &self,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Vec<Detection>, DetectError> {
        let groups = self.group(records);
        let detections = self.select_masters(groups)?;
        log::info!(
            "detection complete: {} duplicate group(s), {} record(s) involved",
            detections.len(),
            detections.iter().map(Detection::group_size).sum::<usize>()
        );
        Ok(detections)
    }

    /// [`Self::find_duplicates`] plus a timed [`DetectionSummary`] built
    /// from the intermediate partition, for callers that report run
    /// statistics alongside the results.
    ///
    /// # Errors
    ///
    /// [`DetectError::Selection`] when master selection fails for a group.
    pub fn detect_with_summary(
        &self,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<(Vec<Detection>, DetectionSummary), DetectError> {
        let started = Instant::now();
        let groups = self.group(records);
        let mut summary = DetectionSummary::from_groups(&groups, Duration::ZERO);
        let detections = self.select_masters(groups)?;
        summary.detect_duration = started.elapsed();
        Ok((detections, summary))
    }
}

/// Statistics for one detection run.
///
/// Built from the full partition (before singleton elimination) so unique
/// records can be counted without a second pass over the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    /// Total number of records processed.
    pub total_records: usize,
    /// Number of distinct match keys (groups before filtering).
    pub total_groups: usize,
    /// Number of groups with 2+ records.
    pub duplicate_groups: usize,
    /// Number of records inside duplicate groups (masters included).
    pub duplicate_records: usize,
    /// Number of records in singleton groups.
    pub unique_records: usize,
    /// Wall-clock time spent grouping and selecting.
    pub detect_duration: Duration,
}

impl DetectionSummary {
    /// Compute summary statistics from a full partition.
    #[must_use]
    pub fn from_groups(groups: &[RecordGroup], detect_duration: Duration) -> Self {
        let mut summary = Self {
            total_groups: groups.len(),
            detect_duration,
            ..Self::default()
        };
        for group in groups {
            summary.total_records += group.len();
            if group.has_duplicates() {
                summary.duplicate_groups += 1;
                summary.duplicate_records += group.len();
            } else {
                summary.unique_records += group.len();
            }
        }
        summary
    }

    /// Percentage of records that belong to a duplicate group.
    #[must_use]
    pub fn duplication_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.duplicate_records as f64 / self.total_records as f64) * 100.0
        }
    }
}
