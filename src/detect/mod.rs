//! Duplicate detection core.
//!
//! This module provides:
//! - Match-key derivation ([`MatchingRule`])
//! - Master selection within a group ([`MasterRule`], [`Strategy`])
//! - Grouping and orchestration ([`DuplicateDetector`])
//!
//! The core is pure: it reads records, returns structured results, and
//! performs no I/O beyond logging.

pub mod detector;
pub mod rules;

pub use detector::{DetectError, Detection, DetectionSummary, DuplicateDetector, RecordGroup};
pub use rules::{MasterRule, MatchKey, MatchingRule, RuleError, SelectError, Strategy};
