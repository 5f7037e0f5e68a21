//! Matching and master-selection rules.
//!
//! # Overview
//!
//! Two leaf rules drive duplicate detection:
//!
//! - [`MatchingRule`] derives a [`MatchKey`] from a record: the ordered
//!   tuple of values of the configured match fields. Records with equal
//!   keys are duplicates of each other.
//! - [`MasterRule`] picks one representative out of a group of duplicates
//!   by comparing a single field under a [`Strategy`] (`highest` or
//!   `lowest` wins).
//!
//! Both are validated at construction time so bad configuration surfaces
//! before any records are read.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Record, Value};

/// Errors raised while building rules from configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    /// The match-field list was empty.
    #[error("matching rule requires at least one match field")]
    NoMatchFields,
    /// A match-field name was empty.
    #[error("match field names must not be empty")]
    EmptyFieldName,
    /// The master-selection field name was empty.
    #[error("master selection requires a field name")]
    EmptyMasterField,
    /// The strategy token was not recognized.
    #[error(
        "unknown strategy '{token}', expected 'highest' or 'lowest'{}",
        did_you_mean(.suggestion)
    )]
    UnknownStrategy {
        /// The token as given.
        token: String,
        /// Closest known token, if any is close enough to suggest.
        suggestion: Option<String>,
    },
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => String::new(),
    }
}

/// Errors raised during master selection within one group.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    /// Selection was asked to pick from zero records.
    #[error("cannot select a master record from zero records")]
    EmptyInput,
    /// Two present values of the master field had different types.
    #[error("values of field '{field}' are not comparable: {earlier} vs {later}")]
    Incomparable {
        /// The master-selection field.
        field: String,
        /// Type of the earlier-seen value.
        earlier: &'static str,
        /// Type of the later-seen value.
        later: &'static str,
    },
}

/// The grouping key derived from a record by a [`MatchingRule`].
///
/// An ordered tuple of values, one per match field. Equality is structural
/// and exact: no normalization happens here, so `"Alice"` and `"alice"`
/// produce different keys. Keys hash and order stably, so they can key a
/// `HashMap` during grouping and merge deterministically when callers
/// shard their input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MatchKey(Vec<Value>);

impl MatchKey {
    /// The key's values, in match-field order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Number of values (equals the number of match fields).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the key has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Value>> for MatchKey {
    fn from(values: Vec<Value>) -> Self {
        MatchKey(values)
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

/// Derives a [`MatchKey`] from each record.
///
/// Holds a non-empty ordered list of field names. Applying the rule is
/// pure and total: a record missing a match field contributes
/// [`Value::Missing`] at that position, so even a record missing every
/// match field gets a well-defined (all-missing) key.
///
/// # Example
///
/// ```
/// use recdupe::detect::MatchingRule;
/// use recdupe::record::{Record, Value};
///
/// let rule = MatchingRule::new(["email", "zip"])?;
/// let record: Record = [("email", Value::text("a@example.com"))]
///     .into_iter()
///     .collect();
///
/// let key = rule.apply(&record);
/// assert_eq!(key.values(), &[Value::text("a@example.com"), Value::Missing]);
/// # Ok::<(), recdupe::detect::RuleError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingRule {
    fields: Vec<String>,
}

impl MatchingRule {
    /// Build a rule from an ordered list of field names.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::NoMatchFields`] for an empty list and
    /// [`RuleError::EmptyFieldName`] if any name is the empty string.
    pub fn new<I, S>(fields: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(RuleError::NoMatchFields);
        }
        if fields.iter().any(String::is_empty) {
            return Err(RuleError::EmptyFieldName);
        }
        Ok(Self { fields })
    }

    /// The configured match fields, in order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Derive the match key for one record.
    #[must_use]
    pub fn apply(&self, record: &Record) -> MatchKey {
        MatchKey(
            self.fields
                .iter()
                .map(|field| record.get(field).clone())
                .collect(),
        )
    }
}

/// Direction of the master-selection comparison.
///
/// A closed set: every consumer matches exhaustively, so adding a strategy
/// is a compile-visible change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// The greatest value of the master field wins.
    Highest,
    /// The least value of the master field wins.
    Lowest,
}

impl Strategy {
    const TOKENS: [(&'static str, Strategy); 2] =
        [("highest", Strategy::Highest), ("lowest", Strategy::Lowest)];

    /// The canonical token for this strategy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Highest => "highest",
            Strategy::Lowest => "lowest",
        }
    }

    fn suggest(token: &str) -> Option<String> {
        Self::TOKENS
            .iter()
            .map(|(name, _)| (strsim::levenshtein(token, name), *name))
            .filter(|(distance, _)| *distance <= 3)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name.to_string())
    }
}

impl FromStr for Strategy {
    type Err = RuleError;

    /// Parse a strategy token, case-insensitively.
    ///
    /// Unknown tokens come back as [`RuleError::UnknownStrategy`] with a
    /// "did you mean" suggestion when a known token is close.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Self::TOKENS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, strategy)| *strategy)
            .ok_or_else(|| RuleError::UnknownStrategy {
                suggestion: Self::suggest(&token),
                token: s.trim().to_string(),
            })
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the master record within a duplicate group.
///
/// A single linear scan over the group: the first record starts as the
/// provisional master and a later record takes over only when it is
/// strictly preferred under the configured [`Strategy`]. Ties therefore
/// keep the earlier-seen record, which makes selection deterministic for
/// a given input order.
///
/// Comparison policy:
///
/// - present values of the same type compare naturally (numeric order,
///   lexicographic text, `false < true`);
/// - a missing value never beats a present one, under either strategy,
///   and a present value always replaces a missing provisional master;
/// - two present values of *different* types fail with
///   [`SelectError::Incomparable`] rather than ordering arbitrarily.
///
/// # Example
///
/// ```
/// use recdupe::detect::MasterRule;
/// use recdupe::record::{Record, Value};
///
/// let rule = MasterRule::highest("score")?;
/// let records: Vec<Record> = vec![
///     [("id", Value::text("a")), ("score", Value::number(1.0))].into_iter().collect(),
///     [("id", Value::text("b")), ("score", Value::number(5.0))].into_iter().collect(),
/// ];
///
/// let master = rule.select(&records)?;
/// assert_eq!(master.get("id"), &Value::text("b"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterRule {
    field: String,
    strategy: Strategy,
}

impl MasterRule {
    /// Build a rule from a field name and strategy.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::EmptyMasterField`] if the field name is empty.
    pub fn new(field: impl Into<String>, strategy: Strategy) -> Result<Self, RuleError> {
        let field = field.into();
        if field.is_empty() {
            return Err(RuleError::EmptyMasterField);
        }
        Ok(Self { field, strategy })
    }

    /// Shorthand for a highest-wins rule.
    pub fn highest(field: impl Into<String>) -> Result<Self, RuleError> {
        Self::new(field, Strategy::Highest)
    }

    /// Shorthand for a lowest-wins rule.
    pub fn lowest(field: impl Into<String>) -> Result<Self, RuleError> {
        Self::new(field, Strategy::Lowest)
    }

    /// The master-selection field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The configured comparison direction.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Select the master record from a non-empty slice.
    ///
    /// # Errors
    ///
    /// [`SelectError::EmptyInput`] for an empty slice, and
    /// [`SelectError::Incomparable`] when two present values of the master
    /// field have different types.
    pub fn select<'a>(&self, records: &'a [Record]) -> Result<&'a Record, SelectError> {
        let mut iter = records.iter();
        let mut best = iter.next().ok_or(SelectError::EmptyInput)?;
        for candidate in iter {
            if self.prefers(candidate.get(&self.field), best.get(&self.field))? {
                best = candidate;
            }
        }
        Ok(best)
    }

    /// Whether `candidate` strictly beats the current `best` value.
    fn prefers(&self, candidate: &Value, best: &Value) -> Result<bool, SelectError> {
        match (candidate.is_missing(), best.is_missing()) {
            // Missing never wins, including against another missing value.
            (true, _) => Ok(false),
            (false, true) => Ok(true),
            (false, false) => {
                let ordering = candidate.compare_natural(best).ok_or_else(|| {
                    SelectError::Incomparable {
                        field: self.field.clone(),
                        earlier: best.kind(),
                        later: candidate.kind(),
                    }
                })?;
                Ok(match self.strategy {
                    Strategy::Highest => ordering == Ordering::Greater,
                    Strategy::Lowest => ordering == Ordering::Less,
                })
            }
        }
    }
}
