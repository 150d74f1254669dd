//! Retention sweep over partition indices.
//!
//! Old data is dropped one whole partition at a time: every index behind the
//! alias whose day starts strictly before the cutoff is deleted. Indices whose
//! names do not parse as partitions are reported and left alone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{BackendError, StorageError, StorageResult, ValidationError};
use crate::partition::{DATE_FORMAT, SkipReason, start_of_day};

use super::backend::{BACKEND_NAME, ElasticNodeStorage};
use super::client::DocumentStoreError;

/// A partition index and the day it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionIndex {
    /// Index name.
    pub name: String,
    /// Day parsed from the name.
    pub date: NaiveDate,
}

/// An alias member that is not a recognizable partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedIndex {
    /// Index name.
    pub name: String,
    /// Why the name was not recognized.
    pub reason: SkipReason,
}

/// What a sweep at a given cutoff would do. Computed without deleting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Cutoff in UTC.
    pub cutoff: DateTime<Utc>,
    /// `false` when the alias does not exist; the plan is then empty.
    pub alias_found: bool,
    /// Partitions whose day starts before the cutoff.
    pub expired: Vec<PartitionIndex>,
    /// Partitions at or after the cutoff.
    pub kept: Vec<PartitionIndex>,
    /// Alias members that are not partitions.
    pub skipped: Vec<SkippedIndex>,
}

impl RetentionPlan {
    fn empty(cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff,
            alias_found: false,
            expired: Vec::new(),
            kept: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Number of alias members inspected.
    pub fn checked(&self) -> usize {
        self.expired.len() + self.kept.len() + self.skipped.len()
    }
}

/// Outcome of a retention sweep.
///
/// `checked` equals the sum of the other counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Alias members inspected.
    pub checked: usize,
    /// Partitions not yet expired.
    pub kept: usize,
    /// Members whose names are not partitions.
    pub skipped: usize,
    /// Partitions deleted by this sweep.
    pub deleted: usize,
    /// Expired indices that were already gone when the sweep reached them.
    pub already_deleted: usize,
    /// Partitions whose deletion failed.
    pub failed: usize,
}

impl ElasticNodeStorage {
    /// Classifies every index behind the alias against `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Backend` if the alias lookup fails for a reason
    /// other than the alias being absent.
    pub async fn retention_plan(
        &self,
        cutoff: impl Into<DateTime<Utc>> + Send,
    ) -> StorageResult<RetentionPlan> {
        let cutoff = cutoff.into();
        self.scoped(self.plan(cutoff)).await
    }

    /// Deletes every partition whose day starts strictly before `cutoff`.
    ///
    /// Failures on individual indices are logged and counted, and the sweep
    /// moves on. A missing alias is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Backend` only if the alias lookup itself fails.
    pub async fn cleanup(
        &self,
        cutoff: impl Into<DateTime<Utc>> + Send,
    ) -> StorageResult<CleanupReport> {
        let cutoff = cutoff.into();
        self.scoped(async {
            let plan = self.plan(cutoff).await?;
            let mut report = CleanupReport {
                checked: plan.checked(),
                kept: plan.kept.len(),
                skipped: plan.skipped.len(),
                ..Default::default()
            };

            for partition in &plan.expired {
                match self.client.delete_index(&partition.name).await {
                    Ok(()) => {
                        report.deleted += 1;
                        tracing::info!(index = %partition.name, "index.delete.executed");
                    }
                    Err(DocumentStoreError::NotFound) => {
                        report.already_deleted += 1;
                        tracing::info!(
                            index = %partition.name,
                            status = "already deleted",
                            "index.delete.executed"
                        );
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::error!(index = %partition.name, error = %e, "index.delete.error");
                    }
                }
            }

            tracing::info!(
                cutoff = %cutoff.to_rfc3339(),
                checked = report.checked,
                deleted = report.deleted,
                already_deleted = report.already_deleted,
                skipped = report.skipped,
                failed = report.failed,
                "cleanup.completed"
            );
            Ok::<_, StorageError>(report)
        })
        .await
    }

    async fn plan(&self, cutoff: DateTime<Utc>) -> StorageResult<RetentionPlan> {
        let alias = self.config.alias_name.as_str();
        let members = match self.client.get_alias(alias).await {
            Ok(members) => members,
            Err(DocumentStoreError::NotFound) => {
                tracing::warn!(alias = %alias, "cleanup.alias.not_found");
                return Ok(RetentionPlan::empty(cutoff));
            }
            Err(e) => {
                tracing::error!(alias = %alias, error = %e, "cleanup.alias.error");
                return Err(BackendError::request(BACKEND_NAME, "get_alias", alias, e).into());
            }
        };

        let mut plan = RetentionPlan {
            alias_found: true,
            ..RetentionPlan::empty(cutoff)
        };

        for name in members {
            match self.scheme.parse_index_date(&name) {
                Ok(date) if start_of_day(date) < cutoff => {
                    plan.expired.push(PartitionIndex { name, date });
                }
                Ok(date) => plan.kept.push(PartitionIndex { name, date }),
                Err(reason) => {
                    tracing::warn!(index = %name, reason = %reason, "cleanup.index.skip");
                    plan.skipped.push(SkippedIndex { name, reason });
                }
            }
        }

        Ok(plan)
    }
}

/// Parses a retention cutoff given on a command line or in configuration.
///
/// Accepted forms, tried in order:
/// - an RFC 3339 timestamp with offset (`2024-01-03T12:00:00+02:00`)
/// - a naive timestamp, taken as UTC (`2024-01-03T12:00:00`, `2024-01-03 12:00:00`)
/// - a date, taken as midnight UTC (`2024-01-03`)
/// - a duration counted back from `now` (`30days`, `12h`, `2weeks 3d`)
pub fn parse_cutoff(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = input.trim();
    let invalid = |message: String| ValidationError::InvalidCutoff {
        input: input.to_string(),
        message,
    };

    if trimmed.is_empty() {
        return Err(invalid("cutoff must not be empty".to_string()));
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(start_of_day(date));
    }

    let age = humantime::parse_duration(trimmed).map_err(|_| {
        invalid("expected an RFC 3339 timestamp, a YYYY-MM-DD date or a duration".to_string())
    })?;
    let age = chrono::Duration::from_std(age).map_err(|e| invalid(e.to_string()))?;
    now.checked_sub_signed(age)
        .ok_or_else(|| invalid("duration reaches before the earliest representable time".to_string()))
}
