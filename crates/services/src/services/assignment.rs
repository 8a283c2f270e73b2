use std::collections::HashSet;

use db::store::TaskStore;
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("Select at least one volunteer to assign")]
    EmptySelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentOutcome {
    Accepted,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct AssignmentAttempt {
    pub applicant_id: i64,
    pub outcome: AssignmentOutcome,
}

impl AssignmentAttempt {
    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, AssignmentOutcome::Accepted)
    }
}

/// Outcome of one allocation attempt: every attempted applicant with its result, in the
/// order they were selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct AssignmentBatchResult {
    pub task_id: i64,
    pub attempts: Vec<AssignmentAttempt>,
}

impl AssignmentBatchResult {
    pub fn succeeded(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_accepted()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempts.len() - self.succeeded()
    }

    pub fn accepted_ids(&self) -> Vec<i64> {
        self.attempts
            .iter()
            .filter(|a| a.is_accepted())
            .map(|a| a.applicant_id)
            .collect()
    }

    /// Failed applicant ids paired with the reason the store gave.
    pub fn failures(&self) -> Vec<(i64, &str)> {
        self.attempts
            .iter()
            .filter_map(|attempt| match &attempt.outcome {
                AssignmentOutcome::Failed { reason } => Some((attempt.applicant_id, reason.as_str())),
                AssignmentOutcome::Accepted => None,
            })
            .collect()
    }

    pub fn summary_message(&self) -> String {
        format!(
            "Successfully assigned {} volunteer(s). Failed to assign {} volunteer(s).",
            self.succeeded(),
            self.failed()
        )
    }
}

/// Accepts every selected applicant of `task_id`.
///
/// All accepts are dispatched at once and every one is awaited; a failure never cancels or
/// rolls back the others. Capacity is not re-checked here. Repeated ids are attempted once.
#[tracing::instrument(skip(store, applicant_ids), fields(selected = applicant_ids.len()))]
pub async fn commit_assignments<S>(
    store: &S,
    task_id: i64,
    applicant_ids: &[i64],
) -> Result<AssignmentBatchResult, AssignmentError>
where
    S: TaskStore + ?Sized,
{
    if applicant_ids.is_empty() {
        return Err(AssignmentError::EmptySelection);
    }

    let mut seen = HashSet::new();
    let ids: Vec<i64> = applicant_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    let results = join_all(
        ids.iter()
            .map(|applicant_id| store.accept_applicant(task_id, *applicant_id)),
    )
    .await;

    let attempts = ids
        .into_iter()
        .zip(results)
        .map(|(applicant_id, result)| {
            let outcome = match result {
                Ok(_) => AssignmentOutcome::Accepted,
                Err(err) => {
                    warn!(applicant_id, error = %err, "Failed to accept volunteer");
                    AssignmentOutcome::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            AssignmentAttempt {
                applicant_id,
                outcome,
            }
        })
        .collect();

    let result = AssignmentBatchResult { task_id, attempts };
    info!(
        succeeded = result.succeeded(),
        failed = result.failed(),
        "Assignment batch settled"
    );
    Ok(result)
}
