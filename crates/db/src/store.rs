use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::models::{
    applicant::{Applicant, ApplicantStatus},
    review::{Ratings, Review},
    task::Task,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    /// The store refused the request; the message is what it said.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Payload of a review upsert. The store keys it on `(task_id, reviewer_id, reviewee_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ReviewSubmission {
    pub task_id: i64,
    pub reviewer_id: i64,
    pub reviewee_id: i64,
    pub ratings: Ratings,
    pub comment: String,
}

/// Task, volunteer and review operations backed by the board's store.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get_task(&self, task_id: i64) -> Result<Task, StoreError>;

    /// Applicants of `task_id`, optionally narrowed to one status.
    async fn list_applicants(
        &self,
        task_id: i64,
        status: Option<ApplicantStatus>,
    ) -> Result<Vec<Applicant>, StoreError>;

    /// Moves one applicant to ACCEPTED.
    async fn accept_applicant(
        &self,
        task_id: i64,
        applicant_id: i64,
    ) -> Result<Applicant, StoreError>;

    async fn list_reviews(&self, task_id: i64) -> Result<Vec<Review>, StoreError>;

    /// Creates the review for the submission's triple, or updates it when one exists.
    async fn upsert_review(&self, submission: &ReviewSubmission) -> Result<Review, StoreError>;
}

#[async_trait]
impl<S> TaskStore for Arc<S>
where
    S: TaskStore + ?Sized,
{
    async fn get_task(&self, task_id: i64) -> Result<Task, StoreError> {
        (**self).get_task(task_id).await
    }

    async fn list_applicants(
        &self,
        task_id: i64,
        status: Option<ApplicantStatus>,
    ) -> Result<Vec<Applicant>, StoreError> {
        (**self).list_applicants(task_id, status).await
    }

    async fn accept_applicant(
        &self,
        task_id: i64,
        applicant_id: i64,
    ) -> Result<Applicant, StoreError> {
        (**self).accept_applicant(task_id, applicant_id).await
    }

    async fn list_reviews(&self, task_id: i64) -> Result<Vec<Review>, StoreError> {
        (**self).list_reviews(task_id).await
    }

    async fn upsert_review(&self, submission: &ReviewSubmission) -> Result<Review, StoreError> {
        (**self).upsert_review(submission).await
    }
}
