use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    models::{
        applicant::{Applicant, ApplicantStatus},
        review::Review,
        task::Task,
    },
    store::{ReviewSubmission, StoreError, TaskStore},
};

/// Process-local store with the board's accept/upsert rules. Failures can be injected per
/// applicant or per upcoming review upsert.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
    accept_delay: Option<Duration>,
    accepts_in_flight: AtomicUsize,
    max_accepts_in_flight: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<i64, Task>,
    applicants: BTreeMap<i64, Applicant>,
    reviews: Vec<Review>,
    next_review_id: i64,
    accept_failures: HashMap<i64, String>,
    upsert_failures: VecDeque<String>,
    accept_calls: usize,
    upsert_calls: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every accept sleeps for `delay` before touching state.
    pub fn with_accept_delay(delay: Duration) -> Self {
        Self {
            accept_delay: Some(delay),
            ..Self::default()
        }
    }

    pub async fn insert_task(&self, task: Task) {
        self.inner.write().await.tasks.insert(task.id, task);
    }

    pub async fn insert_applicant(&self, applicant: Applicant) {
        self.inner
            .write()
            .await
            .applicants
            .insert(applicant.id, applicant);
    }

    pub async fn insert_review(&self, review: Review) {
        let mut inner = self.inner.write().await;
        inner.next_review_id = inner.next_review_id.max(review.id);
        inner.reviews.push(review);
    }

    pub async fn set_task_status(&self, task_id: i64, status: crate::models::task::TaskStatus) {
        if let Some(task) = self.inner.write().await.tasks.get_mut(&task_id) {
            task.status = status;
        }
    }

    /// Accepting `applicant_id` will fail with `reason`.
    pub async fn fail_accept(&self, applicant_id: i64, reason: impl Into<String>) {
        self.inner
            .write()
            .await
            .accept_failures
            .insert(applicant_id, reason.into());
    }

    /// The next review upsert fails with `reason`. Queued failures are consumed in order.
    pub async fn fail_next_upsert(&self, reason: impl Into<String>) {
        self.inner
            .write()
            .await
            .upsert_failures
            .push_back(reason.into());
    }

    pub async fn accept_calls(&self) -> usize {
        self.inner.read().await.accept_calls
    }

    pub async fn upsert_calls(&self) -> usize {
        self.inner.read().await.upsert_calls
    }

    /// Highest number of accepts that were running at the same time.
    pub fn max_accepts_in_flight(&self) -> usize {
        self.max_accepts_in_flight.load(Ordering::SeqCst)
    }

    pub async fn applicant(&self, applicant_id: i64) -> Option<Applicant> {
        self.inner
            .read()
            .await
            .applicants
            .get(&applicant_id)
            .cloned()
    }

    async fn accept_inner(&self, task_id: i64, applicant_id: i64) -> Result<Applicant, StoreError> {
        if let Some(delay) = self.accept_delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.write().await;
        inner.accept_calls += 1;

        if let Some(reason) = inner.accept_failures.get(&applicant_id) {
            return Err(StoreError::Rejected(reason.clone()));
        }

        let applicant = inner
            .applicants
            .get_mut(&applicant_id)
            .filter(|applicant| applicant.task_id == task_id)
            .ok_or_else(|| {
                StoreError::NotFound(format!("volunteer {applicant_id} on task {task_id}"))
            })?;

        match applicant.status {
            ApplicantStatus::Pending | ApplicantStatus::Rejected => {
                applicant.status = ApplicantStatus::Accepted;
                Ok(applicant.clone())
            }
            ApplicantStatus::Accepted => Err(StoreError::Conflict(format!(
                "volunteer {applicant_id} is already accepted"
            ))),
            ApplicantStatus::Withdrawn => Err(StoreError::Conflict(format!(
                "volunteer {applicant_id} has withdrawn"
            ))),
        }
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn get_task(&self, task_id: i64) -> Result<Task, StoreError> {
        self.inner
            .read()
            .await
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("task {task_id}")))
    }

    async fn list_applicants(
        &self,
        task_id: i64,
        status: Option<ApplicantStatus>,
    ) -> Result<Vec<Applicant>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .applicants
            .values()
            .filter(|applicant| applicant.task_id == task_id)
            .filter(|applicant| status.is_none_or(|status| applicant.status == status))
            .cloned()
            .collect())
    }

    async fn accept_applicant(
        &self,
        task_id: i64,
        applicant_id: i64,
    ) -> Result<Applicant, StoreError> {
        let running = self.accepts_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_accepts_in_flight
            .fetch_max(running, Ordering::SeqCst);

        let result = self.accept_inner(task_id, applicant_id).await;

        self.accepts_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list_reviews(&self, task_id: i64) -> Result<Vec<Review>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|review| review.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn upsert_review(&self, submission: &ReviewSubmission) -> Result<Review, StoreError> {
        let mut inner = self.inner.write().await;
        inner.upsert_calls += 1;

        if let Some(reason) = inner.upsert_failures.pop_front() {
            return Err(StoreError::Rejected(reason));
        }

        let task = inner
            .tasks
            .get(&submission.task_id)
            .ok_or_else(|| StoreError::NotFound(format!("task {}", submission.task_id)))?;
        if !task.is_completed() {
            return Err(StoreError::Rejected(
                "Cannot review a task that is not completed".to_string(),
            ));
        }
        let is_participant = |user_id: i64| {
            task.is_creator(user_id)
                || task.assignee_ids.contains(&user_id)
                || inner.applicants.values().any(|applicant| {
                    applicant.task_id == task.id
                        && applicant.user_id == user_id
                        && applicant.is_accepted()
                })
        };
        if !is_participant(submission.reviewer_id) {
            return Err(StoreError::Rejected(
                "Only task participants can submit reviews".to_string(),
            ));
        }
        if !is_participant(submission.reviewee_id) {
            return Err(StoreError::Rejected(
                "Can only review task participants".to_string(),
            ));
        }
        if submission.reviewer_id == submission.reviewee_id {
            return Err(StoreError::Rejected("Cannot review yourself".to_string()));
        }

        if let Some(existing) = inner.reviews.iter_mut().find(|review| {
            review.is_for(
                submission.task_id,
                submission.reviewer_id,
                submission.reviewee_id,
            )
        }) {
            existing.ratings = submission.ratings.clone();
            existing.comment = submission.comment.clone();
            tracing::debug!(review_id = existing.id, "updated review");
            return Ok(existing.clone());
        }

        inner.next_review_id += 1;
        let review = Review {
            id: inner.next_review_id,
            task_id: submission.task_id,
            reviewer_id: submission.reviewer_id,
            reviewee_id: submission.reviewee_id,
            ratings: submission.ratings.clone(),
            comment: submission.comment.clone(),
            created_at: Some(Utc::now()),
        };
        inner.reviews.push(review.clone());
        tracing::debug!(review_id = review.id, "created review");
        Ok(review)
    }
}
