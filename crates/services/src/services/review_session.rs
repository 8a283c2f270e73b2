//! One-reviewee-at-a-time review submission for a completed task.
//!
//! A session moves `Idle -> Active -> Closed`. While active it holds a fixed candidate list,
//! the index of the current candidate and a draft for that candidate. The draft starts from
//! the viewer's existing review of the candidate, if any, so re-submitting edits it in place.

use std::{fmt, sync::Arc};

use db::{
    models::review::{MAX_RATING, MIN_RATING, RatingDimension, Ratings, Review, ReviewDirection},
    store::{ReviewSubmission, StoreError, TaskStore},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

use super::eligibility::Counterpart;

/// Per-field validation flags of a draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
pub struct DraftValidation {
    /// Declared dimensions with no rating, or one outside 1..=5.
    pub missing_ratings: Vec<RatingDimension>,
    pub missing_comment: bool,
}

impl DraftValidation {
    pub fn is_valid(&self) -> bool {
        self.missing_ratings.is_empty() && !self.missing_comment
    }

    pub fn is_missing(&self, dimension: RatingDimension) -> bool {
        self.missing_ratings.contains(&dimension)
    }
}

impl fmt::Display for DraftValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.missing_ratings.is_empty(), self.missing_comment) {
            (false, true) => write!(f, "Please provide all ratings and write a review comment"),
            (false, false) => write!(f, "Please provide all ratings"),
            (true, true) => write!(f, "Please write a review comment"),
            (true, false) => write!(f, "Review is complete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReviewSessionError {
    #[error("There is nobody left to review on this task")]
    NothingToReview,
    #[error("No review session is active")]
    NotActive,
    #[error("A review session is already active")]
    AlreadyActive,
    #[error("{0:?} is not rated in this review")]
    ForeignDimension(RatingDimension),
    #[error("{0}")]
    Validation(DraftValidation),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Working copy of one review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct ReviewDraft {
    pub direction: ReviewDirection,
    pub ratings: Ratings,
    pub comment: String,
    /// True when the draft was loaded from a review that already exists.
    pub editing: bool,
}

impl ReviewDraft {
    pub fn blank(direction: ReviewDirection) -> Self {
        Self {
            direction,
            ratings: Ratings::default(),
            comment: String::new(),
            editing: false,
        }
    }

    pub fn from_review(review: &Review, direction: ReviewDirection) -> Self {
        Self {
            direction,
            ratings: review.ratings.restricted_to(direction),
            comment: review.comment.clone(),
            editing: true,
        }
    }

    pub fn dimensions(&self) -> &'static [RatingDimension] {
        self.direction.dimensions()
    }

    pub fn validate(&self) -> DraftValidation {
        let missing_ratings = self
            .dimensions()
            .iter()
            .copied()
            .filter(|dimension| {
                !self
                    .ratings
                    .get(*dimension)
                    .is_some_and(|value| (MIN_RATING..=MAX_RATING).contains(&value))
            })
            .collect();

        DraftValidation {
            missing_ratings,
            missing_comment: self.comment.trim().is_empty(),
        }
    }

    pub fn score(&self) -> f64 {
        self.ratings.score(self.direction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Active,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; the session moved on to the candidate at `current_index`.
    Advanced { current_index: usize },
    /// Saved the last candidate; the session is closed.
    Completed { submitted: usize },
}

struct ActiveSession {
    candidates: Vec<Counterpart>,
    current_index: usize,
    draft: ReviewDraft,
    reviews: Vec<Review>,
}

impl ActiveSession {
    fn current(&self) -> Counterpart {
        self.candidates[self.current_index]
    }

    fn load_draft(&mut self, task_id: i64, viewer_id: i64) {
        let counterpart = self.current();
        let direction = counterpart.review_direction();
        self.draft = self
            .reviews
            .iter()
            .find(|review| review.is_for(task_id, viewer_id, counterpart.user_id))
            .map(|review| ReviewDraft::from_review(review, direction))
            .unwrap_or_else(|| ReviewDraft::blank(direction));
    }

    fn remember(&mut self, saved: Review) {
        let position = self
            .reviews
            .iter()
            .position(|review| review.is_for(saved.task_id, saved.reviewer_id, saved.reviewee_id));
        match position {
            Some(index) => self.reviews[index] = saved,
            None => self.reviews.push(saved),
        }
    }
}

enum SessionState {
    Idle,
    Active(ActiveSession),
    Closed,
}

pub struct ReviewSession {
    store: Arc<dyn TaskStore>,
    task_id: i64,
    viewer_id: i64,
    state: SessionState,
}

impl ReviewSession {
    pub fn new(store: Arc<dyn TaskStore>, task_id: i64, viewer_id: i64) -> Self {
        Self {
            store,
            task_id,
            viewer_id,
            state: SessionState::Idle,
        }
    }

    /// Starts walking `candidates` in order. Loads the task's reviews once to pre-fill drafts.
    #[tracing::instrument(skip(self, candidates), fields(task_id = self.task_id, viewer_id = self.viewer_id, candidates = candidates.len()))]
    pub async fn open(&mut self, candidates: Vec<Counterpart>) -> Result<(), ReviewSessionError> {
        if matches!(self.state, SessionState::Active(_)) {
            return Err(ReviewSessionError::AlreadyActive);
        }
        let Some(first) = candidates.first() else {
            return Err(ReviewSessionError::NothingToReview);
        };
        let direction = first.review_direction();

        let reviews = self.store.list_reviews(self.task_id).await?;
        let mut active = ActiveSession {
            draft: ReviewDraft::blank(direction),
            candidates,
            current_index: 0,
            reviews,
        };
        active.load_draft(self.task_id, self.viewer_id);

        self.state = SessionState::Active(active);
        Ok(())
    }

    /// Opens a one-candidate session for editing the review of `counterpart`.
    pub async fn edit(&mut self, counterpart: Counterpart) -> Result<(), ReviewSessionError> {
        self.open(vec![counterpart]).await
    }

    pub fn set_rating(
        &mut self,
        dimension: RatingDimension,
        value: Option<u8>,
    ) -> Result<(), ReviewSessionError> {
        let active = self.active_mut()?;
        if dimension.direction() != active.draft.direction {
            return Err(ReviewSessionError::ForeignDimension(dimension));
        }
        active.draft.ratings.set(dimension, value);
        Ok(())
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<(), ReviewSessionError> {
        self.active_mut()?.draft.comment = comment.into();
        Ok(())
    }

    /// Saves the current draft and moves to the next candidate.
    ///
    /// An invalid draft never reaches the store. On a store failure the session stays on the
    /// same candidate with the draft untouched.
    #[tracing::instrument(skip(self), fields(task_id = self.task_id, viewer_id = self.viewer_id))]
    pub async fn submit_current(&mut self) -> Result<SubmitOutcome, ReviewSessionError> {
        let (task_id, viewer_id) = (self.task_id, self.viewer_id);
        let SessionState::Active(active) = &mut self.state else {
            return Err(ReviewSessionError::NotActive);
        };

        let validation = active.draft.validate();
        if !validation.is_valid() {
            return Err(ReviewSessionError::Validation(validation));
        }

        let reviewee_id = active.current().user_id;
        let submission = ReviewSubmission {
            task_id,
            reviewer_id: viewer_id,
            reviewee_id,
            ratings: active.draft.ratings.restricted_to(active.draft.direction),
            comment: active.draft.comment.clone(),
        };

        let saved = match self.store.upsert_review(&submission).await {
            Ok(saved) => saved,
            Err(err) => {
                warn!(reviewee_id, error = %err, "Failed to submit review");
                return Err(err.into());
            }
        };
        info!(reviewee_id, review_id = saved.id, "Review submitted");
        active.remember(saved);

        if active.current_index + 1 < active.candidates.len() {
            active.current_index += 1;
            active.load_draft(task_id, viewer_id);
            Ok(SubmitOutcome::Advanced {
                current_index: active.current_index,
            })
        } else {
            let submitted = active.candidates.len();
            self.state = SessionState::Closed;
            info!(submitted, "All reviews submitted");
            Ok(SubmitOutcome::Completed { submitted })
        }
    }

    /// Drops the session without saving the current draft. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.state, SessionState::Active(_)) {
            self.state = SessionState::Idle;
            true
        } else {
            false
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Active(_) => SessionPhase::Active,
            SessionState::Closed => SessionPhase::Closed,
        }
    }

    pub fn task_id(&self) -> i64 {
        self.task_id
    }

    pub fn viewer_id(&self) -> i64 {
        self.viewer_id
    }

    pub fn candidate_count(&self) -> usize {
        self.active().map_or(0, |active| active.candidates.len())
    }

    pub fn current_index(&self) -> Option<usize> {
        self.active().map(|active| active.current_index)
    }

    pub fn current_candidate(&self) -> Option<Counterpart> {
        self.active().map(ActiveSession::current)
    }

    pub fn draft(&self) -> Option<&ReviewDraft> {
        self.active().map(|active| &active.draft)
    }

    pub fn validation(&self) -> Option<DraftValidation> {
        self.draft().map(ReviewDraft::validate)
    }

    fn active(&self) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::Active(active) => Some(active),
            _ => None,
        }
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSession, ReviewSessionError> {
        match &mut self.state {
            SessionState::Active(active) => Ok(active),
            _ => Err(ReviewSessionError::NotActive),
        }
    }
}
