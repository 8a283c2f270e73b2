use std::collections::HashSet;

use db::models::{
    applicant::Applicant,
    review::{Review, ReviewDirection},
    task::Task,
};
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CounterpartRole {
    Creator,
    Volunteer,
}

/// Someone the viewer may review on a completed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
pub struct Counterpart {
    pub user_id: i64,
    pub role: CounterpartRole,
}

impl Counterpart {
    pub fn creator(user_id: i64) -> Self {
        Self {
            user_id,
            role: CounterpartRole::Creator,
        }
    }

    pub fn volunteer(user_id: i64) -> Self {
        Self {
            user_id,
            role: CounterpartRole::Volunteer,
        }
    }

    /// Direction of a review written about this counterpart.
    pub fn review_direction(&self) -> ReviewDirection {
        match self.role {
            CounterpartRole::Volunteer => ReviewDirection::RequesterToVolunteer,
            CounterpartRole::Creator => ReviewDirection::VolunteerToRequester,
        }
    }
}

/// Users who volunteered on `task`: accepted applicants followed by legacy assignees,
/// deduplicated in first-occurrence order.
fn volunteer_user_ids(task: &Task, accepted: &[Applicant]) -> Vec<i64> {
    let mut seen = HashSet::new();
    accepted
        .iter()
        .filter(|applicant| applicant.is_accepted() && applicant.task_id == task.id)
        .map(|applicant| applicant.user_id)
        .chain(task.assignee_ids.iter().copied())
        .filter(|user_id| seen.insert(*user_id))
        .collect()
}

/// Who `viewer_id` may review on `task`.
///
/// The creator reviews every volunteer; a volunteer reviews the creator; anyone else, or any
/// task that is not COMPLETED, gets nothing. The viewer is never part of the result.
pub fn resolve_eligible_reviewees(
    task: &Task,
    viewer_id: i64,
    accepted: &[Applicant],
) -> Vec<Counterpart> {
    if !task.is_completed() {
        return Vec::new();
    }

    let volunteers = volunteer_user_ids(task, accepted);

    if task.is_creator(viewer_id) {
        return volunteers
            .into_iter()
            .filter(|user_id| *user_id != viewer_id)
            .map(Counterpart::volunteer)
            .collect();
    }

    if volunteers.contains(&viewer_id) {
        return vec![Counterpart::creator(task.creator_id)];
    }

    Vec::new()
}

/// Marks each counterpart with whether `viewer_id` already reviewed them on `task_id`.
pub fn with_review_status(
    task_id: i64,
    counterparts: &[Counterpart],
    existing_reviews: &[Review],
    viewer_id: i64,
) -> Vec<(Counterpart, bool)> {
    counterparts
        .iter()
        .map(|counterpart| {
            let reviewed = existing_reviews
                .iter()
                .any(|review| review.is_for(task_id, viewer_id, counterpart.user_id));
            (*counterpart, reviewed)
        })
        .collect()
}

/// Counterparts still waiting for a review, in their original order.
pub fn unreviewed(annotated: &[(Counterpart, bool)]) -> Vec<Counterpart> {
    annotated
        .iter()
        .filter(|(_, reviewed)| !reviewed)
        .map(|(counterpart, _)| *counterpart)
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
pub struct ReviewStatus {
    pub total: usize,
    pub reviewed: usize,
    pub pending: usize,
}

impl ReviewStatus {
    pub fn from_annotated(annotated: &[(Counterpart, bool)]) -> Self {
        let reviewed = annotated.iter().filter(|(_, reviewed)| *reviewed).count();
        Self {
            total: annotated.len(),
            reviewed,
            pending: annotated.len() - reviewed,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }
}
