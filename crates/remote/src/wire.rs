//! JSON shapes of the board API and their conversion into domain models.

use chrono::{DateTime, Utc};
use db::models::{
    applicant::{Applicant, ApplicantStatus},
    review::{RatingDimension, Ratings, Review},
    task::{Task, TaskStatus},
};
use serde::{Deserialize, Serialize};
use utils::response::Pagination;

/// A related record sent either as a bare id or as an object carrying one.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub(crate) enum Ref {
    Id(i64),
    Object { id: i64 },
}

impl Ref {
    pub(crate) fn id(&self) -> i64 {
        match self {
            Ref::Id(id) | Ref::Object { id } => *id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskDto {
    id: i64,
    #[serde(default)]
    title: String,
    status: TaskStatus,
    creator: Ref,
    #[serde(default)]
    assignee: Option<Ref>,
    #[serde(default)]
    assignees: Vec<Ref>,
    #[serde(default)]
    volunteer_number: Option<u32>,
}

impl From<TaskDto> for Task {
    fn from(dto: TaskDto) -> Self {
        let assignee_ids = dto
            .assignee
            .iter()
            .chain(dto.assignees.iter())
            .map(Ref::id)
            .collect();

        Self {
            id: dto.id,
            title: dto.title,
            required_volunteer_count: dto.volunteer_number,
            status: dto.status,
            creator_id: dto.creator.id(),
            assignee_ids,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VolunteerDto {
    id: i64,
    user: Ref,
    #[serde(default)]
    task: Option<Ref>,
    status: ApplicantStatus,
}

impl VolunteerDto {
    /// Volunteer rows do not always embed their task; `task_id` fills the gap.
    pub(crate) fn into_applicant(self, task_id: i64) -> Applicant {
        Applicant {
            id: self.id,
            user_id: self.user.id(),
            task_id: self.task.map_or(task_id, |task| task.id()),
            status: self.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VolunteerPage {
    #[serde(default)]
    pub(crate) volunteers: Vec<VolunteerDto>,
    #[serde(default)]
    pub(crate) pagination: Option<Pagination>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VolunteerAction {
    pub(crate) volunteer_id: i64,
    pub(crate) action: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewDto {
    id: i64,
    task: Ref,
    reviewer: Ref,
    reviewee: Ref,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    reliability: Option<f64>,
    #[serde(default)]
    task_completion: Option<f64>,
    #[serde(default)]
    communication_requester_to_volunteer: Option<f64>,
    #[serde(default)]
    safety_and_respect: Option<f64>,
    #[serde(default)]
    accuracy_of_request: Option<f64>,
    #[serde(default)]
    communication_volunteer_to_requester: Option<f64>,
    #[serde(default)]
    safety_and_preparedness: Option<f64>,
}

impl From<ReviewDto> for Review {
    fn from(dto: ReviewDto) -> Self {
        let mut ratings = Ratings::default();
        for (dimension, value) in [
            (RatingDimension::Reliability, dto.reliability),
            (RatingDimension::TaskCompletion, dto.task_completion),
            (
                RatingDimension::CommunicationRequesterToVolunteer,
                dto.communication_requester_to_volunteer,
            ),
            (RatingDimension::SafetyAndRespect, dto.safety_and_respect),
            (RatingDimension::AccuracyOfRequest, dto.accuracy_of_request),
            (
                RatingDimension::CommunicationVolunteerToRequester,
                dto.communication_volunteer_to_requester,
            ),
            (
                RatingDimension::SafetyAndPreparedness,
                dto.safety_and_preparedness,
            ),
        ] {
            ratings.set(dimension, value.and_then(to_rating));
        }

        Self {
            id: dto.id,
            task_id: dto.task.id(),
            reviewer_id: dto.reviewer.id(),
            reviewee_id: dto.reviewee.id(),
            ratings,
            comment: dto.comment,
            created_at: dto.timestamp,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewPage {
    #[serde(default)]
    pub(crate) reviews: Vec<ReviewDto>,
}

/// Body of `POST /reviews/`. The reviewer is whoever the token belongs to.
#[derive(Debug, Serialize)]
pub(crate) struct CreateReview<'a> {
    pub(crate) task_id: i64,
    pub(crate) reviewee_id: i64,
    pub(crate) comment: &'a str,
    #[serde(flatten)]
    pub(crate) ratings: &'a Ratings,
}

/// Error bodies come either as the envelope or as a bare `{"detail": ...}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) detail: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message.or(self.detail)
    }
}

// The API stores ratings as floats; the domain keeps whole stars.
fn to_rating(value: f64) -> Option<u8> {
    value
        .is_finite()
        .then(|| value.round().clamp(0.0, f64::from(u8::MAX)) as u8)
}
