use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Which way a review points. Each direction rates its own fixed set of dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(rename_all = "snake_case")]
pub enum ReviewDirection {
    RequesterToVolunteer,
    VolunteerToRequester,
}

impl ReviewDirection {
    pub fn dimensions(&self) -> &'static [RatingDimension] {
        match self {
            ReviewDirection::RequesterToVolunteer => &[
                RatingDimension::Reliability,
                RatingDimension::TaskCompletion,
                RatingDimension::CommunicationRequesterToVolunteer,
                RatingDimension::SafetyAndRespect,
            ],
            ReviewDirection::VolunteerToRequester => &[
                RatingDimension::AccuracyOfRequest,
                RatingDimension::CommunicationVolunteerToRequester,
                RatingDimension::SafetyAndPreparedness,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(rename_all = "snake_case")]
pub enum RatingDimension {
    Reliability,
    TaskCompletion,
    CommunicationRequesterToVolunteer,
    SafetyAndRespect,
    AccuracyOfRequest,
    CommunicationVolunteerToRequester,
    SafetyAndPreparedness,
}

impl RatingDimension {
    pub fn key(&self) -> &'static str {
        match self {
            RatingDimension::Reliability => "reliability",
            RatingDimension::TaskCompletion => "task_completion",
            RatingDimension::CommunicationRequesterToVolunteer => {
                "communication_requester_to_volunteer"
            }
            RatingDimension::SafetyAndRespect => "safety_and_respect",
            RatingDimension::AccuracyOfRequest => "accuracy_of_request",
            RatingDimension::CommunicationVolunteerToRequester => {
                "communication_volunteer_to_requester"
            }
            RatingDimension::SafetyAndPreparedness => "safety_and_preparedness",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingDimension::Reliability => "Reliability",
            RatingDimension::TaskCompletion => "Task Completion",
            RatingDimension::CommunicationRequesterToVolunteer => "Communication",
            RatingDimension::SafetyAndRespect => "Safety & Respect",
            RatingDimension::AccuracyOfRequest => "Accuracy of Request",
            RatingDimension::CommunicationVolunteerToRequester => "Communication",
            RatingDimension::SafetyAndPreparedness => "Safety & Preparedness",
        }
    }

    pub fn direction(&self) -> ReviewDirection {
        match self {
            RatingDimension::Reliability
            | RatingDimension::TaskCompletion
            | RatingDimension::CommunicationRequesterToVolunteer
            | RatingDimension::SafetyAndRespect => ReviewDirection::RequesterToVolunteer,
            RatingDimension::AccuracyOfRequest
            | RatingDimension::CommunicationVolunteerToRequester
            | RatingDimension::SafetyAndPreparedness => ReviewDirection::VolunteerToRequester,
        }
    }
}

/// Sub-ratings of a review, one optional 1..=5 value per dimension. Field names match the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Ratings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_completion: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_requester_to_volunteer: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_and_respect: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_of_request: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_volunteer_to_requester: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_and_preparedness: Option<u8>,
}

impl Ratings {
    pub fn get(&self, dimension: RatingDimension) -> Option<u8> {
        match dimension {
            RatingDimension::Reliability => self.reliability,
            RatingDimension::TaskCompletion => self.task_completion,
            RatingDimension::CommunicationRequesterToVolunteer => {
                self.communication_requester_to_volunteer
            }
            RatingDimension::SafetyAndRespect => self.safety_and_respect,
            RatingDimension::AccuracyOfRequest => self.accuracy_of_request,
            RatingDimension::CommunicationVolunteerToRequester => {
                self.communication_volunteer_to_requester
            }
            RatingDimension::SafetyAndPreparedness => self.safety_and_preparedness,
        }
    }

    pub fn set(&mut self, dimension: RatingDimension, value: Option<u8>) {
        let slot = match dimension {
            RatingDimension::Reliability => &mut self.reliability,
            RatingDimension::TaskCompletion => &mut self.task_completion,
            RatingDimension::CommunicationRequesterToVolunteer => {
                &mut self.communication_requester_to_volunteer
            }
            RatingDimension::SafetyAndRespect => &mut self.safety_and_respect,
            RatingDimension::AccuracyOfRequest => &mut self.accuracy_of_request,
            RatingDimension::CommunicationVolunteerToRequester => {
                &mut self.communication_volunteer_to_requester
            }
            RatingDimension::SafetyAndPreparedness => &mut self.safety_and_preparedness,
        };
        *slot = value;
    }

    /// Direction implied by which set of dimensions carries values. Mixed or empty ratings
    /// have no direction.
    pub fn direction(&self) -> Option<ReviewDirection> {
        let has_any = |direction: ReviewDirection| {
            direction
                .dimensions()
                .iter()
                .any(|dimension| self.get(*dimension).is_some())
        };

        match (
            has_any(ReviewDirection::RequesterToVolunteer),
            has_any(ReviewDirection::VolunteerToRequester),
        ) {
            (true, false) => Some(ReviewDirection::RequesterToVolunteer),
            (false, true) => Some(ReviewDirection::VolunteerToRequester),
            _ => None,
        }
    }

    /// Mean of the provided sub-ratings of `direction`; 0.0 when none are set.
    pub fn score(&self, direction: ReviewDirection) -> f64 {
        let values: Vec<f64> = direction
            .dimensions()
            .iter()
            .filter_map(|dimension| self.get(*dimension))
            .map(f64::from)
            .collect();

        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    /// Copy holding only the dimensions of `direction`.
    pub fn restricted_to(&self, direction: ReviewDirection) -> Ratings {
        let mut ratings = Ratings::default();
        for dimension in direction.dimensions() {
            ratings.set(*dimension, self.get(*dimension));
        }
        ratings
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Review {
    pub id: i64,
    pub task_id: i64,
    pub reviewer_id: i64,
    pub reviewee_id: i64,
    #[serde(flatten)]
    pub ratings: Ratings,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    #[ts(type = "Date | null")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    /// True for the review `reviewer_id` wrote about `reviewee_id` on `task_id`.
    pub fn is_for(&self, task_id: i64, reviewer_id: i64, reviewee_id: i64) -> bool {
        self.task_id == task_id
            && self.reviewer_id == reviewer_id
            && self.reviewee_id == reviewee_id
    }

    pub fn direction(&self) -> Option<ReviewDirection> {
        self.ratings.direction()
    }

    /// Overall score: mean of the sub-ratings of the review's direction.
    pub fn score(&self) -> f64 {
        self.direction()
            .map(|direction| self.ratings.score(direction))
            .unwrap_or(0.0)
    }
}
