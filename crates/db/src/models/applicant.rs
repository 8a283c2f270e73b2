use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicantStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantStatus::Pending => "PENDING",
            ApplicantStatus::Accepted => "ACCEPTED",
            ApplicantStatus::Rejected => "REJECTED",
            ApplicantStatus::Withdrawn => "WITHDRAWN",
        }
    }
}

/// One user's application to one task (a volunteer record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Applicant {
    pub id: i64,
    pub user_id: i64,
    pub task_id: i64,
    pub status: ApplicantStatus,
}

impl Applicant {
    pub fn is_pending(&self) -> bool {
        self.status == ApplicantStatus::Pending
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ApplicantStatus::Accepted
    }
}
