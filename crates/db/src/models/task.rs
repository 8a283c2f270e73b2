use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Posted,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    /// Number of volunteers the creator asked for. `None` means the field was never set.
    #[serde(default)]
    pub required_volunteer_count: Option<u32>,
    pub status: TaskStatus,
    pub creator_id: i64,
    /// Users assigned through the single-assignee field or the assignee list that predate
    /// volunteer records.
    #[serde(default)]
    pub assignee_ids: Vec<i64>,
}

impl Task {
    pub fn required_volunteers(&self) -> u32 {
        self.required_volunteer_count.unwrap_or(1)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_creator(&self, user_id: i64) -> bool {
        self.creator_id == user_id
    }
}
