use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// `{status, message, data}` envelope the board API wraps every payload in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Unwraps the payload, turning an error envelope (or a success without data) into its
    /// message.
    pub fn into_data(self) -> Result<T, String> {
        match (self.status, self.data) {
            (ResponseStatus::Success, Some(data)) => Ok(data),
            (ResponseStatus::Success, None) => Err(self
                .message
                .unwrap_or_else(|| "response carried no data".to_string())),
            (ResponseStatus::Error, _) => Err(self
                .message
                .unwrap_or_else(|| "request failed".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Pagination {
    pub total_records: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

impl Pagination {
    pub fn has_next(&self) -> bool {
        self.next_page.is_some() && self.current_page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_yields_data() {
        let raw = r#"{"status": "success", "message": "ok", "data": {"id": 4}}"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();

        assert!(resp.is_success());
        assert_eq!(resp.into_data().unwrap()["id"], 4);
    }

    #[test]
    fn error_envelope_yields_message() {
        let raw = r#"{"status": "error", "message": "Volunteer is no longer pending"}"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();

        assert_eq!(
            resp.into_data().unwrap_err(),
            "Volunteer is no longer pending"
        );
    }

    #[test]
    fn success_without_data_is_an_error() {
        let raw = r#"{"status": "success"}"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();

        assert_eq!(resp.into_data().unwrap_err(), "response carried no data");
    }

    #[test]
    fn pagination_has_next_only_before_last_page() {
        let mut page = Pagination {
            total_records: 45,
            current_page: 1,
            total_pages: 3,
            next_page: Some(2),
            prev_page: None,
        };
        assert!(page.has_next());

        page.current_page = 3;
        page.next_page = None;
        assert!(!page.has_next());
    }
}
