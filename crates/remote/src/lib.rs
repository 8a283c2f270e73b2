pub mod config;
mod wire;

use async_trait::async_trait;
use db::{
    models::{
        applicant::{Applicant, ApplicantStatus},
        review::Review,
        task::Task,
    },
    store::{ReviewSubmission, StoreError, TaskStore},
};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use utils::response::ApiResponse;

pub use config::{ConfigError, RemoteConfig};
use wire::{CreateReview, ErrorBody, ReviewDto, ReviewPage, TaskDto, VolunteerAction, VolunteerDto, VolunteerPage};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected response body: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

impl From<RemoteError> for StoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Api { status, message } => match status {
                StatusCode::NOT_FOUND => StoreError::NotFound(message),
                StatusCode::CONFLICT => StoreError::Conflict(message),
                _ => StoreError::Rejected(message),
            },
            other => StoreError::Other(other.into()),
        }
    }
}

/// `TaskStore` over the board's REST API.
#[derive(Debug)]
pub struct RemoteStore {
    client: Client,
    config: RemoteConfig,
}

impl RemoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.token() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            tracing::debug!(%status, %message, "API request failed");
            return Err(RemoteError::Api { status, message });
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        envelope
            .into_data()
            .map_err(|message| RemoteError::Api { status, message })
    }

    async fn applicants_page(
        &self,
        task_id: i64,
        status: Option<ApplicantStatus>,
        page: u32,
    ) -> Result<VolunteerPage, RemoteError> {
        let url = self.config.endpoint(&format!("tasks/{task_id}/volunteers/"))?;
        let mut query = vec![
            ("page", page.to_string()),
            ("limit", self.config.applicant_page_limit().to_string()),
        ];
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }

        self.fetch(self.client.get(url).query(&query)).await
    }
}

#[async_trait]
impl TaskStore for RemoteStore {
    #[tracing::instrument(skip(self))]
    async fn get_task(&self, task_id: i64) -> Result<Task, StoreError> {
        let url = self
            .config
            .endpoint(&format!("tasks/{task_id}/"))
            .map_err(RemoteError::from)?;
        let task: TaskDto = self.fetch(self.client.get(url)).await?;
        Ok(task.into())
    }

    #[tracing::instrument(skip(self))]
    async fn list_applicants(
        &self,
        task_id: i64,
        status: Option<ApplicantStatus>,
    ) -> Result<Vec<Applicant>, StoreError> {
        let mut applicants = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.applicants_page(task_id, status, page).await?;
            let fetched = batch.volunteers.len();
            applicants.extend(
                batch
                    .volunteers
                    .into_iter()
                    .map(|volunteer: VolunteerDto| volunteer.into_applicant(task_id)),
            );

            let has_next = batch.pagination.is_some_and(|p| p.has_next());
            if !has_next || fetched == 0 {
                break;
            }
            page += 1;
        }

        if let Some(status) = status {
            applicants.retain(|applicant| applicant.status == status);
        }
        Ok(applicants)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_applicant(
        &self,
        task_id: i64,
        applicant_id: i64,
    ) -> Result<Applicant, StoreError> {
        let url = self
            .config
            .endpoint(&format!("tasks/{task_id}/volunteers/"))
            .map_err(RemoteError::from)?;
        let body = VolunteerAction {
            volunteer_id: applicant_id,
            action: "accept",
        };

        let volunteer: VolunteerDto = self.fetch(self.client.post(url).json(&body)).await?;
        Ok(volunteer.into_applicant(task_id))
    }

    #[tracing::instrument(skip(self))]
    async fn list_reviews(&self, task_id: i64) -> Result<Vec<Review>, StoreError> {
        let url = self
            .config
            .endpoint(&format!("tasks/{task_id}/reviews/"))
            .map_err(RemoteError::from)?;
        let page: ReviewPage = self.fetch(self.client.get(url)).await?;

        Ok(page
            .reviews
            .into_iter()
            .map(Review::from)
            .filter(|review| review.task_id == task_id)
            .collect())
    }

    #[tracing::instrument(skip(self, submission), fields(task_id = submission.task_id, reviewee_id = submission.reviewee_id))]
    async fn upsert_review(&self, submission: &ReviewSubmission) -> Result<Review, StoreError> {
        let url = self.config.endpoint("reviews/").map_err(RemoteError::from)?;
        let body = CreateReview {
            task_id: submission.task_id,
            reviewee_id: submission.reviewee_id,
            comment: &submission.comment,
            ratings: &submission.ratings,
        };

        let review: ReviewDto = self.fetch(self.client.post(url).json(&body)).await?;
        Ok(review.into())
    }
}
