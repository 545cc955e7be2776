//! Request body extraction with validation.
//!
//! Every body is parsed and checked before the handler runs, so a rejected
//! request never reaches a collaborator.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use neo_models::{
    AnalysisRequest, CreatorInsightRequest, EnhancementRequest, ModerationRequest, RecommendationRequest,
    SearchQuery, ThumbnailRequest,
};

use crate::error::ApiError;

/// Checks beyond what deserialization enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn non_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{}` must not be blank", field))
    } else {
        Ok(())
    }
}

impl Validate for AnalysisRequest {
    fn validate(&self) -> Result<(), String> {
        non_blank("video_id", self.video_id.as_str())?;
        non_blank("user_id", &self.user_id)?;
        non_blank("video_url", &self.video_url)
    }
}

impl Validate for RecommendationRequest {
    fn validate(&self) -> Result<(), String> {
        non_blank("user_id", &self.user_id)?;
        non_blank("video_id", self.video_id.as_str())
    }
}

impl Validate for ModerationRequest {
    fn validate(&self) -> Result<(), String> {
        non_blank("content_url", &self.content_url)?;
        non_blank("user_id", &self.user_id)
    }
}

impl Validate for ThumbnailRequest {
    fn validate(&self) -> Result<(), String> {
        non_blank("video_url", &self.video_url)
    }
}

impl Validate for EnhancementRequest {
    fn validate(&self) -> Result<(), String> {
        non_blank("video_url", &self.video_url)
    }
}

impl Validate for SearchQuery {
    fn validate(&self) -> Result<(), String> {
        non_blank("user_id", &self.user_id)
    }
}

impl Validate for CreatorInsightRequest {
    fn validate(&self) -> Result<(), String> {
        non_blank("user_id", &self.user_id)?;
        match self.video_ids.iter().position(|id| id.as_str().trim().is_empty()) {
            Some(i) => Err(format!("`video_ids[{}]` must not be blank", i)),
            None => Ok(()),
        }
    }
}

/// JSON body that has passed [`Validate`]. Any failure is a 422.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        value.validate().map_err(ApiError::Validation)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_models::VideoId;

    #[test]
    fn blank_ids_are_rejected() {
        let req = AnalysisRequest {
            video_id: VideoId::from(" "),
            user_id: "u1".into(),
            video_url: "http://x/v.mp4".into(),
        };
        assert_eq!(req.validate().unwrap_err(), "`video_id` must not be blank");

        let insights = CreatorInsightRequest {
            user_id: "u1".into(),
            video_ids: vec![VideoId::from("v1"), VideoId::from("")],
        };
        assert!(insights.validate().unwrap_err().contains("video_ids[1]"));
    }

    #[test]
    fn empty_search_query_is_allowed() {
        let q = SearchQuery {
            query: String::new(),
            user_id: "u1".into(),
            filters: None,
        };
        assert!(q.validate().is_ok());
    }
}
