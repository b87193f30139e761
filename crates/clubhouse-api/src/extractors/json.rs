//! JSON body extractor that validates the payload.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use clubhouse_core::error::AppError;

use crate::dto::validate;
use crate::error::ApiError;

/// Deserializes a JSON body and runs its `validator` rules.
///
/// Malformed bodies become `VALIDATION` errors rather than Axum's plain-text
/// rejections.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;
        validate(&value)?;
        Ok(Self(value))
    }
}
