use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;
use tracing::{error, info};

use crate::models::error::AppError;
use crate::models::image::EncodedImage;
use crate::router::AppState;
use crate::services::classifier::classify;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub person_image: Option<EncodedImage>,
    pub clothing_image: Option<EncodedImage>,
}

/// POST /api/generate - relay a try-on request to the model.
pub async fn generate(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<EncodedImage>, AppError> {
    let api_key = state.credentials.resolve().ok_or_else(|| {
        error!(var = %state.config.api_key_var, "Model credential is not set in the environment");
        AppError::MissingApiKey {
            var: state.config.api_key_var.clone(),
        }
    })?;

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::EmptyBody);
    }

    let request: GenerateRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidBody(e.to_string()))?;

    let (Some(person), Some(clothing)) = (request.person_image, request.clothing_image) else {
        return Err(AppError::MissingImages);
    };

    let response = state.gemini.try_on(&api_key, person, clothing).await.map_err(|e| {
        error!(error = %e, "Try-on request to the model failed");
        e
    })?;

    let image = classify(&response).into_image(&state.context)?;
    info!(mime_type = %image.mime_type, bytes = image.data.len(), "Try-on image generated");
    Ok(Json(image))
}

/// Any verb other than POST on the generate route.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
