use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::models::error::AppError;
use crate::models::gallery::{Gender, Outfit};
use crate::router::AppState;

/// GET /api/gallery/:gender
pub async fn list_outfits(
    State(state): State<Arc<AppState>>,
    Path(gender): Path<String>,
) -> Result<Json<Vec<Outfit>>, AppError> {
    let gender: Gender = gender.parse().map_err(AppError::InvalidBody)?;
    Ok(Json(state.gallery.outfits(gender).to_vec()))
}
