//! Model selection handlers

use std::path::Path;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use crate::handoff::{self, HandoffError};
use crate::models::SelectionResult;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SelectRequest {
    /// Overrides the configured candidates for this run
    pub candidates: Option<Vec<String>>,
}

/// Current selection
pub async fn selected(State(state): State<AppState>) -> Json<SelectionResult> {
    Json(state.selection.read().clone())
}

/// Re-run selection on demand. A request without a JSON body uses the
/// configured candidates; a JSON body that does not decode is a 400.
pub async fn select(
    State(state): State<AppState>,
    body: Result<Json<SelectRequest>, JsonRejection>,
) -> AppResult<Json<SelectionResult>> {
    let request = match body {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => SelectRequest::default(),
        Err(rejection) => return Err(AppError::ValidationError(rejection.body_text())),
    };

    let candidates = match request.candidates {
        Some(names) => {
            if names.iter().any(|n| n.trim().is_empty()) {
                return Err(AppError::ValidationError("Candidate names must not be empty".into()));
            }
            names
        }
        None => state.config.candidate_model_names.clone(),
    };

    tracing::info!("Model re-selection requested for {:?}", candidates);
    let result = reselect(&state, &candidates).await?;
    Ok(Json(result))
}

/// Select, publish to the shared state, then hand off to the loader. The
/// published selection is kept even when the hand-off write fails.
pub async fn reselect(state: &AppState, candidates: &[String]) -> Result<SelectionResult, HandoffError> {
    let result = state.selector.select(candidates).await;
    *state.selection.write() = result.clone();

    if let Some(path) = &state.config.selected_model_path {
        handoff::write_selection(Path::new(path), &result)?;
    }

    Ok(result)
}
