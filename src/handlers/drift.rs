//! Drift monitor status handler

use axum::{extract::State, Json};

use crate::drift::MonitorStatus;
use crate::AppState;

/// Last decision, counters and cooldown of the drift loop
pub async fn status(State(state): State<AppState>) -> Json<MonitorStatus> {
    Json(state.status.read().clone())
}
