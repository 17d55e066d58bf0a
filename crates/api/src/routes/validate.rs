use axum::extract::State;
use axum::Json;
use exam_core::{validate, ValidationError};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/v1/validate",
    responses(
    (status = 200, description = "Integrity report for the current roster", body = ValidationReport)
    )
)]
pub async fn validate_handler(State(state): State<AppState>) -> Json<ValidationReport> {
    let inst = state.workspace.read().repo.snapshot();
    match validate(&inst) {
        Ok(()) => Json(ValidationReport {
            ok: true,
            errors: vec![],
        }),
        Err(ValidationError::Msg(msg)) => {
            let errs = msg
                .split(';')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            Json(ValidationReport {
                ok: false,
                errors: errs,
            })
        }
    }
}
