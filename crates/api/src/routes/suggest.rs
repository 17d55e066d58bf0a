use axum::extract::State;
use axum::Json;

use solver_greedy::suggest_relaxations;
use types::RelaxationSuggestion;

use crate::state::AppState;

/// Probes each relaxable rule alone against the current roster and reports
/// the ones that would make the instance schedulable, with the penalty the
/// relaxed schedule would carry.
#[utoipa::path(
    post,
    path = "/v1/schedule/suggest",
    responses((status = 200, description = "Relaxations that would unblock scheduling", body = [RelaxationSuggestion]))
)]
pub async fn suggest(State(state): State<AppState>) -> Json<Vec<RelaxationSuggestion>> {
    let instance = state.workspace.read().repo.snapshot();
    Json(suggest_relaxations(&instance))
}
