use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use jobs::JobStatus;
use types::{SolveParams, SolveRequest};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct SolveIn {
    #[serde(default)]
    pub params: SolveParams,
}

#[derive(serde::Serialize, ToSchema)]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[derive(Deserialize, ToSchema)]
pub struct CommitIn {
    pub job_id: String,
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct CommitReport {
    pub committed: bool,
    pub exams: usize,
    pub penalty: u32,
}

/// Snapshots the current roster and queues a solve over it. Later roster
/// edits do not touch the running job.
#[utoipa::path(
        post,
        path = "/v1/schedule/solve",
        request_body = SolveIn,
        responses((status = 200, description = "Job enqueued", body = JobCreated))
    )]
pub async fn solve(
    State(state): State<AppState>,
    Json(input): Json<SolveIn>,
) -> Json<JobCreated> {
    let instance = state.workspace.read().repo.snapshot();
    let id = state.jobs.enqueue(SolveRequest {
        instance,
        params: input.params,
    });
    Json(JobCreated {
        job_id: id.0,
        status: "queued",
    })
}

/// Installs a solved job's schedule as the committed one, replacing any
/// previous schedule wholesale.
#[utoipa::path(
    post,
    path = "/v1/schedule/commit",
    request_body = CommitIn,
    responses(
        (status = 200, description = "Schedule committed", body = CommitReport),
        (status = 400, description = "Job not in a committable state"),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn commit(
    State(state): State<AppState>,
    Json(input): Json<CommitIn>,
) -> Result<Json<CommitReport>, ApiError> {
    let status = state
        .jobs
        .get(&input.job_id)
        .ok_or_else(|| ApiError::not_found(format!("no job {}", input.job_id)))?;
    match status {
        JobStatus::Solved { result } => {
            let exams = result.schedule.len();
            let penalty = result.penalty;
            state.workspace.write().schedule = Some(result.schedule);
            Ok(Json(CommitReport {
                committed: true,
                exams,
                penalty,
            }))
        }
        JobStatus::Infeasible { reason } => Err(ApiError::bad_request(format!(
            "job {} is infeasible: {reason}",
            input.job_id
        ))),
        JobStatus::Failed { message } => Err(ApiError::bad_request(format!(
            "job {} failed: {message}",
            input.job_id
        ))),
        JobStatus::Queued | JobStatus::Running => Err(ApiError::bad_request(format!(
            "job {} has not finished",
            input.job_id
        ))),
    }
}
