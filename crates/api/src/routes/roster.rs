use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use exam_core::repo::MutationError;
use types::{Classroom, Instance, SlotPlan};

use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct StudentIn {
    pub id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CourseIn {
    pub code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ClassroomIn {
    pub id: String,
    pub capacity: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct CapacityIn {
    pub capacity: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct RegistrationIn {
    pub student: String,
    pub course: String,
}

/// Outcome of a single roster mutation. Domain refusals (duplicate id,
/// not-found, zero capacity) come back as `ok: false` with the reason, not
/// as HTTP errors.
#[derive(serde::Serialize, ToSchema)]
pub struct MutationReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), MutationError>> for MutationReport {
    fn from(res: Result<(), MutationError>) -> Self {
        match res {
            Ok(()) => MutationReport {
                ok: true,
                error: None,
            },
            Err(e) => MutationReport {
                ok: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/roster/students",
    request_body = StudentIn,
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn add_student(
    State(state): State<AppState>,
    Json(input): Json<StudentIn>,
) -> Json<MutationReport> {
    let res = state.workspace.write().repo.add_student(input.id.into());
    Json(res.into())
}

#[utoipa::path(
    delete,
    path = "/v1/roster/students/{id}",
    params(("id" = String, Path, description = "Student id")),
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn remove_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<MutationReport> {
    let res = state.workspace.write().repo.remove_student(&id.into());
    Json(res.into())
}

#[utoipa::path(
    post,
    path = "/v1/roster/courses",
    request_body = CourseIn,
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn add_course(
    State(state): State<AppState>,
    Json(input): Json<CourseIn>,
) -> Json<MutationReport> {
    let res = state.workspace.write().repo.add_course(input.code.into());
    Json(res.into())
}

#[utoipa::path(
    delete,
    path = "/v1/roster/courses/{code}",
    params(("code" = String, Path, description = "Course code")),
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn remove_course(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<MutationReport> {
    let res = state.workspace.write().repo.remove_course(&code.into());
    Json(res.into())
}

#[utoipa::path(
    post,
    path = "/v1/roster/classrooms",
    request_body = ClassroomIn,
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn add_classroom(
    State(state): State<AppState>,
    Json(input): Json<ClassroomIn>,
) -> Json<MutationReport> {
    let res = state
        .workspace
        .write()
        .repo
        .add_classroom(Classroom::new(input.id, input.capacity));
    Json(res.into())
}

#[utoipa::path(
    put,
    path = "/v1/roster/classrooms/{id}/capacity",
    params(("id" = String, Path, description = "Classroom id")),
    request_body = CapacityIn,
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn update_capacity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CapacityIn>,
) -> Json<MutationReport> {
    let res = state
        .workspace
        .write()
        .repo
        .update_capacity(&id.into(), input.capacity);
    Json(res.into())
}

#[utoipa::path(
    post,
    path = "/v1/roster/registrations",
    request_body = RegistrationIn,
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegistrationIn>,
) -> Json<MutationReport> {
    let res = state
        .workspace
        .write()
        .repo
        .register(&input.student.into(), &input.course.into());
    Json(res.into())
}

#[utoipa::path(
    delete,
    path = "/v1/roster/registrations",
    request_body = RegistrationIn,
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn unregister(
    State(state): State<AppState>,
    Json(input): Json<RegistrationIn>,
) -> Json<MutationReport> {
    let res = state
        .workspace
        .write()
        .repo
        .unregister(&input.student.into(), &input.course.into());
    Json(res.into())
}

#[utoipa::path(
    put,
    path = "/v1/roster/slots",
    request_body = SlotPlan,
    responses((status = 200, description = "Mutation outcome", body = MutationReport))
)]
pub async fn set_slots(
    State(state): State<AppState>,
    Json(plan): Json<SlotPlan>,
) -> Json<MutationReport> {
    let res = state.workspace.write().repo.set_slot_plan(&plan);
    Json(res.into())
}

#[utoipa::path(
    get,
    path = "/v1/roster",
    responses((status = 200, description = "Current entity snapshot", body = Instance))
)]
pub async fn snapshot(State(state): State<AppState>) -> Json<Instance> {
    Json(state.workspace.read().repo.snapshot())
}
