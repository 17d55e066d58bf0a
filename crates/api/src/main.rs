mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod health;
    pub mod jobs;
    pub mod roster;
    pub mod schedule;
    pub mod solve;
    pub mod suggest;
    pub mod validate;
}

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::roster::add_student,
            routes::roster::remove_student,
            routes::roster::add_course,
            routes::roster::remove_course,
            routes::roster::add_classroom,
            routes::roster::update_capacity,
            routes::roster::register,
            routes::roster::unregister,
            routes::roster::set_slots,
            routes::roster::snapshot,
            routes::validate::validate_handler,
            routes::solve::solve,
            routes::solve::commit,
            routes::jobs::status,
            routes::jobs::result,
            routes::schedule::all_assignments,
            routes::schedule::by_course,
            routes::schedule::by_student,
            routes::schedule::request_move_handler,
            routes::schedule::audit,
            routes::suggest::suggest,
        ),
        components(schemas(
            types::Instance, types::Course, types::Classroom, types::Slot,
            types::SlotPlan, types::SlotId, types::Schedule, types::Exam,
            types::SolveParams, types::SolveRequest, types::SolveResult,
            types::RelaxationConfig, types::RelaxationNote, types::RelaxRule,
            types::RelaxationSuggestion, types::Infeasibility,
            types::StudentId, types::CourseCode, types::RoomId,
            jobs::JobId, jobs::JobStatus,
            routes::roster::StudentIn,
            routes::roster::CourseIn,
            routes::roster::ClassroomIn,
            routes::roster::CapacityIn,
            routes::roster::RegistrationIn,
            routes::roster::MutationReport,
            routes::validate::ValidationReport,
            routes::solve::SolveIn,
            routes::solve::JobCreated,
            routes::solve::CommitIn,
            routes::solve::CommitReport,
            routes::schedule::AssignmentRow,
            routes::schedule::MoveIn,
            routes::schedule::MoveStatus,
            routes::schedule::MoveReport
        )),
        tags(
            (name = "examsched", description = "Exam timetabling API")
        )
    )]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let app_state = state::AppState::new_default();

    let app = Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/roster", get(routes::roster::snapshot))
        .route("/v1/roster/students", post(routes::roster::add_student))
        .route(
            "/v1/roster/students/:id",
            delete(routes::roster::remove_student),
        )
        .route("/v1/roster/courses", post(routes::roster::add_course))
        .route(
            "/v1/roster/courses/:code",
            delete(routes::roster::remove_course),
        )
        .route("/v1/roster/classrooms", post(routes::roster::add_classroom))
        .route(
            "/v1/roster/classrooms/:id/capacity",
            put(routes::roster::update_capacity),
        )
        .route(
            "/v1/roster/registrations",
            post(routes::roster::register).delete(routes::roster::unregister),
        )
        .route("/v1/roster/slots", put(routes::roster::set_slots))
        .route("/v1/validate", get(routes::validate::validate_handler))
        .route("/v1/schedule/solve", post(routes::solve::solve))
        .route("/v1/schedule/commit", post(routes::solve::commit))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .route("/v1/schedule", get(routes::schedule::all_assignments))
        .route("/v1/schedule/course/:code", get(routes::schedule::by_course))
        .route(
            "/v1/schedule/by-student/:id",
            get(routes::schedule::by_student),
        )
        .route(
            "/v1/schedule/move",
            post(routes::schedule::request_move_handler),
        )
        .route("/v1/schedule/audit", get(routes::schedule::audit))
        .route("/v1/schedule/suggest", post(routes::suggest::suggest))
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(telemetry::stack())
        .with_state(app_state);

    let port = std::env::var("EXAMSCHED__SERVER__PORT").unwrap_or_else(|_| "8080".into());
    let addr: std::net::SocketAddr = format!("0.0.0.0:{}", port)
        .parse()
        .expect("invalid listen addr");
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
