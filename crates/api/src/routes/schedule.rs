use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use exam_core::audit::audit_schedule;
use exam_core::moves::{request_move, MoveError};
use types::{CourseCode, Exam, RoomId, SlotId};

use crate::state::{AppState, Workspace};

/// One scheduled exam as the presentation layer reads it: slot identity,
/// the live time-range label, and the live roster size.
#[derive(serde::Serialize, ToSchema)]
pub struct AssignmentRow {
    pub course: CourseCode,
    pub day: u32,
    pub index: u32,
    /// Resolved against the current slot grid; absent when the plan changed
    /// after the schedule was committed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<String>,
    pub rooms: Vec<RoomId>,
    pub students: u32,
}

fn row(ws: &Workspace, exam: &Exam) -> AssignmentRow {
    AssignmentRow {
        course: exam.course.clone(),
        day: exam.slot.day,
        index: exam.slot.index,
        time_range: ws.repo.find_slot(exam.slot).map(|s| s.time_range.clone()),
        rooms: exam.rooms.clone(),
        students: ws
            .repo
            .course(&exam.course)
            .map(|c| c.student_count())
            .unwrap_or(0),
    }
}

#[utoipa::path(
    get,
    path = "/v1/schedule",
    responses((status = 200, description = "Committed schedule, one row per exam in course order"))
)]
pub async fn all_assignments(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ws = state.workspace.read();
    Json(match &ws.schedule {
        None => serde_json::json!({"status": "no_schedule"}),
        Some(schedule) => {
            let rows: Vec<AssignmentRow> = schedule.all_exams().map(|e| row(&ws, e)).collect();
            serde_json::to_value(rows).unwrap()
        }
    })
}

#[utoipa::path(
    get,
    path = "/v1/schedule/course/{code}",
    params(("code" = String, Path, description = "Course code")),
    responses((status = 200, description = "The course's exam, if scheduled", body = AssignmentRow))
)]
pub async fn by_course(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Json<serde_json::Value> {
    let ws = state.workspace.read();
    Json(match &ws.schedule {
        None => serde_json::json!({"status": "no_schedule"}),
        Some(schedule) => match schedule.exam_by_course(&code.into()) {
            Some(exam) => serde_json::to_value(row(&ws, exam)).unwrap(),
            None => serde_json::json!({"status": "not_scheduled"}),
        },
    })
}

#[utoipa::path(
    get,
    path = "/v1/schedule/by-student/{id}",
    params(("id" = String, Path, description = "Student id")),
    responses((status = 200, description = "The student's exams, day then slot order"))
)]
pub async fn by_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let ws = state.workspace.read();
    Json(match &ws.schedule {
        None => serde_json::json!({"status": "no_schedule"}),
        Some(schedule) => {
            let student = id.into();
            let mut rows: Vec<AssignmentRow> = ws
                .repo
                .courses_of_student(&student)
                .into_iter()
                .filter_map(|c| schedule.exam_by_course(&c.code))
                .map(|e| row(&ws, e))
                .collect();
            rows.sort_by_key(|r| (r.day, r.index));
            serde_json::to_value(rows).unwrap()
        }
    })
}

#[derive(Deserialize, ToSchema)]
pub struct MoveIn {
    pub course: String,
    pub day: u32,
    pub index: u32,
}

#[derive(serde::Serialize, ToSchema, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    Ok,
    NoSchedule,
    UnknownExam,
    InvalidSlot,
    StudentConflict,
    RoomConflict,
    ConsecutiveViolation,
    MaxTwoViolation,
}

impl From<&MoveError> for MoveStatus {
    fn from(err: &MoveError) -> Self {
        match err {
            MoveError::UnknownExam(_) => MoveStatus::UnknownExam,
            MoveError::InvalidSlot(_) => MoveStatus::InvalidSlot,
            MoveError::StudentConflict(_) => MoveStatus::StudentConflict,
            MoveError::RoomConflict { .. } => MoveStatus::RoomConflict,
            MoveError::ConsecutiveViolation(_) => MoveStatus::ConsecutiveViolation,
            MoveError::MaxTwoViolation(_) => MoveStatus::MaxTwoViolation,
        }
    }
}

#[derive(serde::Serialize, ToSchema)]
pub struct MoveReport {
    pub status: MoveStatus,
    /// Human-readable conflict reason on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The slot the exam left, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacated: Option<SlotId>,
}

/// Single-exam slot move. The exam keeps its rooms; on any conflict the
/// schedule stays untouched and the offending rule is reported.
#[utoipa::path(
    post,
    path = "/v1/schedule/move",
    request_body = MoveIn,
    responses((status = 200, description = "Move outcome", body = MoveReport))
)]
pub async fn request_move_handler(
    State(state): State<AppState>,
    Json(input): Json<MoveIn>,
) -> Json<MoveReport> {
    let target = SlotId::new(input.day, input.index);
    let mut guard = state.workspace.write();
    let Workspace { repo, schedule } = &mut *guard;
    Json(match schedule.as_mut() {
        None => MoveReport {
            status: MoveStatus::NoSchedule,
            detail: Some("no schedule has been committed".into()),
            vacated: None,
        },
        Some(sched) => {
            let known = repo.slot_ids();
            match request_move(sched, repo.courses(), &known, &input.course.into(), target) {
                Ok(vacated) => MoveReport {
                    status: MoveStatus::Ok,
                    detail: None,
                    vacated: Some(vacated),
                },
                Err(err) => MoveReport {
                    status: (&err).into(),
                    detail: Some(err.to_string()),
                    vacated: None,
                },
            }
        }
    })
}

#[utoipa::path(
    get,
    path = "/v1/schedule/audit",
    responses((status = 200, description = "Rule audit of the committed schedule against live data"))
)]
pub async fn audit(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ws = state.workspace.read();
    Json(match &ws.schedule {
        None => serde_json::json!({"status": "no_schedule"}),
        Some(schedule) => {
            let instance = ws.repo.snapshot();
            serde_json::to_value(audit_schedule(&instance, schedule)).unwrap()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Classroom, Schedule, SlotPlan};

    fn exam(course: &str, day: u32, index: u32, rooms: &[&str]) -> Exam {
        Exam {
            course: course.into(),
            slot: SlotId::new(day, index),
            rooms: rooms.iter().map(|r| (*r).into()).collect(),
        }
    }

    /// Two committed exams: MATH{s1,s2} at (1,1) in R1, PHYS{s2} at (2,1)
    /// in R2, over a 2x2 grid.
    fn seeded() -> AppState {
        let state = AppState::new_default();
        {
            let mut ws = state.workspace.write();
            for s in ["s1", "s2"] {
                ws.repo.add_student(s.into()).unwrap();
            }
            ws.repo.register(&"s1".into(), &"MATH".into()).unwrap();
            ws.repo.register(&"s2".into(), &"MATH".into()).unwrap();
            ws.repo.register(&"s2".into(), &"PHYS".into()).unwrap();
            ws.repo.add_classroom(Classroom::new("R1", 10)).unwrap();
            ws.repo.add_classroom(Classroom::new("R2", 10)).unwrap();
            ws.repo
                .set_slot_plan(&SlotPlan {
                    num_days: 2,
                    time_ranges: vec!["09:00-11:00".into(), "13:00-15:00".into()],
                })
                .unwrap();
            let mut schedule = Schedule::new();
            schedule.add_exam(exam("MATH", 1, 1, &["R1"]));
            schedule.add_exam(exam("PHYS", 2, 1, &["R2"]));
            ws.schedule = Some(schedule);
        }
        state
    }

    #[tokio::test]
    async fn assignment_rows_carry_live_labels() {
        let state = seeded();
        let out = all_assignments(State(state)).await;
        let rows = out.0.as_array().expect("rows").clone();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["course"], "MATH");
        assert_eq!(rows[0]["time_range"], "09:00-11:00");
        assert_eq!(rows[0]["students"], 2);
        assert_eq!(rows[1]["course"], "PHYS");
    }

    #[tokio::test]
    async fn by_student_is_sorted_by_day_then_index() {
        let state = seeded();
        let out = by_student(State(state), Path("s2".into())).await;
        let rows = out.0.as_array().expect("rows").clone();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["course"], "MATH");
        assert_eq!(rows[0]["day"], 1);
        assert_eq!(rows[1]["course"], "PHYS");
        assert_eq!(rows[1]["day"], 2);
    }

    #[tokio::test]
    async fn legal_move_mutates_and_reports_the_vacated_slot() {
        let state = seeded();
        let out = request_move_handler(
            State(state.clone()),
            Json(MoveIn {
                course: "PHYS".into(),
                day: 2,
                index: 2,
            }),
        )
        .await;
        assert_eq!(out.0.status, MoveStatus::Ok);
        assert_eq!(out.0.vacated, Some(SlotId::new(2, 1)));
        let ws = state.workspace.read();
        let moved = ws
            .schedule
            .as_ref()
            .unwrap()
            .exam_by_course(&"PHYS".into())
            .unwrap();
        assert_eq!(moved.slot, SlotId::new(2, 2));
    }

    #[tokio::test]
    async fn conflicting_move_reports_and_leaves_the_schedule_alone() {
        let state = seeded();
        // s2 sits both courses; same target slot is a student conflict
        let out = request_move_handler(
            State(state.clone()),
            Json(MoveIn {
                course: "PHYS".into(),
                day: 1,
                index: 1,
            }),
        )
        .await;
        assert_eq!(out.0.status, MoveStatus::StudentConflict);
        assert!(out.0.detail.unwrap().contains("MATH"));
        let ws = state.workspace.read();
        let unmoved = ws
            .schedule
            .as_ref()
            .unwrap()
            .exam_by_course(&"PHYS".into())
            .unwrap();
        assert_eq!(unmoved.slot, SlotId::new(2, 1));
    }

    #[tokio::test]
    async fn moves_to_slots_outside_the_grid_are_invalid() {
        let state = seeded();
        let out = request_move_handler(
            State(state),
            Json(MoveIn {
                course: "PHYS".into(),
                day: 9,
                index: 1,
            }),
        )
        .await;
        assert_eq!(out.0.status, MoveStatus::InvalidSlot);
    }

    #[tokio::test]
    async fn everything_reports_no_schedule_before_a_commit() {
        let state = AppState::new_default();
        let all = all_assignments(State(state.clone())).await;
        assert_eq!(all.0["status"], "no_schedule");
        let mv = request_move_handler(
            State(state.clone()),
            Json(MoveIn {
                course: "MATH".into(),
                day: 1,
                index: 1,
            }),
        )
        .await;
        assert_eq!(mv.0.status, MoveStatus::NoSchedule);
        let audit_out = audit(State(state)).await;
        assert_eq!(audit_out.0["status"], "no_schedule");
    }

    #[tokio::test]
    async fn audit_sees_roster_edits_after_commit() {
        let state = seeded();
        {
            let audit_out = audit(State(state.clone())).await;
            assert_eq!(audit_out.0["exams"], 2);
            assert_eq!(audit_out.0["student_conflicts"].as_array().unwrap().len(), 0);
        }
        // shrink R1 after the commit: MATH's roster no longer fits
        {
            let mut ws = state.workspace.write();
            ws.repo.update_capacity(&"R1".into(), 1).unwrap();
        }
        let audit_out = audit(State(state)).await;
        let undersized = audit_out.0["undersized"].as_array().unwrap().clone();
        assert_eq!(undersized.len(), 1);
        assert_eq!(undersized[0], "MATH");
    }
}
