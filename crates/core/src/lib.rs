pub mod audit;
pub mod conflict;
pub mod moves;
pub mod repo;
pub mod rooms;

use async_trait::async_trait;
use thiserror::Error;

pub use types::{
    Classroom, Course, CourseCode, Exam, Infeasibility, Instance, RelaxRule, RelaxationConfig,
    RelaxationNote, RelaxationSuggestion, RoomId, Schedule, SlotId, SlotPlan, SolveOutcome,
    SolveParams, SolveRequest, SolveResult, StudentId,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid instance: {0}")]
    Msg(String),
}

pub fn validate(inst: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    if inst.slots.is_empty() {
        errors.push("slots is empty".into());
    }
    for s in &inst.slots {
        if s.day == 0 || s.index == 0 {
            errors.push(format!("slot has out-of-range day or index: {}", s.id()));
        }
    }

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name}: {s}"));
            }
        }
    }
    chk_unique("student", inst.students.iter().map(|x| &x.0), &mut errors);
    chk_unique("course", inst.courses.iter().map(|x| &x.code.0), &mut errors);
    chk_unique(
        "classroom",
        inst.classrooms.iter().map(|x| &x.id.0),
        &mut errors,
    );
    chk_unique("slot", inst.slots.iter().map(|s| s.id()), &mut errors);

    for r in &inst.classrooms {
        if r.capacity == 0 {
            errors.push(format!("classroom {} has capacity 0", r.id.0));
        }
    }

    use std::collections::HashSet;
    let students: HashSet<_> = inst.students.iter().map(|s| &s.0).collect();
    let total_capacity = inst.total_room_capacity();

    for c in &inst.courses {
        for s in &c.students {
            if !students.contains(&s.0) {
                errors.push(format!(
                    "course {} references missing student {}",
                    c.code.0, s.0
                ));
            }
        }
        if c.student_count() > total_capacity {
            errors.push(format!(
                "course {} is unschedulable: {} students exceed total capacity {}",
                c.code.0,
                c.student_count(),
                total_capacity
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

#[async_trait]
pub trait Solver: Send + Sync + 'static {
    async fn solve(&self, req: SolveRequest) -> anyhow::Result<SolveOutcome>;
}
