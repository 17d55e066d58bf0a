//! Rule audit over a committed schedule.
//!
//! Re-runs every pairwise predicate against the live entity data. Useful
//! after roster or capacity edits: the schedule stores ids only, so edits
//! can invalidate it without any move ever being requested.

use serde::Serialize;
use std::collections::BTreeMap;

use types::{CourseCode, Instance, Schedule, StudentId};

use crate::conflict::{
    consecutive_slot_violation, room_occupancy_conflict, same_slot_student_conflict, RosterIndex,
};
use crate::rooms::packed_capacity;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ExamPair {
    pub first: CourseCode,
    pub second: CourseCode,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DailyLoad {
    pub student: StudentId,
    pub day: u32,
    pub exams: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ScheduleAudit {
    pub exams: usize,
    /// Same slot, shared students.
    pub student_conflicts: Vec<ExamPair>,
    /// Same slot, shared rooms.
    pub room_conflicts: Vec<ExamPair>,
    /// Adjacent same-day slots, shared students.
    pub consecutive_pairs: Vec<ExamPair>,
    /// Students with more than two exams on one day.
    pub daily_overages: Vec<DailyLoad>,
    /// Exams whose room capacity no longer covers their roster.
    pub undersized: Vec<CourseCode>,
    /// Exams whose course no longer exists in the live data.
    pub orphaned: Vec<CourseCode>,
}

impl ScheduleAudit {
    /// True when all four placement rules hold.
    pub fn is_clean(&self) -> bool {
        self.student_conflicts.is_empty()
            && self.room_conflicts.is_empty()
            && self.consecutive_pairs.is_empty()
            && self.daily_overages.is_empty()
    }
}

pub fn audit_schedule(instance: &Instance, schedule: &Schedule) -> ScheduleAudit {
    let rosters = RosterIndex::new(&instance.courses);
    let exams: Vec<_> = schedule.all_exams().collect();

    let mut audit = ScheduleAudit {
        exams: exams.len(),
        ..Default::default()
    };

    for (i, a) in exams.iter().enumerate() {
        for b in exams.iter().skip(i + 1) {
            let pair = ExamPair {
                first: a.course.clone(),
                second: b.course.clone(),
            };
            if same_slot_student_conflict(a, b, &rosters) {
                audit.student_conflicts.push(pair.clone());
            }
            if room_occupancy_conflict(a, b) {
                audit.room_conflicts.push(pair.clone());
            }
            if consecutive_slot_violation(a, b, &rosters) {
                audit.consecutive_pairs.push(pair);
            }
        }
    }

    let mut load: BTreeMap<(StudentId, u32), u32> = BTreeMap::new();
    for exam in &exams {
        match rosters.students_of(&exam.course) {
            Some(students) => {
                for student in students {
                    *load.entry((student.clone(), exam.slot.day)).or_insert(0) += 1;
                }
                let needed = students.len() as u32;
                if packed_capacity(&exam.rooms, &instance.classrooms) < needed {
                    audit.undersized.push(exam.course.clone());
                }
            }
            None => audit.orphaned.push(exam.course.clone()),
        }
    }
    for ((student, day), exams) in load {
        if exams > 2 {
            audit.daily_overages.push(DailyLoad {
                student,
                day,
                exams,
            });
        }
    }

    audit
}
