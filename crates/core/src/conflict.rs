//! Pairwise conflict predicates between exams.
//!
//! Exams carry ids only, so every predicate that needs student data takes a
//! [`RosterIndex`] resolving course codes against the live rosters. The same
//! predicates back schedule construction, manual move validation and audits.

use std::collections::{BTreeMap, BTreeSet};

use types::{Course, CourseCode, Exam, Schedule, StudentId};

/// Course-code -> roster lookup, built once per pass over borrowed courses.
pub struct RosterIndex<'a> {
    rosters: BTreeMap<&'a str, &'a BTreeSet<StudentId>>,
}

impl<'a> RosterIndex<'a> {
    pub fn new<I>(courses: I) -> Self
    where
        I: IntoIterator<Item = &'a Course>,
    {
        Self {
            rosters: courses
                .into_iter()
                .map(|c| (c.code.0.as_str(), &c.students))
                .collect(),
        }
    }

    pub fn students_of(&self, course: &CourseCode) -> Option<&'a BTreeSet<StudentId>> {
        self.rosters.get(course.0.as_str()).copied()
    }

    /// Whether the two courses share at least one student. Codes without a
    /// roster never overlap.
    pub fn courses_overlap(&self, a: &CourseCode, b: &CourseCode) -> bool {
        match (self.students_of(a), self.students_of(b)) {
            (Some(sa), Some(sb)) => students_overlap(sa, sb),
            _ => false,
        }
    }
}

pub fn students_overlap(a: &BTreeSet<StudentId>, b: &BTreeSet<StudentId>) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|s| large.contains(s))
}

/// Same slot and at least one shared student.
pub fn same_slot_student_conflict(a: &Exam, b: &Exam, rosters: &RosterIndex<'_>) -> bool {
    a.slot == b.slot && rosters.courses_overlap(&a.course, &b.course)
}

/// Same slot and at least one shared room.
pub fn room_occupancy_conflict(a: &Exam, b: &Exam) -> bool {
    a.slot == b.slot && a.rooms.iter().any(|r| b.rooms.contains(r))
}

/// Shared students sitting in adjacent slots of the same day. The last slot
/// of one day and the first of the next are never adjacent.
pub fn consecutive_slot_violation(a: &Exam, b: &Exam, rosters: &RosterIndex<'_>) -> bool {
    a.slot.adjacent_to(&b.slot) && rosters.courses_overlap(&a.course, &b.course)
}

/// First student of the candidate's roster who already sits two exams on the
/// candidate's day, i.e. would be pushed to a third. Exams of the candidate's
/// own course are skipped so an already-scheduled exam can be re-tested
/// against the rest of the schedule.
pub fn daily_limit_offender(
    candidate: &Exam,
    schedule: &Schedule,
    rosters: &RosterIndex<'_>,
) -> Option<StudentId> {
    let students = rosters.students_of(&candidate.course)?;
    for student in students {
        let mut count = 0;
        for exam in schedule.all_exams() {
            if exam.course == candidate.course || exam.slot.day != candidate.slot.day {
                continue;
            }
            let enrolled = rosters
                .students_of(&exam.course)
                .map_or(false, |s| s.contains(student));
            if enrolled {
                count += 1;
                if count >= 2 {
                    return Some(student.clone());
                }
            }
        }
    }
    None
}

/// Whether placing the candidate would give one of its students a third exam
/// on that day.
pub fn exceeds_daily_limit(
    candidate: &Exam,
    schedule: &Schedule,
    rosters: &RosterIndex<'_>,
) -> bool {
    daily_limit_offender(candidate, schedule, rosters).is_some()
}
