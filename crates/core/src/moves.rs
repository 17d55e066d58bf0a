//! Incremental validation for manual slot moves.
//!
//! A move re-tests one exam against every other exam already in the
//! schedule; the exam keeps its rooms and only the slot changes. On any
//! failure the schedule is left exactly as it was.

use std::collections::BTreeSet;

use thiserror::Error;
use types::{Course, CourseCode, Exam, RoomId, Schedule, SlotId, StudentId};

use crate::conflict::{
    consecutive_slot_violation, daily_limit_offender, same_slot_student_conflict, RosterIndex,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("no exam is scheduled for course {0}")]
    UnknownExam(CourseCode),
    #[error("{0} is not part of the exam period")]
    InvalidSlot(SlotId),
    #[error("shared students already sit course {0} in that slot")]
    StudentConflict(CourseCode),
    #[error("room {room} is already booked by course {course} in that slot")]
    RoomConflict { room: RoomId, course: CourseCode },
    #[error("shared students sit course {0} in an adjacent slot that day")]
    ConsecutiveViolation(CourseCode),
    #[error("student {0} would have more than two exams that day")]
    MaxTwoViolation(StudentId),
}

/// Checks moving `course` to `new_slot`, rule by rule: slot existence,
/// student overlap, room overlap, consecutive spacing, daily limit. The
/// first failing rule wins; each rule scans all other exams before the next
/// rule runs.
pub fn validate_move(
    schedule: &Schedule,
    rosters: &RosterIndex<'_>,
    known_slots: &BTreeSet<SlotId>,
    course: &CourseCode,
    new_slot: SlotId,
) -> Result<(), MoveError> {
    let moving = schedule
        .exam_by_course(course)
        .ok_or_else(|| MoveError::UnknownExam(course.clone()))?;
    if !known_slots.contains(&new_slot) {
        return Err(MoveError::InvalidSlot(new_slot));
    }

    let candidate = Exam {
        course: moving.course.clone(),
        slot: new_slot,
        // a manual move never reassigns rooms
        rooms: moving.rooms.clone(),
    };

    for other in schedule.all_exams() {
        if other.course == candidate.course {
            continue;
        }
        if same_slot_student_conflict(&candidate, other, rosters) {
            return Err(MoveError::StudentConflict(other.course.clone()));
        }
    }

    for other in schedule.all_exams() {
        if other.course == candidate.course || other.slot != new_slot {
            continue;
        }
        if let Some(room) = candidate.rooms.iter().find(|r| other.rooms.contains(r)) {
            return Err(MoveError::RoomConflict {
                room: room.clone(),
                course: other.course.clone(),
            });
        }
    }

    for other in schedule.all_exams() {
        if other.course == candidate.course {
            continue;
        }
        if consecutive_slot_violation(&candidate, other, rosters) {
            return Err(MoveError::ConsecutiveViolation(other.course.clone()));
        }
    }

    if let Some(student) = daily_limit_offender(&candidate, schedule, rosters) {
        return Err(MoveError::MaxTwoViolation(student));
    }

    Ok(())
}

/// Validates and applies a move, returning the vacated slot.
pub fn request_move<'a, I>(
    schedule: &mut Schedule,
    courses: I,
    known_slots: &BTreeSet<SlotId>,
    course: &CourseCode,
    new_slot: SlotId,
) -> Result<SlotId, MoveError>
where
    I: IntoIterator<Item = &'a Course>,
{
    let rosters = RosterIndex::new(courses);
    validate_move(schedule, &rosters, known_slots, course, new_slot)?;
    match schedule.exam_by_course_mut(course) {
        Some(exam) => {
            let vacated = exam.slot;
            exam.slot = new_slot;
            tracing::info!(%course, from = %vacated, to = %new_slot, "exam moved");
            Ok(vacated)
        }
        None => Err(MoveError::UnknownExam(course.clone())),
    }
}
