//! In-memory entity store behind the service.
//!
//! Mutations return typed failures and never leave the store half-changed.
//! All collections are ordered, so snapshots and everything downstream of
//! them iterate the same way on every run.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use types::{Classroom, Course, CourseCode, Instance, RoomId, Slot, SlotId, SlotPlan, StudentId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("id must not be empty")]
    EmptyId,
    #[error("student {0} already exists")]
    StudentExists(StudentId),
    #[error("student {0} not found")]
    StudentNotFound(StudentId),
    #[error("course {0} already exists")]
    CourseExists(CourseCode),
    #[error("course {0} not found")]
    CourseNotFound(CourseCode),
    #[error("classroom {0} already exists")]
    ClassroomExists(RoomId),
    #[error("classroom {0} not found")]
    ClassroomNotFound(RoomId),
    #[error("student {student} is already registered for course {course}")]
    AlreadyRegistered {
        student: StudentId,
        course: CourseCode,
    },
    #[error("student {student} is not registered for course {course}")]
    NotRegistered {
        student: StudentId,
        course: CourseCode,
    },
    #[error("capacity must be positive")]
    InvalidCapacity,
    #[error("slot plan needs at least one day and one time range")]
    EmptySlotPlan,
}

#[derive(Debug, Default, Clone)]
pub struct Repository {
    students: BTreeSet<StudentId>,
    courses: BTreeMap<CourseCode, Course>,
    classrooms: BTreeMap<RoomId, Classroom>,
    slots: Vec<Slot>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_student(&mut self, id: StudentId) -> Result<(), MutationError> {
        if id.0.trim().is_empty() {
            return Err(MutationError::EmptyId);
        }
        if !self.students.insert(id.clone()) {
            return Err(MutationError::StudentExists(id));
        }
        Ok(())
    }

    /// Removes the student and purges the id from every roster, so no course
    /// keeps counting a student who left.
    pub fn remove_student(&mut self, id: &StudentId) -> Result<(), MutationError> {
        if !self.students.remove(id) {
            return Err(MutationError::StudentNotFound(id.clone()));
        }
        for course in self.courses.values_mut() {
            course.students.remove(id);
        }
        Ok(())
    }

    pub fn add_course(&mut self, code: CourseCode) -> Result<(), MutationError> {
        if code.0.trim().is_empty() {
            return Err(MutationError::EmptyId);
        }
        if self.courses.contains_key(&code) {
            return Err(MutationError::CourseExists(code));
        }
        self.courses.insert(code.clone(), Course::new(code));
        Ok(())
    }

    pub fn remove_course(&mut self, code: &CourseCode) -> Result<(), MutationError> {
        self.courses
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| MutationError::CourseNotFound(code.clone()))
    }

    pub fn add_classroom(&mut self, room: Classroom) -> Result<(), MutationError> {
        if room.id.0.trim().is_empty() {
            return Err(MutationError::EmptyId);
        }
        if room.capacity == 0 {
            return Err(MutationError::InvalidCapacity);
        }
        if self.classrooms.contains_key(&room.id) {
            return Err(MutationError::ClassroomExists(room.id));
        }
        self.classrooms.insert(room.id.clone(), room);
        Ok(())
    }

    /// Updates a room in place. Zero and negative capacities are rejected,
    /// the wire type already rules out negatives.
    pub fn update_capacity(&mut self, id: &RoomId, capacity: u32) -> Result<(), MutationError> {
        if capacity == 0 {
            return Err(MutationError::InvalidCapacity);
        }
        match self.classrooms.get_mut(id) {
            Some(room) => {
                room.capacity = capacity;
                Ok(())
            }
            None => Err(MutationError::ClassroomNotFound(id.clone())),
        }
    }

    /// Registers a student for a course. The student must already exist; the
    /// course is created on demand so attendance lists can be imported in
    /// one pass.
    pub fn register(
        &mut self,
        student: &StudentId,
        course: &CourseCode,
    ) -> Result<(), MutationError> {
        if !self.students.contains(student) {
            return Err(MutationError::StudentNotFound(student.clone()));
        }
        if course.0.trim().is_empty() {
            return Err(MutationError::EmptyId);
        }
        let entry = self
            .courses
            .entry(course.clone())
            .or_insert_with(|| Course::new(course.clone()));
        if !entry.students.insert(student.clone()) {
            return Err(MutationError::AlreadyRegistered {
                student: student.clone(),
                course: course.clone(),
            });
        }
        Ok(())
    }

    pub fn unregister(
        &mut self,
        student: &StudentId,
        course: &CourseCode,
    ) -> Result<(), MutationError> {
        let entry = self
            .courses
            .get_mut(course)
            .ok_or_else(|| MutationError::CourseNotFound(course.clone()))?;
        if entry.students.remove(student) {
            Ok(())
        } else {
            Err(MutationError::NotRegistered {
                student: student.clone(),
                course: course.clone(),
            })
        }
    }

    /// Replaces the slot grid with the plan's Cartesian product.
    pub fn set_slot_plan(&mut self, plan: &SlotPlan) -> Result<(), MutationError> {
        if plan.is_empty() {
            return Err(MutationError::EmptySlotPlan);
        }
        self.slots = plan.slots();
        Ok(())
    }

    pub fn students(&self) -> impl Iterator<Item = &StudentId> {
        self.students.iter()
    }

    pub fn course(&self, code: &CourseCode) -> Option<&Course> {
        self.courses.get(code)
    }

    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    pub fn classroom(&self, id: &RoomId) -> Option<&Classroom> {
        self.classrooms.get(id)
    }

    pub fn classrooms(&self) -> impl Iterator<Item = &Classroom> {
        self.classrooms.values()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot_ids(&self) -> BTreeSet<SlotId> {
        self.slots.iter().map(Slot::id).collect()
    }

    pub fn find_slot(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id() == id)
    }

    /// Courses the student is registered for, in course-code order.
    pub fn courses_of_student(&self, student: &StudentId) -> Vec<&Course> {
        self.courses
            .values()
            .filter(|c| c.students.contains(student))
            .collect()
    }

    /// Whether two courses share at least one student. Unknown codes never
    /// conflict.
    pub fn courses_conflict(&self, a: &CourseCode, b: &CourseCode) -> bool {
        match (self.courses.get(a), self.courses.get(b)) {
            (Some(ca), Some(cb)) => ca.shares_students(cb),
            _ => false,
        }
    }

    /// Deep snapshot handed to a solve run. Everything arrives sorted, so a
    /// job sees a stable view regardless of later edits.
    pub fn snapshot(&self) -> Instance {
        Instance {
            students: self.students.iter().cloned().collect(),
            courses: self.courses.values().cloned().collect(),
            classrooms: self.classrooms.values().cloned().collect(),
            slots: self.slots.clone(),
        }
    }
}
