use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
            PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}
id_newtype!(StudentId);
id_newtype!(CourseCode);
id_newtype!(RoomId);

/// Identity of an exam slot. Two slots are the same slot iff day and index
/// match; the display time range is not part of identity.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
pub struct SlotId {
    pub day: u32,
    pub index: u32,
}

impl SlotId {
    pub fn new(day: u32, index: u32) -> Self {
        Self { day, index }
    }

    pub fn adjacent_to(&self, other: &SlotId) -> bool {
        self.day == other.day && self.index.abs_diff(other.index) == 1
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}, Slot {}", self.day, self.index)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Slot {
    pub day: u32,
    pub index: u32,
    /// Display only, e.g. "09:00-11:00". Never consulted by conflict logic.
    pub time_range: String,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        SlotId {
            day: self.day,
            index: self.index,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id(), self.time_range)
    }
}

/// Exam period configuration: `num_days` days, each with the same ordered
/// list of time ranges.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SlotPlan {
    pub num_days: u32,
    pub time_ranges: Vec<String>,
}

impl SlotPlan {
    /// Exhaustive slot grid `{1..num_days} x {1..len(time_ranges)}`, slot
    /// index assigned 1-based by position in the time-range list.
    pub fn slots(&self) -> Vec<Slot> {
        let mut out = Vec::with_capacity(self.num_days as usize * self.time_ranges.len());
        for day in 1..=self.num_days {
            for (i, range) in self.time_ranges.iter().enumerate() {
                out.push(Slot {
                    day,
                    index: i as u32 + 1,
                    time_range: range.clone(),
                });
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.num_days == 0 || self.time_ranges.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Classroom {
    pub id: RoomId,
    pub capacity: u32,
}

impl Classroom {
    pub fn new(id: impl Into<RoomId>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            capacity,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Course {
    pub code: CourseCode,
    /// Sorted so every iteration over a roster is deterministic.
    #[serde(default)]
    pub students: BTreeSet<StudentId>,
}

impl Course {
    pub fn new(code: impl Into<CourseCode>) -> Self {
        Self {
            code: code.into(),
            students: BTreeSet::new(),
        }
    }

    pub fn with_students<I, S>(mut self, students: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StudentId>,
    {
        self.students = students.into_iter().map(Into::into).collect();
        self
    }

    /// Always derived from the roster, never cached.
    pub fn student_count(&self) -> u32 {
        self.students.len() as u32
    }

    pub fn shares_students(&self, other: &Course) -> bool {
        let (small, large) = if self.students.len() <= other.students.len() {
            (&self.students, &other.students)
        } else {
            (&other.students, &self.students)
        };
        small.iter().any(|s| large.contains(s))
    }
}

/// A placed exam. Entities are referenced by id so edits on the live
/// roster/classroom data stay visible to an already-built schedule.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
pub struct Exam {
    pub course: CourseCode,
    pub slot: SlotId,
    pub rooms: Vec<RoomId>,
}

/// The schedule container: exactly one exam per scheduled course, keyed by
/// course code. Rebuilt wholesale by every solve run; mutated in place only
/// by single-exam slot moves.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
pub struct Schedule {
    exams: BTreeMap<CourseCode, Exam>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the exam under its course code, replacing any previous exam
    /// for that course.
    pub fn add_exam(&mut self, exam: Exam) {
        self.exams.insert(exam.course.clone(), exam);
    }

    pub fn exam_by_course(&self, course: &CourseCode) -> Option<&Exam> {
        self.exams.get(course)
    }

    pub fn exam_by_course_mut(&mut self, course: &CourseCode) -> Option<&mut Exam> {
        self.exams.get_mut(course)
    }

    /// All exams in course-code order.
    pub fn all_exams(&self) -> impl Iterator<Item = &Exam> {
        self.exams.values()
    }

    pub fn len(&self) -> usize {
        self.exams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }
}

/// Snapshot of the entity graph handed to a solve run.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct Instance {
    #[serde(default)]
    pub students: Vec<StudentId>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub classrooms: Vec<Classroom>,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl Instance {
    pub fn slot_ids(&self) -> BTreeSet<SlotId> {
        self.slots.iter().map(Slot::id).collect()
    }

    pub fn total_room_capacity(&self) -> u32 {
        self.classrooms.iter().map(|c| c.capacity).sum()
    }
}

/// The two spacing rules that may be suppressed when the strict problem is
/// infeasible. Student and room double-booking are never relaxable.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
    PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum RelaxRule {
    ConsecutiveSlots,
    ThreePerDay,
}

impl RelaxRule {
    pub const ALL: [RelaxRule; 2] = [RelaxRule::ConsecutiveSlots, RelaxRule::ThreePerDay];

    /// Penalty charged per placement that needed this rule suppressed.
    pub fn weight(self) -> u32 {
        match self {
            RelaxRule::ConsecutiveSlots => 50,
            RelaxRule::ThreePerDay => 100,
        }
    }

    pub fn explanation(self) -> &'static str {
        match self {
            RelaxRule::ConsecutiveSlots => "Allow students to take exams in consecutive slots.",
            RelaxRule::ThreePerDay => "Allow students to have more than two exams per day.",
        }
    }
}

/// Immutable per-attempt configuration. Each scheduling attempt receives its
/// own copy; nothing here is ever shared mutable state between attempts.
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq,
)]
pub struct RelaxationConfig {
    #[serde(default)]
    pub allow_consecutive_slots: bool,
    #[serde(default)]
    pub allow_three_per_day: bool,
}

impl RelaxationConfig {
    pub const STRICT: RelaxationConfig = RelaxationConfig {
        allow_consecutive_slots: false,
        allow_three_per_day: false,
    };

    /// All four variants, least relaxed first. Penalty ties between variants
    /// resolve to the earliest entry.
    pub const VARIANTS: [RelaxationConfig; 4] = [
        RelaxationConfig {
            allow_consecutive_slots: false,
            allow_three_per_day: false,
        },
        RelaxationConfig {
            allow_consecutive_slots: true,
            allow_three_per_day: false,
        },
        RelaxationConfig {
            allow_consecutive_slots: false,
            allow_three_per_day: true,
        },
        RelaxationConfig {
            allow_consecutive_slots: true,
            allow_three_per_day: true,
        },
    ];

    pub fn only(rule: RelaxRule) -> Self {
        match rule {
            RelaxRule::ConsecutiveSlots => Self {
                allow_consecutive_slots: true,
                allow_three_per_day: false,
            },
            RelaxRule::ThreePerDay => Self {
                allow_consecutive_slots: false,
                allow_three_per_day: true,
            },
        }
    }

    pub fn allows(self, rule: RelaxRule) -> bool {
        match rule {
            RelaxRule::ConsecutiveSlots => self.allow_consecutive_slots,
            RelaxRule::ThreePerDay => self.allow_three_per_day,
        }
    }

    pub fn label(self) -> &'static str {
        match (self.allow_consecutive_slots, self.allow_three_per_day) {
            (false, false) => "strict",
            (true, false) => "allow_consecutive_slots",
            (false, true) => "allow_three_per_day",
            (true, true) => "both_relaxed",
        }
    }
}

/// One placement that only succeeded because a rule was suppressed.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
pub struct RelaxationNote {
    pub rule: RelaxRule,
    pub course: CourseCode,
}

impl fmt::Display for RelaxationNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.course, self.rule.explanation())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveParams {
    /// Retry with relaxation variants when the strict pass is infeasible.
    #[serde(default = "default_auto_relax")]
    pub auto_relax: bool,
}

fn default_auto_relax() -> bool {
    true
}

impl Default for SolveParams {
    fn default() -> Self {
        Self { auto_relax: true }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveRequest {
    pub instance: Instance,
    #[serde(default)]
    pub params: SolveParams,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
pub struct SolveResult {
    pub schedule: Schedule,
    pub penalty: u32,
    #[serde(default)]
    pub relaxations: Vec<RelaxationNote>,
    #[serde(default)]
    pub stats: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Infeasibility {
    /// Enrollment exceeds the total classroom pool; no slot can help.
    InsufficientCapacity {
        course: CourseCode,
        enrolled: u32,
        total_capacity: u32,
    },
    /// The strict pass found no conflict-free slot for the course.
    NoFeasibleSlot { course: CourseCode },
    /// Every relaxation variant failed.
    NoFeasibleSchedule,
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::InsufficientCapacity { course, .. } => {
                write!(f, "insufficient room capacity for course {course}")
            }
            Infeasibility::NoFeasibleSlot { course } => {
                write!(f, "no feasible slot for course {course}")
            }
            Infeasibility::NoFeasibleSchedule => write!(f, "no feasible schedule"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveOutcome {
    Solved { result: SolveResult },
    Infeasible { reason: Infeasibility },
}

impl SolveOutcome {
    pub fn result(&self) -> Option<&SolveResult> {
        match self {
            SolveOutcome::Solved { result } => Some(result),
            SolveOutcome::Infeasible { .. } => None,
        }
    }
}

/// A rule whose suppression alone makes the instance schedulable.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
pub struct RelaxationSuggestion {
    pub rule: RelaxRule,
    pub explanation: String,
    pub penalty: u32,
}
