//! Greedy exam placement with relaxation retry.
//!
//! One attempt walks the courses largest-first and drops each into the
//! earliest slot that passes every active rule. The solver runs the four
//! relaxation variants as independent attempts, each on its own blocking
//! task with its own schedule, and keeps the lowest-penalty success.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use exam_core::conflict::{
    consecutive_slot_violation, exceeds_daily_limit, room_occupancy_conflict,
    same_slot_student_conflict, RosterIndex,
};
use exam_core::rooms::{occupied_rooms, pack_rooms};
use exam_core::Solver;
use thiserror::Error;
use tracing::info;
use types::{
    Course, CourseCode, Exam, Infeasibility, Instance, RelaxRule, RelaxationConfig,
    RelaxationNote, RelaxationSuggestion, Schedule, Slot, SlotId, SolveOutcome, SolveRequest,
    SolveResult,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("insufficient room capacity for course {course}")]
    InsufficientCapacity {
        course: CourseCode,
        enrolled: u32,
        total_capacity: u32,
    },
    #[error("no feasible slot for course {course}")]
    NoFeasibleSlot { course: CourseCode },
}

impl From<AttemptError> for Infeasibility {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::InsufficientCapacity {
                course,
                enrolled,
                total_capacity,
            } => Infeasibility::InsufficientCapacity {
                course,
                enrolled,
                total_capacity,
            },
            AttemptError::NoFeasibleSlot { course } => Infeasibility::NoFeasibleSlot { course },
        }
    }
}

/// One finished attempt under a fixed relaxation configuration.
#[derive(Clone, Debug)]
pub struct Attempt {
    pub config: RelaxationConfig,
    pub schedule: Schedule,
    pub relaxations: Vec<RelaxationNote>,
    pub penalty: u32,
}

/// Runs the greedy pass once under `config`.
///
/// Courses are taken by descending enrollment (course code breaks ties) and
/// slots probed day by day, index by index. Each placement that only passed
/// because a rule was suppressed is recorded and charged the rule's weight.
pub fn attempt(instance: &Instance, config: RelaxationConfig) -> Result<Attempt, AttemptError> {
    let rosters = RosterIndex::new(&instance.courses);

    // larger courses first: fewer slots can still take them once the rest
    // of the schedule fills in
    let mut courses: Vec<&Course> = instance.courses.iter().collect();
    courses.sort_by(|a, b| {
        b.student_count()
            .cmp(&a.student_count())
            .then_with(|| a.code.cmp(&b.code))
    });

    let mut slots: Vec<SlotId> = instance.slots.iter().map(Slot::id).collect();
    slots.sort();
    slots.dedup();

    let mut schedule = Schedule::new();
    let mut relaxations: Vec<RelaxationNote> = Vec::new();
    let mut penalty = 0u32;

    for course in courses {
        let needed = course.student_count();

        // capacity is slot-independent: if the whole pool cannot seat the
        // course, no slot ever will
        if pack_rooms(&instance.classrooms, needed).is_none() {
            return Err(AttemptError::InsufficientCapacity {
                course: course.code.clone(),
                enrolled: needed,
                total_capacity: instance.total_room_capacity(),
            });
        }

        let mut placed = false;
        'slots: for &slot in &slots {
            let taken = occupied_rooms(&schedule, slot);
            let free = instance
                .classrooms
                .iter()
                .filter(|c| !taken.contains(&c.id));
            let Some(rooms) = pack_rooms(free, needed) else {
                // this slot's remaining rooms cannot seat the course
                continue 'slots;
            };

            let candidate = Exam {
                course: course.code.clone(),
                slot,
                rooms,
            };

            let mut relaxed_consecutive = false;
            for existing in schedule.all_exams() {
                if same_slot_student_conflict(&candidate, existing, &rosters)
                    || room_occupancy_conflict(&candidate, existing)
                {
                    continue 'slots;
                }
                if consecutive_slot_violation(&candidate, existing, &rosters) {
                    if config.allow_consecutive_slots {
                        relaxed_consecutive = true;
                    } else {
                        continue 'slots;
                    }
                }
            }

            let relaxed_daily = exceeds_daily_limit(&candidate, &schedule, &rosters);
            if relaxed_daily && !config.allow_three_per_day {
                continue 'slots;
            }

            if relaxed_consecutive {
                relaxations.push(RelaxationNote {
                    rule: RelaxRule::ConsecutiveSlots,
                    course: course.code.clone(),
                });
                penalty += RelaxRule::ConsecutiveSlots.weight();
            }
            if relaxed_daily {
                relaxations.push(RelaxationNote {
                    rule: RelaxRule::ThreePerDay,
                    course: course.code.clone(),
                });
                penalty += RelaxRule::ThreePerDay.weight();
            }

            schedule.add_exam(candidate);
            placed = true;
            break;
        }

        if !placed {
            return Err(AttemptError::NoFeasibleSlot {
                course: course.code.clone(),
            });
        }
    }

    Ok(Attempt {
        config,
        schedule,
        relaxations,
        penalty,
    })
}

/// Probes each relaxable rule on its own; rules whose solo suppression makes
/// the instance schedulable come back with their explanation and the penalty
/// the relaxed schedule would carry.
pub fn suggest_relaxations(instance: &Instance) -> Vec<RelaxationSuggestion> {
    RelaxRule::ALL
        .into_iter()
        .filter_map(|rule| {
            attempt(instance, RelaxationConfig::only(rule))
                .ok()
                .map(|a| RelaxationSuggestion {
                    rule,
                    explanation: rule.explanation().to_string(),
                    penalty: a.penalty,
                })
        })
        .collect()
}

pub struct GreedySolver;

impl GreedySolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreedySolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Solver for GreedySolver {
    async fn solve(&self, req: SolveRequest) -> anyhow::Result<SolveOutcome> {
        let started = Instant::now();
        let SolveRequest { instance, params } = req;
        info!(
            courses = instance.courses.len(),
            classrooms = instance.classrooms.len(),
            slots = instance.slots.len(),
            auto_relax = params.auto_relax,
            "solve started"
        );

        if !params.auto_relax {
            let outcome = match attempt(&instance, RelaxationConfig::STRICT) {
                Ok(won) => solved(won, 1, started),
                Err(err) => infeasible(err.into()),
            };
            return Ok(outcome);
        }

        let instance = Arc::new(instance);
        let mut handles = Vec::with_capacity(RelaxationConfig::VARIANTS.len());
        for config in RelaxationConfig::VARIANTS {
            let inst = Arc::clone(&instance);
            handles.push(tokio::task::spawn_blocking(move || attempt(&inst, config)));
        }
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await?);
        }

        // capacity failures are fatal for every variant alike; keep one for
        // the report
        let capacity_failure = outcomes.iter().find_map(|o| match o {
            Err(err @ AttemptError::InsufficientCapacity { .. }) => Some(err.clone()),
            _ => None,
        });

        // variants are ordered least relaxed first, so a strict `<` leaves
        // penalty ties with the least relaxed winner
        let mut best: Option<Attempt> = None;
        for outcome in outcomes {
            if let Ok(won) = outcome {
                if best.as_ref().map_or(true, |b| won.penalty < b.penalty) {
                    best = Some(won);
                }
            }
        }

        Ok(match best {
            Some(won) => solved(won, RelaxationConfig::VARIANTS.len(), started),
            None => infeasible(
                capacity_failure
                    .map(Infeasibility::from)
                    .unwrap_or(Infeasibility::NoFeasibleSchedule),
            ),
        })
    }
}

fn solved(won: Attempt, variants_tried: usize, started: Instant) -> SolveOutcome {
    info!(
        variant = won.config.label(),
        penalty = won.penalty,
        exams = won.schedule.len(),
        "schedule generated"
    );
    let stats = serde_json::json!({
        "method": "greedy",
        "variant": won.config.label(),
        "variants_tried": variants_tried,
        "elapsed_ms": started.elapsed().as_millis() as u64,
    });
    SolveOutcome::Solved {
        result: SolveResult {
            schedule: won.schedule,
            penalty: won.penalty,
            relaxations: won.relaxations,
            stats,
        },
    }
}

fn infeasible(reason: Infeasibility) -> SolveOutcome {
    info!(%reason, "solve infeasible");
    SolveOutcome::Infeasible { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::audit::audit_schedule;
    use types::{Classroom, SlotPlan};

    fn plan(num_days: u32, per_day: usize) -> Vec<Slot> {
        let ranges = ["09:00-11:00", "12:00-14:00", "15:00-17:00", "18:00-20:00"];
        SlotPlan {
            num_days,
            time_ranges: ranges[..per_day].iter().map(|r| (*r).to_string()).collect(),
        }
        .slots()
    }

    #[test]
    fn biggest_course_gets_the_earliest_slot() {
        let instance = Instance {
            students: (1..=5).map(|i| format!("s{i}").into()).collect(),
            courses: vec![
                Course::new("SMALL").with_students(["s1"]),
                Course::new("BIG").with_students(["s2", "s3", "s4", "s5"]),
            ],
            classrooms: vec![Classroom::new("R1", 10), Classroom::new("R2", 10)],
            slots: plan(2, 2),
        };
        let won = attempt(&instance, RelaxationConfig::STRICT).unwrap();
        let big = won.schedule.exam_by_course(&"BIG".into()).unwrap();
        assert_eq!(big.slot, SlotId::new(1, 1));
        // disjoint rosters, free rooms: SMALL shares the slot
        let small = won.schedule.exam_by_course(&"SMALL".into()).unwrap();
        assert_eq!(small.slot, SlotId::new(1, 1));
        assert_ne!(big.rooms, small.rooms);
    }

    #[test]
    fn strict_attempt_produces_a_clean_schedule() {
        let instance = Instance {
            students: (1..=6).map(|i| format!("s{i}").into()).collect(),
            courses: vec![
                Course::new("A").with_students(["s1", "s2", "s3"]),
                Course::new("B").with_students(["s3", "s4"]),
                Course::new("C").with_students(["s1", "s5", "s6"]),
            ],
            classrooms: vec![Classroom::new("R1", 5), Classroom::new("R2", 3)],
            slots: plan(3, 3),
        };
        let won = attempt(&instance, RelaxationConfig::STRICT).unwrap();
        assert_eq!(won.penalty, 0);
        assert!(won.relaxations.is_empty());
        assert!(audit_schedule(&instance, &won.schedule).is_clean());
    }

    #[test]
    fn capacity_shortfall_is_fatal_with_enrollment_numbers() {
        let instance = Instance {
            students: (1..=30).map(|i| format!("s{i}").into()).collect(),
            courses: vec![Course::new("HUGE")
                .with_students((1..=30).map(|i| format!("s{i}")))],
            classrooms: vec![Classroom::new("R1", 10), Classroom::new("R2", 10)],
            slots: plan(3, 3),
        };
        let err = attempt(&instance, RelaxationConfig::STRICT).unwrap_err();
        assert_eq!(
            err,
            AttemptError::InsufficientCapacity {
                course: "HUGE".into(),
                enrolled: 30,
                total_capacity: 20,
            }
        );
        assert_eq!(
            err.to_string(),
            "insufficient room capacity for course HUGE"
        );
    }

    #[test]
    fn relaxed_placements_are_charged_per_rule() {
        // one student, three courses, one day of three back-to-back slots:
        // strict fails, both_relaxed pays one consecutive and one daily fee
        let instance = Instance {
            students: vec!["s1".into()],
            courses: vec![
                Course::new("A").with_students(["s1"]),
                Course::new("B").with_students(["s1"]),
                Course::new("C").with_students(["s1"]),
            ],
            classrooms: vec![Classroom::new("R1", 5)],
            slots: plan(1, 3),
        };
        assert!(attempt(&instance, RelaxationConfig::STRICT).is_err());

        let both = RelaxationConfig {
            allow_consecutive_slots: true,
            allow_three_per_day: true,
        };
        let won = attempt(&instance, both).unwrap();
        assert_eq!(won.schedule.len(), 3);
        // placements: A(1,1); B(1,2) pays consecutive; C(1,3) pays both
        assert_eq!(won.penalty, 50 + 50 + 100);
        let consecutive = won
            .relaxations
            .iter()
            .filter(|n| n.rule == RelaxRule::ConsecutiveSlots)
            .count();
        let daily = won
            .relaxations
            .iter()
            .filter(|n| n.rule == RelaxRule::ThreePerDay)
            .count();
        assert_eq!((consecutive, daily), (2, 1));
    }

    #[test]
    fn suggestions_name_the_rule_that_unblocks() {
        // two courses, one shared student, a single day with two adjacent
        // slots: only suppressing the consecutive rule helps
        let instance = Instance {
            students: vec!["s1".into()],
            courses: vec![
                Course::new("A").with_students(["s1"]),
                Course::new("B").with_students(["s1"]),
            ],
            classrooms: vec![Classroom::new("R1", 5)],
            slots: plan(1, 2),
        };
        let suggestions = suggest_relaxations(&instance);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].rule, RelaxRule::ConsecutiveSlots);
        assert_eq!(
            suggestions[0].explanation,
            "Allow students to take exams in consecutive slots."
        );
        assert_eq!(suggestions[0].penalty, 50);
    }

    #[test]
    fn suggestions_are_empty_when_nothing_helps() {
        let instance = Instance {
            students: vec!["s1".into()],
            courses: vec![
                Course::new("A").with_students(["s1"]),
                Course::new("B").with_students(["s1"]),
            ],
            classrooms: vec![Classroom::new("R1", 5)],
            slots: plan(1, 1),
        };
        assert!(suggest_relaxations(&instance).is_empty());
    }
}
