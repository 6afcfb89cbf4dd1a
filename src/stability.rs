//! Stability check and unmatched-student diagnostics.
//!
//! A finished matching is audited from an immutable view of the final state:
//! blocking-pair enumeration proves (or disproves) stability, and every
//! unmatched student gets a primary failure reason derived from the end
//! state of its preference slots.

use crate::catalog::OwnershipCatalog;
use crate::engine::{derived_preference_key, MatchState};
use crate::intern::{StudentId, TopicId};
use crate::model::Instance;
use serde::Serialize;

/// A `(student, topic)` pair that would rationally defect from the current
/// matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockingPair {
    pub student: StudentId,
    pub topic: TopicId,
    /// 0-based index of `topic` in the student's preference list.
    pub rank: usize,
}

/// Enumerate all blocking pairs; an empty result proves stability.
///
/// For each student, the scan covers the preference prefix strictly before
/// its assignment (the whole list when unmatched). A pair blocks when the
/// combination has an owner that either has spare capacity or holds a
/// student it likes strictly less than the candidate.
pub fn find_blocking_pairs(
    instance: &Instance,
    catalog: &OwnershipCatalog,
    state: &MatchState,
) -> Vec<BlockingPair> {
    let mut pairs = Vec::new();

    for student in &instance.students {
        let limit = match state.assignment(student.id) {
            Some(assigned) => student
                .rank_of(assigned)
                .expect("assigned topics come from the preference list"),
            None => student.preferences.len(),
        };

        for (rank, &topic) in student.preferences[..limit].iter().enumerate() {
            let Some(owner) = catalog.owner_entry(topic, student.program) else {
                continue;
            };
            let supervisor = owner.supervisor;

            let has_room =
                state.load(supervisor) < instance.supervisor(supervisor).capacity;
            let blocks = has_room || {
                let candidate_key =
                    derived_preference_key(instance, catalog, student.id, topic);
                state.assigned_students(supervisor).iter().any(|&held| {
                    let held_topic = state
                        .assignment(held)
                        .expect("assigned students hold a topic");
                    candidate_key < derived_preference_key(instance, catalog, held, held_topic)
                })
            };

            if blocks {
                pairs.push(BlockingPair {
                    student: student.id,
                    topic,
                    rank,
                });
            }
        }
    }

    pairs
}

/// End-state explanation for one preference slot of an unmatched student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotReason {
    /// No supervisor declared the `(topic, program)` combination.
    NoOwner,
    /// The owning supervisor finished the run at full capacity.
    OwnerAtCapacity,
}

/// Primary classification of why a student ended up unmatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason")]
pub enum UnmatchedReason {
    /// Every preference lacks an owner.
    NoSupervisorForCombination,
    /// Every preference has an owner and every owner is full.
    AllSupervisorsAtCapacity,
    /// Some slots lack an owner, the rest hit full supervisors.
    Mixed { slots: Vec<(TopicId, SlotReason)> },
}

/// One unmatched student with its classified reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedStudent {
    pub student: StudentId,
    pub reason: UnmatchedReason,
}

/// Classify every unmatched student, in student order.
pub fn classify_unmatched(
    instance: &Instance,
    catalog: &OwnershipCatalog,
    state: &MatchState,
) -> Vec<UnmatchedStudent> {
    let mut unmatched = Vec::new();

    for student in &instance.students {
        if state.assignment(student.id).is_some() {
            continue;
        }

        let slots: Vec<(TopicId, SlotReason)> = student
            .preferences
            .iter()
            .map(|&topic| {
                let reason = match catalog.owner(topic, student.program) {
                    None => SlotReason::NoOwner,
                    Some(supervisor) => {
                        debug_assert!(
                            state.load(supervisor)
                                >= instance.supervisor(supervisor).capacity,
                            "unmatched student skipped a supervisor with room"
                        );
                        SlotReason::OwnerAtCapacity
                    }
                };
                (topic, reason)
            })
            .collect();

        let reason = if slots.iter().all(|(_, r)| *r == SlotReason::NoOwner) {
            UnmatchedReason::NoSupervisorForCombination
        } else if slots.iter().all(|(_, r)| *r == SlotReason::OwnerAtCapacity) {
            UnmatchedReason::AllSupervisorsAtCapacity
        } else {
            UnmatchedReason::Mixed { slots }
        };

        unmatched.push(UnmatchedStudent {
            student: student.id,
            reason,
        });
    }

    unmatched
}
