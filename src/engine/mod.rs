//! # Matching Engine
//!
//! Iterated proposal rounds in the style of the SPA-student algorithm of
//! Abraham, Irving and Manlove (2007), adapted to this instance shape:
//! topics carry no capacity of their own, each `(topic, program)` pair is
//! owned by a single supervisor (see [`crate::catalog`]), and the binding
//! constraint is the owner's global capacity.
//!
//! Each round is one pass over the unmatched, non-exhausted students in
//! ascending student-id order. A student consumes preference slots until it
//! is accepted, rejected at a full supervisor, or out of preferences. A full
//! supervisor compares the proposer with its current students under the
//! derived preference order and evicts the worst if that is not the
//! proposer. The loop reaches a fixed point once every student is matched or
//! exhausted; the cursors are monotone, so it always terminates.
//!
//! The engine never fails: bad combinations become [`DiagnosticEvent`]s in
//! the outcome and the state invariants are asserted at round boundaries in
//! debug builds.

mod state;

pub use state::{MatchState, StudentStatus};

use crate::catalog::OwnershipCatalog;
use crate::intern::{StudentId, TopicId};
use crate::model::{ExpertiseLevel, Instance};
use serde::Serialize;
use std::cmp::Reverse;
use tracing::{debug, trace};

/// Engine switches, resolved from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Non-default mode: an evicted student's cursor is stepped back so the
    /// topic it just lost is retried in the next round. The default keeps
    /// cursors strictly monotone.
    pub retry_on_eviction: bool,
}

/// Per-round counters for the report's round log.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoundRecord {
    pub round: u32,
    /// Proposals accepted during the round (including those that displaced
    /// another student).
    pub newly_matched: u32,
    /// Matched students at the end of the round.
    pub cumulative_matched: u32,
    pub evictions: u32,
}

/// Non-fatal events recorded while matching, in occurrence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "code")]
pub enum DiagnosticEvent {
    /// The student's preference has no supervisor for its `(topic, program)`
    /// combination; the slot was skipped.
    NoSupervisorForCombination { student: StudentId, topic: TopicId },
    /// The owning supervisor was full and the student lost the comparison
    /// against every current assignee.
    AllSupervisorsAtCapacity { student: StudentId, topic: TopicId },
    /// The student was displaced from a topic by a stronger proposer.
    EvictedInRound {
        student: StudentId,
        topic: TopicId,
        round: u32,
    },
}

/// Everything a matching session produces.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub state: MatchState,
    pub diagnostics: Vec<DiagnosticEvent>,
    pub rounds: Vec<RoundRecord>,
}

/// Sort key realizing a supervisor's derived preference over students;
/// smaller is better, so the worst assignee is the maximum.
///
/// Components, in order: declared expertise for the `(topic, program)` the
/// student holds or proposes (higher is better), the student's own rank of
/// that topic (earlier is better), then the student id as a deterministic
/// tie-break.
pub type DerivedKey = (Reverse<ExpertiseLevel>, usize, StudentId);

/// Compute the derived key of a student with respect to a topic.
///
/// The `(topic, program)` combination must have an owner; the engine only
/// compares students at a supervisor that owns their topics.
pub fn derived_preference_key(
    instance: &Instance,
    catalog: &OwnershipCatalog,
    student: StudentId,
    topic: TopicId,
) -> DerivedKey {
    let record = instance.student(student);
    let owner = catalog
        .owner_entry(topic, record.program)
        .expect("derived key requires an owned combination");
    let rank = record
        .rank_of(topic)
        .expect("students only hold topics from their own list");
    (Reverse(owner.level), rank, student)
}

/// Outcome of a single student's turn within a round.
enum Turn {
    Matched { evicted: bool },
    Rejected,
    Exhausted,
}

/// The proposal engine. Owns all mutable session state; converting it into a
/// [`MatchOutcome`] via [`MatchingEngine::run`] ends the session.
pub struct MatchingEngine<'a> {
    instance: &'a Instance,
    catalog: &'a OwnershipCatalog,
    options: MatchOptions,
    state: MatchState,
    diagnostics: Vec<DiagnosticEvent>,
    rounds: Vec<RoundRecord>,
}

impl<'a> MatchingEngine<'a> {
    pub fn new(instance: &'a Instance, catalog: &'a OwnershipCatalog, options: MatchOptions) -> Self {
        MatchingEngine {
            instance,
            catalog,
            options,
            state: MatchState::new(instance.students.len(), instance.supervisors.len()),
            diagnostics: Vec::new(),
            rounds: Vec::new(),
        }
    }

    /// Read-only view of the session state, valid between rounds.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// Execute one round. Returns `None` without doing anything once no
    /// student is left to propose, which is the fixed point.
    pub fn step_round(&mut self) -> Option<RoundRecord> {
        let active: Vec<StudentId> = self
            .instance
            .students
            .iter()
            .map(|s| s.id)
            .filter(|&s| self.state.status(s) == StudentStatus::Unproposed)
            .collect();
        if active.is_empty() {
            return None;
        }

        let round = self.rounds.len() as u32 + 1;
        let mut newly_matched = 0;
        let mut evictions = 0;

        for student in active {
            match self.propose(student, round) {
                Turn::Matched { evicted } => {
                    newly_matched += 1;
                    if evicted {
                        evictions += 1;
                    }
                }
                Turn::Rejected | Turn::Exhausted => {}
            }
        }

        let record = RoundRecord {
            round,
            newly_matched,
            cumulative_matched: self.state.matched_count() as u32,
            evictions,
        };
        debug!(
            round,
            newly_matched, record.cumulative_matched, evictions, "round complete"
        );
        if cfg!(debug_assertions) {
            self.state.verify_invariants(self.instance, self.catalog);
        }
        self.rounds.push(record);
        Some(record)
    }

    /// Run rounds to the fixed point and return the outcome.
    pub fn run(mut self) -> MatchOutcome {
        while self.step_round().is_some() {}
        debug!(
            rounds = self.rounds.len(),
            matched = self.state.matched_count(),
            students = self.instance.students.len(),
            "matching converged"
        );
        MatchOutcome {
            state: self.state,
            diagnostics: self.diagnostics,
            rounds: self.rounds,
        }
    }

    /// One student's turn: consume preference slots until accepted, rejected
    /// at a full supervisor, or exhausted. Skipped slots (no owner) produce
    /// diagnostics and do not end the turn.
    fn propose(&mut self, student: StudentId, round: u32) -> Turn {
        let instance = self.instance;
        let catalog = self.catalog;
        let record = instance.student(student);

        loop {
            let k = self.state.cursor(student);
            if k == record.preferences.len() {
                self.state.mark_exhausted(student);
                trace!(student = instance.student_name(student), "exhausted");
                return Turn::Exhausted;
            }

            let topic = record.preferences[k];
            self.state.advance_cursor(student);

            let Some(owner) = catalog.owner_entry(topic, record.program) else {
                self.diagnostics
                    .push(DiagnosticEvent::NoSupervisorForCombination { student, topic });
                trace!(
                    student = instance.student_name(student),
                    topic = instance.topic_name(topic),
                    "no supervisor for combination"
                );
                continue;
            };

            let supervisor = owner.supervisor;
            if self.state.load(supervisor) < instance.supervisor(supervisor).capacity {
                self.state.assign(student, topic, supervisor);
                trace!(
                    student = instance.student_name(student),
                    topic = instance.topic_name(topic),
                    supervisor = instance.supervisor_name(supervisor),
                    rank = k + 1,
                    "accepted"
                );
                return Turn::Matched { evicted: false };
            }

            // Full supervisor: find the worst of the current assignees and
            // the proposer under the derived order.
            let proposer_key = derived_preference_key(instance, catalog, student, topic);
            let worst = self
                .state
                .assigned_students(supervisor)
                .iter()
                .map(|&held| {
                    let held_topic = self
                        .state
                        .assignment(held)
                        .expect("assigned students hold a topic");
                    (
                        derived_preference_key(instance, catalog, held, held_topic),
                        held,
                        held_topic,
                    )
                })
                .max()
                .expect("a full supervisor holds at least one student");

            let (worst_key, worst_student, worst_topic) = worst;
            if proposer_key > worst_key {
                self.diagnostics
                    .push(DiagnosticEvent::AllSupervisorsAtCapacity { student, topic });
                trace!(
                    student = instance.student_name(student),
                    topic = instance.topic_name(topic),
                    supervisor = instance.supervisor_name(supervisor),
                    "rejected at capacity"
                );
                return Turn::Rejected;
            }

            self.state.evict(worst_student, supervisor);
            if self.options.retry_on_eviction {
                self.state.rewind_cursor(worst_student);
            }
            self.diagnostics.push(DiagnosticEvent::EvictedInRound {
                student: worst_student,
                topic: worst_topic,
                round,
            });
            self.state.assign(student, topic, supervisor);
            trace!(
                student = instance.student_name(student),
                evicted = instance.student_name(worst_student),
                topic = instance.topic_name(topic),
                supervisor = instance.supervisor_name(supervisor),
                "accepted with eviction"
            );
            return Turn::Matched { evicted: true };
        }
    }
}
