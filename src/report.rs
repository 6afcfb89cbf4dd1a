//! Report payload and rendering.
//!
//! The structured [`Report`] is what external tooling consumes; the text and
//! CSV renderings are conveniences for terminals and spreadsheets. Building
//! a report runs the full post-matching evaluation: stability audit,
//! unmatched classification, metrics, and constraint verification.

use crate::catalog::OwnershipCatalog;
use crate::engine::{DiagnosticEvent, MatchOutcome, RoundRecord};
use crate::metrics::{self, MatchMetrics};
use crate::model::Instance;
use crate::stability::{self, SlotReason, UnmatchedReason};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

/// Header identifying one matching run.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    pub students: usize,
    pub topics: usize,
    pub supervisors: usize,
}

/// One row of the assignment table. Topic, supervisor and rank are empty for
/// unmatched students.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentRow {
    pub student: String,
    pub program: String,
    pub topic: Option<String>,
    pub supervisor: Option<String>,
    /// 1-based preference rank of the assigned topic.
    pub rank: Option<u32>,
}

/// One diagnostic event, resolved to display names.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticRow {
    pub student: String,
    pub code: String,
    pub details: String,
}

/// One unmatched student with its primary failure reason.
#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedRow {
    pub student: String,
    pub reason: String,
    pub details: String,
}

/// A blocking pair found by the stability audit.
#[derive(Debug, Clone, Serialize)]
pub struct BlockingPairRow {
    pub student: String,
    pub topic: String,
    /// 1-based rank the student gives the blocking topic.
    pub rank: u32,
}

/// The complete report of one matching run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run: RunInfo,
    pub assignments: Vec<AssignmentRow>,
    pub unmatched: Vec<UnmatchedRow>,
    pub diagnostics: Vec<DiagnosticRow>,
    pub metrics: MatchMetrics,
    pub rounds: Vec<RoundRecord>,
    pub blocking_pairs: Vec<BlockingPairRow>,
    /// True iff `blocking_pairs` is empty.
    pub stable: bool,
}

impl Report {
    /// Evaluate a finished matching into its report.
    ///
    /// Constraint verification runs here as a final safety net; a violation
    /// is an engine bug and panics rather than producing a corrupt report.
    pub fn build(instance: &Instance, catalog: &OwnershipCatalog, outcome: &MatchOutcome) -> Report {
        if let Err(violation) = metrics::verify_constraints(instance, catalog, &outcome.state) {
            panic!("constraint verification failed: {violation}");
        }

        let assignments = instance
            .students
            .iter()
            .map(|student| {
                let topic = outcome.state.assignment(student.id);
                let supervisor = topic.and_then(|t| catalog.owner(t, student.program));
                let rank = topic.map(|t| {
                    student
                        .rank_of(t)
                        .expect("assigned topics come from the preference list")
                        as u32
                        + 1
                });
                AssignmentRow {
                    student: instance.student_name(student.id).to_string(),
                    program: instance.program_name(student.program).to_string(),
                    topic: topic.map(|t| instance.topic_name(t).to_string()),
                    supervisor: supervisor.map(|v| instance.supervisor_name(v).to_string()),
                    rank,
                }
            })
            .collect();

        let unmatched = stability::classify_unmatched(instance, catalog, &outcome.state)
            .into_iter()
            .map(|u| {
                let (reason, details) = match u.reason {
                    UnmatchedReason::NoSupervisorForCombination => (
                        "NoSupervisorForCombination",
                        "no preference has a supervisor for this program".to_string(),
                    ),
                    UnmatchedReason::AllSupervisorsAtCapacity => (
                        "AllSupervisorsAtCapacity",
                        "every preferred topic's supervisor finished at capacity".to_string(),
                    ),
                    UnmatchedReason::Mixed { slots } => {
                        let detail = slots
                            .iter()
                            .map(|(topic, reason)| {
                                let label = match reason {
                                    SlotReason::NoOwner => "no supervisor",
                                    SlotReason::OwnerAtCapacity => "supervisor full",
                                };
                                format!("{}: {label}", instance.topic_name(*topic))
                            })
                            .collect::<Vec<_>>()
                            .join("; ");
                        ("Mixed", detail)
                    }
                };
                UnmatchedRow {
                    student: instance.student_name(u.student).to_string(),
                    reason: reason.to_string(),
                    details,
                }
            })
            .collect();

        let diagnostics = outcome
            .diagnostics
            .iter()
            .map(|event| match *event {
                DiagnosticEvent::NoSupervisorForCombination { student, topic } => DiagnosticRow {
                    student: instance.student_name(student).to_string(),
                    code: "NoSupervisorForCombination".to_string(),
                    details: format!(
                        "no supervisor for topic '{}' in program '{}'",
                        instance.topic_name(topic),
                        instance.program_name(instance.student(student).program),
                    ),
                },
                DiagnosticEvent::AllSupervisorsAtCapacity { student, topic } => DiagnosticRow {
                    student: instance.student_name(student).to_string(),
                    code: "AllSupervisorsAtCapacity".to_string(),
                    details: format!(
                        "rejected at topic '{}': supervisor at capacity",
                        instance.topic_name(topic),
                    ),
                },
                DiagnosticEvent::EvictedInRound {
                    student,
                    topic,
                    round,
                } => DiagnosticRow {
                    student: instance.student_name(student).to_string(),
                    code: "EvictedInRound".to_string(),
                    details: format!(
                        "displaced from topic '{}' in round {round}",
                        instance.topic_name(topic),
                    ),
                },
            })
            .collect();

        let blocking_pairs: Vec<BlockingPairRow> =
            stability::find_blocking_pairs(instance, catalog, &outcome.state)
                .into_iter()
                .map(|p| BlockingPairRow {
                    student: instance.student_name(p.student).to_string(),
                    topic: instance.topic_name(p.topic).to_string(),
                    rank: p.rank as u32 + 1,
                })
                .collect();

        Report {
            run: RunInfo {
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                generated_at: Utc::now(),
                students: instance.students.len(),
                topics: instance.topics.len(),
                supervisors: instance.supervisors.len(),
            },
            assignments,
            unmatched,
            diagnostics,
            metrics: metrics::evaluate(instance, &outcome.state),
            rounds: outcome.rounds.clone(),
            stable: blocking_pairs.is_empty(),
            blocking_pairs,
        }
    }

    /// The full payload as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// The assignment table as CSV, one row per student.
    pub fn assignment_csv(&self) -> String {
        let mut out = String::from("student,program,topic,supervisor,rank\n");
        for row in &self.assignments {
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                row.student,
                row.program,
                row.topic.as_deref().unwrap_or(""),
                row.supervisor.as_deref().unwrap_or(""),
                row.rank.map(|r| r.to_string()).unwrap_or_default(),
            );
        }
        out
    }

    /// Human-readable rendering of the whole report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Student-project allocation report (v{}, {})",
            self.run.tool_version,
            self.run.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );
        let _ = writeln!(
            out,
            "{} students, {} topics, {} supervisors",
            self.run.students, self.run.topics, self.run.supervisors
        );

        let _ = writeln!(out, "\n== Assignments ==");
        let width = self
            .assignments
            .iter()
            .map(|r| r.student.len())
            .max()
            .unwrap_or(7)
            .max(7);
        let _ = writeln!(out, "{:width$}  {:10}  {:10}  {:10}  rank", "student", "program", "topic", "supervisor");
        for row in &self.assignments {
            let _ = writeln!(
                out,
                "{:width$}  {:10}  {:10}  {:10}  {}",
                row.student,
                row.program,
                row.topic.as_deref().unwrap_or("-"),
                row.supervisor.as_deref().unwrap_or("-"),
                row.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            );
        }

        if !self.unmatched.is_empty() {
            let _ = writeln!(out, "\n== Unmatched ==");
            for row in &self.unmatched {
                let _ = writeln!(out, "{}: {} ({})", row.student, row.reason, row.details);
            }
        }

        let _ = writeln!(out, "\n== Metrics ==");
        let m = &self.metrics;
        let _ = writeln!(
            out,
            "matched {}/{} ({:.1}%)",
            m.matched,
            m.total_students,
            m.match_rate * 100.0
        );
        if let Some(avg) = m.average_rank {
            let _ = writeln!(out, "average rank: {avg:.2}");
        }
        let histogram = m
            .rank_histogram
            .iter()
            .enumerate()
            .map(|(i, count)| format!("{}:{count}", i + 1))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "rank histogram: {histogram}");
        let _ = writeln!(out, "mean utilization: {:.1}%", m.mean_utilization * 100.0);
        for u in &m.supervisor_utilization {
            let _ = writeln!(
                out,
                "  {}: {}/{} ({:.1}%)",
                u.supervisor,
                u.load,
                u.capacity,
                u.utilization * 100.0
            );
        }
        let _ = writeln!(out, "gini (satisfaction): {:.3}", m.gini_satisfaction);
        for p in &m.per_program {
            let _ = writeln!(out, "  {}: {}/{} matched", p.program, p.matched, p.students);
        }

        let _ = writeln!(out, "\n== Rounds ==");
        for r in &self.rounds {
            let _ = writeln!(
                out,
                "round {}: +{} matched (total {}), {} eviction(s)",
                r.round, r.newly_matched, r.cumulative_matched, r.evictions
            );
        }

        let _ = writeln!(
            out,
            "\nstability: {}",
            if self.stable {
                "stable (no blocking pairs)".to_string()
            } else {
                format!("{} blocking pair(s)", self.blocking_pairs.len())
            }
        );
        for p in &self.blocking_pairs {
            let _ = writeln!(out, "  {} would defect to {} (rank {})", p.student, p.topic, p.rank);
        }

        out
    }
}
