//! Evaluation metrics for a finished matching.
//!
//! Computes the aggregate quality figures for the report: match rate, rank
//! statistics, supervisor utilization, a Gini fairness coefficient over
//! student satisfaction, and an informational per-program breakdown. Also
//! hosts the post-run constraint verification; a violation here means a bug
//! in the engine, not bad input.

use crate::catalog::OwnershipCatalog;
use crate::engine::MatchState;
use crate::model::Instance;
use serde::Serialize;
use thiserror::Error;

/// Per-supervisor load against capacity.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisorUtilization {
    pub supervisor: String,
    pub load: u32,
    pub capacity: u32,
    /// `load / capacity`, in `[0, 1]`.
    pub utilization: f64,
}

/// Informational per-program totals. Matching never balances across
/// programs; these exist for the report only.
#[derive(Debug, Clone, Serialize)]
pub struct ProgramBreakdown {
    pub program: String,
    pub students: u32,
    pub matched: u32,
}

/// The metrics block of the report.
#[derive(Debug, Clone, Serialize)]
pub struct MatchMetrics {
    pub total_students: usize,
    pub matched: usize,
    /// `matched / total_students`; 0 for an empty instance.
    pub match_rate: f64,
    /// Mean 1-based preference rank over matched students; `None` when
    /// nobody matched.
    pub average_rank: Option<f64>,
    /// Matched students by rank; index 0 counts first choices.
    pub rank_histogram: [u32; 5],
    pub supervisor_utilization: Vec<SupervisorUtilization>,
    /// Mean of the per-supervisor utilizations.
    pub mean_utilization: f64,
    /// Gini coefficient over per-student satisfaction scores, where a
    /// student matched at rank r out of p preferences scores `p - r + 1`
    /// and an unmatched student scores 0. 0 is perfect equality.
    pub gini_satisfaction: f64,
    pub per_program: Vec<ProgramBreakdown>,
}

/// Compute the metrics block from the final state.
pub fn evaluate(instance: &Instance, state: &MatchState) -> MatchMetrics {
    let total_students = instance.students.len();
    let matched = state.matched_count();

    let mut rank_histogram = [0u32; 5];
    let mut rank_sum = 0usize;
    let mut satisfaction = Vec::with_capacity(total_students);
    let mut per_program: Vec<(u32, u32)> = vec![(0, 0); instance.program_names.len()];

    for student in &instance.students {
        per_program[student.program.index()].0 += 1;
        match state.assignment(student.id) {
            Some(topic) => {
                let rank = student
                    .rank_of(topic)
                    .expect("assigned topics come from the preference list");
                rank_histogram[rank] += 1;
                rank_sum += rank + 1;
                satisfaction.push((student.preferences.len() - rank) as f64);
                per_program[student.program.index()].1 += 1;
            }
            None => satisfaction.push(0.0),
        }
    }

    let supervisor_utilization: Vec<SupervisorUtilization> = instance
        .supervisors
        .iter()
        .map(|v| {
            let load = state.load(v.id);
            SupervisorUtilization {
                supervisor: instance.supervisor_name(v.id).to_string(),
                load,
                capacity: v.capacity,
                utilization: f64::from(load) / f64::from(v.capacity),
            }
        })
        .collect();
    let mean_utilization = if supervisor_utilization.is_empty() {
        0.0
    } else {
        supervisor_utilization
            .iter()
            .map(|u| u.utilization)
            .sum::<f64>()
            / supervisor_utilization.len() as f64
    };

    MatchMetrics {
        total_students,
        matched,
        match_rate: if total_students == 0 {
            0.0
        } else {
            matched as f64 / total_students as f64
        },
        average_rank: if matched == 0 {
            None
        } else {
            Some(rank_sum as f64 / matched as f64)
        },
        rank_histogram,
        supervisor_utilization,
        mean_utilization,
        gini_satisfaction: gini(&satisfaction),
        per_program: per_program
            .into_iter()
            .enumerate()
            .filter(|(_, (students, _))| *students > 0)
            .map(|(i, (students, matched))| ProgramBreakdown {
                program: instance.program_names.resolve(i as u32).to_string(),
                students,
                matched,
            })
            .collect(),
    }
}

/// Gini coefficient of a non-negative sample. 0 for an empty sample or an
/// all-zero one.
fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = values.iter().sum();
    if sum == 0.0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("satisfaction scores are finite"));
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| (i + 1) as f64 * x)
        .sum();
    (2.0 * weighted) / (n as f64 * sum) - (n as f64 + 1.0) / n as f64
}

/// Violation of a post-run constraint; always a programmer error.
#[derive(Error, Debug)]
pub enum ConstraintViolation {
    #[error("supervisor '{supervisor}' holds {load} students over capacity {capacity}")]
    CapacityExceeded {
        supervisor: String,
        load: u32,
        capacity: u32,
    },
    #[error("student '{student}' is assigned a topic outside its preference list")]
    AssignmentOffList { student: String },
    #[error("student '{student}' is held by a supervisor that does not own its combination")]
    WrongSupervisor { student: String },
}

/// Verify the capacity, preference-membership and ownership constraints of
/// the final state.
pub fn verify_constraints(
    instance: &Instance,
    catalog: &OwnershipCatalog,
    state: &MatchState,
) -> Result<(), ConstraintViolation> {
    for supervisor in &instance.supervisors {
        let load = state.load(supervisor.id);
        if load > supervisor.capacity {
            return Err(ConstraintViolation::CapacityExceeded {
                supervisor: instance.supervisor_name(supervisor.id).to_string(),
                load,
                capacity: supervisor.capacity,
            });
        }
    }

    for student in &instance.students {
        let Some(topic) = state.assignment(student.id) else {
            continue;
        };
        if student.rank_of(topic).is_none() {
            return Err(ConstraintViolation::AssignmentOffList {
                student: instance.student_name(student.id).to_string(),
            });
        }
        let owner = catalog.owner(topic, student.program);
        let held = owner.is_some_and(|v| state.assigned_students(v).contains(&student.id));
        if !held {
            return Err(ConstraintViolation::WrongSupervisor {
                student: instance.student_name(student.id).to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MatchOptions, MatchingEngine};
    use crate::parser;
    use crate::programs::ProgramTable;
    use crate::validate::{build_instance, ValidationOptions};

    fn run(students: &str, topics: &str, supervisors: &str) -> (Instance, OwnershipCatalog, MatchState) {
        let mut issues = Vec::new();
        let raw_students = parser::parse_students(students, &mut issues);
        let raw_topics = parser::parse_topics(topics, &mut issues);
        let raw_supervisors = parser::parse_supervisors(supervisors, &mut issues);
        let instance = build_instance(
            raw_students,
            raw_topics,
            raw_supervisors,
            &ProgramTable::new(),
            ValidationOptions::default(),
            &mut issues,
        )
        .unwrap_or_else(|| panic!("{issues:?}"));
        let catalog = OwnershipCatalog::build(&instance);
        let outcome = MatchingEngine::new(&instance, &catalog, MatchOptions::default()).run();
        (instance, catalog, outcome.state)
    }

    #[test]
    fn test_metrics_on_full_match() {
        let (instance, catalog, state) = run(
            "BDBA1: T1, T2\nBDBA2: T2, T1\n",
            "T1: A\nT2: B\n",
            "V1: 1, BDBA:T1:Expert\nV2: 1, BDBA:T2:Expert\n",
        );
        let metrics = evaluate(&instance, &state);
        assert_eq!(metrics.total_students, 2);
        assert_eq!(metrics.matched, 2);
        assert_eq!(metrics.match_rate, 1.0);
        assert_eq!(metrics.average_rank, Some(1.0));
        assert_eq!(metrics.rank_histogram, [2, 0, 0, 0, 0]);
        assert_eq!(metrics.mean_utilization, 1.0);
        // Equal satisfaction across students.
        assert!(metrics.gini_satisfaction.abs() < 1e-12);
        assert!(verify_constraints(&instance, &catalog, &state).is_ok());
    }

    #[test]
    fn test_metrics_with_unmatched_student() {
        let (instance, _, state) = run(
            "BDBA1: T1, T2\nBDBA2: T1, T2\nBCSAI1: T1, T2\n",
            "T1: A\nT2: B\n",
            "V1: 1, BDBA:T1:Expert\nV2: 1, BDBA:T2:Expert\n",
        );
        let metrics = evaluate(&instance, &state);
        assert_eq!(metrics.matched, 2);
        assert!((metrics.match_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(metrics.rank_histogram, [1, 1, 0, 0, 0]);
        // One student at 0 satisfaction drags fairness down.
        assert!(metrics.gini_satisfaction > 0.0);

        let per_program: Vec<_> = metrics
            .per_program
            .iter()
            .map(|p| (p.program.as_str(), p.students, p.matched))
            .collect();
        assert_eq!(per_program, vec![("BCSAI", 1, 0), ("BDBA", 2, 2)]);
    }

    #[test]
    fn test_average_rank_counts_second_choices() {
        let (instance, _, state) = run(
            "BDBA1: T1, T2\nBDBA2: T1, T2\n",
            "T1: A\nT2: B\n",
            "V1: 1, BDBA:T1:Expert\nV2: 1, BDBA:T2:Expert\n",
        );
        let metrics = evaluate(&instance, &state);
        assert_eq!(metrics.average_rank, Some(1.5));
    }

    #[test]
    fn test_gini_extremes() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
        assert!(gini(&[3.0, 3.0, 3.0]).abs() < 1e-12);
        // One student takes everything: approaches (n-1)/n.
        let g = gini(&[0.0, 0.0, 0.0, 5.0]);
        assert!((g - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_verify_detects_off_list_assignment() {
        let (instance, catalog, _) = run(
            "BDBA1: T1\n",
            "T1: A\nT2: B\n",
            "V1: 1, BDBA:T1:Expert, BDBA:T2:Expert\n",
        );
        let mut bad = MatchState::new(1, 1);
        let t2 = crate::intern::TopicId(instance.topic_names.get("T2").unwrap());
        bad.assign(crate::intern::StudentId(0), t2, crate::intern::SupervisorId(0));
        assert!(matches!(
            verify_constraints(&instance, &catalog, &bad),
            Err(ConstraintViolation::AssignmentOffList { .. })
        ));
    }

    #[test]
    fn test_empty_instance_metrics() {
        let (instance, _, state) = run("", "T1: A\n", "V1: 1, BDBA:T1:Expert\n");
        let metrics = evaluate(&instance, &state);
        assert_eq!(metrics.total_students, 0);
        assert_eq!(metrics.match_rate, 0.0);
        assert_eq!(metrics.average_rank, None);
    }
}
