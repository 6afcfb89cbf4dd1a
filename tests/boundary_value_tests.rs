//! Edge-of-domain inputs: empty cohorts, single-entry lists, capacity
//! extremes, ownership ties.

use topicmatch::{Config, Report};

fn pipeline(students: &str, topics: &str, supervisors: &str) -> Report {
    let config = Config::default();
    let instance =
        topicmatch::load_instance(students, topics, supervisors, &config).unwrap();
    let (catalog, outcome) = topicmatch::run_matching(&instance, config.match_options());
    Report::build(&instance, &catalog, &outcome)
}

#[test]
fn test_empty_student_set() {
    let report = pipeline("", "T1: A\n", "V1: 1, BDBA:T1:Expert\n");
    assert!(report.assignments.is_empty());
    assert!(report.rounds.is_empty());
    assert!(report.stable);
    assert_eq!(report.metrics.match_rate, 0.0);
}

#[test]
fn test_single_preference_student() {
    let report = pipeline("BDBA1: T1\n", "T1: A\n", "V1: 1, BDBA:T1:Expert\n");
    assert_eq!(report.metrics.matched, 1);
    assert_eq!(report.metrics.rank_histogram, [1, 0, 0, 0, 0]);
}

#[test]
fn test_capacity_ten_takes_ten_students() {
    let students: String = (1..=12)
        .map(|i| format!("BDBA{i:02}: T1\n"))
        .collect();
    let report = pipeline(&students, "T1: A\n", "V1: 10, BDBA:T1:Expert\n");
    assert_eq!(report.metrics.matched, 10);
    assert_eq!(report.unmatched.len(), 2);
    let util = &report.metrics.supervisor_utilization[0];
    assert_eq!((util.load, util.capacity), (10, 10));
}

#[test]
fn test_topic_owned_by_nobody_for_any_program() {
    // T2 exists in the catalog but no supervisor declares it at all.
    let report = pipeline(
        "BDBA1: T2, T1\nBDBA2: T2, T1\n",
        "T1: A\nT2: B\n",
        "V1: 2, BDBA:T1:Expert\n",
    );
    assert_eq!(report.metrics.matched, 2);
    assert_eq!(
        report
            .diagnostics
            .iter()
            .filter(|d| d.code == "NoSupervisorForCombination")
            .count(),
        2
    );
}

#[test]
fn test_expert_tie_resolves_to_smaller_supervisor_id() {
    let report = pipeline(
        "BDBA1: T1\n",
        "T1: A\n",
        "V10: 1, BDBA:T1:Expert\nV2: 1, BDBA:T1:Expert\n",
    );
    // Lexicographic order: "V10" < "V2".
    assert_eq!(report.assignments[0].supervisor.as_deref(), Some("V10"));
}

#[test]
fn test_all_students_share_identical_preferences() {
    let students = "BDBA1: T1, T2\nBDBA2: T1, T2\nBDBA3: T1, T2\nBDBA4: T1, T2\n";
    let report = pipeline(
        students,
        "T1: A\nT2: B\n",
        "V1: 2, BDBA:T1:Expert\nV2: 1, BDBA:T2:Expert\n",
    );
    assert_eq!(report.metrics.matched, 3);
    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.unmatched[0].student, "BDBA4");
    assert!(report.stable);
}

#[test]
fn test_connector_spellings_in_student_ids() {
    // BBA_BDBA and BBA+BDBA students are the same program.
    let report = pipeline(
        "BBA_BDBA1: T1\nBBA+BDBA2: T1\n",
        "T1: A\n",
        "V1: 2, BBA+BDBA:T1:Expert\n",
    );
    assert_eq!(report.metrics.matched, 2);
    assert_eq!(report.metrics.per_program.len(), 1);
    assert_eq!(report.metrics.per_program[0].program, "BBA+BDBA");
}

#[test]
fn test_level_ladder_orders_eviction_chain() {
    // Four programs contend for one slot; only the Expert survives.
    let report = pipeline(
        "BBA1: T1\nBCSAI1: T1\nBDBA1: T1\nBID1: T1\n",
        "T1: A\n",
        "V1: 1, BBA:T1:Beginner, BCSAI:T1:Intermediate, BDBA:T1:Advanced, BID:T1:Expert\n",
    );
    let matched: Vec<_> = report
        .assignments
        .iter()
        .filter(|r| r.topic.is_some())
        .map(|r| r.student.as_str())
        .collect();
    assert_eq!(matched, vec!["BID1"]);
    assert!(report.stable);
}
