//! Grammar and semantic validation: accepted inputs, rejected inputs, and
//! issue accumulation across all three streams.

use topicmatch::{Config, InputStream, IssueKind, LoadError};

fn load(students: &str, topics: &str, supervisors: &str) -> Result<topicmatch::Instance, LoadError> {
    topicmatch::load_instance(students, topics, supervisors, &Config::default())
}

fn strict() -> Config {
    let mut config = Config::default();
    config.matching.strict_preference_count = true;
    config
}

const TOPICS: &str = "T1: Analytics\nT2: Systems\nT3: Vision\nT4: Robotics\nT5: Finance\n";
const ONE_SUP: &str = "V1: 3, BDBA:T1:Expert\n";

#[test]
fn test_accepts_canonical_input() {
    let instance = load(
        "# cohort 2025\nBDBA1: T1, T2, T3\nBCSAI1: T2\n",
        TOPICS,
        "V1: 3, BDBA:T1:Expert, BCSAI:T2:Advanced\n",
    )
    .unwrap();
    assert_eq!(instance.students.len(), 2);
    assert_eq!(instance.topics.len(), 5);
}

#[test]
fn test_accepts_crlf_and_loose_whitespace() {
    let instance = load(
        "  BDBA1 :  T1 , T2 \r\n",
        "T1: A\r\nT2:   B with spaces  \r\n",
        "  V1 : 2 , BDBA : T1 : Expert \r\n",
    )
    .unwrap();
    assert_eq!(instance.students[0].preferences.len(), 2);
    assert_eq!(instance.topics[1].area, "B with spaces");
}

#[test]
fn test_missing_colon_is_syntax_issue() {
    let err = load("BDBA1 T1\n", TOPICS, ONE_SUP).unwrap_err();
    assert_eq!(err.issues()[0].kind, IssueKind::MissingColon);
    assert_eq!(err.issues()[0].stream, InputStream::Students);
    assert_eq!(err.issues()[0].line, 1);
}

#[test]
fn test_unknown_topic_in_preferences() {
    let err = load("BDBA1: T1, T99\n", TOPICS, ONE_SUP).unwrap_err();
    assert!(err
        .issues()
        .iter()
        .any(|i| i.kind == IssueKind::UnknownTopic && i.message.contains("T99")));
}

#[test]
fn test_unknown_topic_in_supervisor_entry() {
    let err = load("BDBA1: T1\n", TOPICS, "V1: 2, BDBA:T77:Expert\n").unwrap_err();
    assert!(err
        .issues()
        .iter()
        .any(|i| i.kind == IssueKind::UnknownTopic && i.stream == InputStream::Supervisors));
}

#[test]
fn test_capacity_bounds() {
    for capacity in [0, 11, -1] {
        let err = load(
            "BDBA1: T1\n",
            TOPICS,
            &format!("V1: {capacity}, BDBA:T1:Expert\n"),
        )
        .unwrap_err();
        assert!(
            err.issues()
                .iter()
                .any(|i| i.kind == IssueKind::CapacityOutOfRange),
            "capacity {capacity} should be rejected"
        );
    }
    // Both ends of the valid range pass.
    for capacity in [1, 10] {
        assert!(load(
            "BDBA1: T1\n",
            TOPICS,
            &format!("V1: {capacity}, BDBA:T1:Expert\n"),
        )
        .is_ok());
    }
}

#[test]
fn test_level_tokens_are_case_sensitive() {
    let err = load("BDBA1: T1\n", TOPICS, "V1: 2, BDBA:T1:expert\n").unwrap_err();
    assert_eq!(err.issues()[0].kind, IssueKind::InvalidLevel);
}

#[test]
fn test_six_preferences_rejected() {
    let err = load("BDBA1: T1, T2, T3, T4, T5, T1\n", TOPICS, ONE_SUP).unwrap_err();
    assert!(err
        .issues()
        .iter()
        .any(|i| i.kind == IssueKind::PreferenceCountOutOfRange));
}

#[test]
fn test_strict_mode_enforces_exactly_five() {
    let students = "BDBA1: T1, T2, T3\n";
    assert!(topicmatch::load_instance(students, TOPICS, ONE_SUP, &Config::default()).is_ok());

    let err = topicmatch::load_instance(students, TOPICS, ONE_SUP, &strict()).unwrap_err();
    assert_eq!(err.issues()[0].kind, IssueKind::PreferenceCountOutOfRange);

    let five = "BDBA1: T1, T2, T3, T4, T5\n";
    assert!(topicmatch::load_instance(five, TOPICS, ONE_SUP, &strict()).is_ok());
}

#[test]
fn test_duplicate_preference_rejected() {
    let err = load("BDBA1: T1, T1\n", TOPICS, ONE_SUP).unwrap_err();
    assert!(err
        .issues()
        .iter()
        .any(|i| i.kind == IssueKind::DuplicatePreference));
}

#[test]
fn test_duplicate_supervisor_entry_rejected() {
    let err = load(
        "BDBA1: T1\n",
        TOPICS,
        "V1: 2, BDBA:T1:Expert, BDBA:T1:Beginner\n",
    )
    .unwrap_err();
    assert!(err.issues().iter().any(|i| i.kind == IssueKind::DuplicateEntry));
}

#[test]
fn test_issues_accumulate_across_streams() {
    let err = load(
        "BDBA1 T1\nBDBA2: T1, T1\n",
        "T1: A\nT1: B\nT2:\n",
        "V1: 0, BDBA:T1:Expert\nV2: 2, BDBA:T1:Guru\n",
    )
    .unwrap_err();
    let kinds: Vec<IssueKind> = err.issues().iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&IssueKind::MissingColon));
    assert!(kinds.contains(&IssueKind::DuplicatePreference));
    assert!(kinds.contains(&IssueKind::DuplicateTopic));
    assert!(kinds.contains(&IssueKind::MissingArea));
    assert!(kinds.contains(&IssueKind::CapacityOutOfRange));
    assert!(kinds.contains(&IssueKind::InvalidLevel));
    assert!(err.issues().len() >= 6);
}

#[test]
fn test_program_aliases_bridge_streams() {
    // Supervisor writes BBA_BDBA, student ids use BBA+BDBA or an alias;
    // everything normalizes to the same program, so the preference is
    // feasible for both students.
    let mut config = Config::default();
    config
        .programs
        .prefixes
        .insert("BBADBA".to_string(), "BBA+BDBA".to_string());

    let instance = topicmatch::load_instance(
        "BBA+BDBA1: T1\nBBADBA2: T1\n",
        "T1: A\n",
        "V1: 2, BBA_BDBA:T1:Expert\n",
        &config,
    )
    .unwrap();
    let (catalog, outcome) = topicmatch::run_matching(&instance, config.match_options());
    assert_eq!(outcome.state.matched_count(), 2);
    assert_eq!(catalog.len(), 1);
}

#[test]
fn test_empty_streams() {
    // No students is fine; no topics makes every preference unknown.
    assert!(load("", TOPICS, ONE_SUP).is_ok());
    let err = load("BDBA1: T1\n", "", ONE_SUP).unwrap_err();
    assert!(err.issues().iter().all(|i| i.kind == IssueKind::UnknownTopic));
}
