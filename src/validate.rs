//! # Semantic Validation
//!
//! Cross-record validation of the parsed streams, with all-or-nothing
//! semantics: every issue in the batch is reported and no instance is
//! produced unless the batch is clean.
//!
//! This is also the interning boundary. Record ids are sorted and assigned
//! dense handles here, so every downstream component works with integer
//! handles whose order is the lexicographic order of the original ids.

use crate::error::{InputStream, Issue, IssueKind};
use crate::intern::{Interner, ProgramId, StudentId, SupervisorId, TopicId};
use crate::model::{ExpertiseEntry, Instance, Student, Supervisor, Topic};
use crate::parser::{RawStudent, RawSupervisor, RawTopic};
use crate::programs::ProgramTable;
use std::collections::{BTreeSet, HashSet};

/// Preference-list lengths accepted outside strict mode.
pub const MIN_PREFERENCES: usize = 1;
/// Upper bound on preference-list length, and the required length in strict
/// mode.
pub const MAX_PREFERENCES: usize = 5;

/// Supervisor capacity bounds.
pub const MIN_CAPACITY: i64 = 1;
pub const MAX_CAPACITY: i64 = 10;

/// Validation switches, resolved from configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Require exactly [`MAX_PREFERENCES`] preferences per student instead
    /// of accepting 1 to 5.
    pub strict_preference_count: bool,
}

/// Validate the parsed records and intern them into an [`Instance`].
///
/// `issues` carries over whatever the parser accumulated; this function
/// appends semantic issues and returns `None` unless the combined list ends
/// up empty.
pub fn build_instance(
    raw_students: Vec<RawStudent>,
    raw_topics: Vec<RawTopic>,
    raw_supervisors: Vec<RawSupervisor>,
    programs: &ProgramTable,
    options: ValidationOptions,
    issues: &mut Vec<Issue>,
) -> Option<Instance> {
    let (topic_names, topics) = intern_topics(raw_topics, issues);
    let program_names = intern_programs(&raw_students, &raw_supervisors, programs);

    let (student_names, students) = intern_students(
        raw_students,
        &topic_names,
        &program_names,
        programs,
        options,
        issues,
    );
    let (supervisor_names, supervisors) =
        intern_supervisors(raw_supervisors, &topic_names, &program_names, programs, issues);

    if !issues.is_empty() {
        return None;
    }

    Some(Instance {
        students,
        topics,
        supervisors,
        student_names,
        topic_names,
        supervisor_names,
        program_names,
    })
}

/// Sort records by id, flag duplicates, and return the deduplicated list in
/// id order (first occurrence wins; later duplicates are flagged).
fn dedup_by_id<T>(
    mut records: Vec<T>,
    id_of: impl Fn(&T) -> &str,
    line_of: impl Fn(&T) -> usize,
    stream: InputStream,
    kind: IssueKind,
    what: &str,
    issues: &mut Vec<Issue>,
) -> Vec<T> {
    records.sort_by(|a, b| (id_of(a), line_of(a)).cmp(&(id_of(b), line_of(b))));
    let mut unique: Vec<T> = Vec::with_capacity(records.len());
    for record in records {
        match unique.last() {
            Some(prev) if id_of(prev) == id_of(&record) => {
                issues.push(Issue::new(
                    stream,
                    line_of(&record),
                    kind,
                    format!("{what} '{}' is declared more than once", id_of(&record)),
                ));
            }
            _ => unique.push(record),
        }
    }
    unique
}

fn intern_topics(raw: Vec<RawTopic>, issues: &mut Vec<Issue>) -> (Interner, Vec<Topic>) {
    let unique = dedup_by_id(
        raw,
        |t| t.id.as_str(),
        |t| t.line,
        InputStream::Topics,
        IssueKind::DuplicateTopic,
        "topic",
        issues,
    );

    let names = Interner::intern_sorted(unique.iter().map(|t| t.id.clone()).collect());
    let topics = unique
        .into_iter()
        .enumerate()
        .map(|(i, t)| Topic {
            id: TopicId(i as u32),
            area: t.area,
        })
        .collect();
    (names, topics)
}

/// Collect every program tag that appears anywhere (student inference or
/// supervisor entries) into one sorted interner.
fn intern_programs(
    students: &[RawStudent],
    supervisors: &[RawSupervisor],
    table: &ProgramTable,
) -> Interner {
    let mut tags = BTreeSet::new();
    for s in students {
        tags.insert(table.infer(&s.id));
    }
    for v in supervisors {
        for e in &v.entries {
            tags.insert(table.canonical(&e.program));
        }
    }
    Interner::intern_sorted(tags.into_iter().collect())
}

fn intern_students(
    raw: Vec<RawStudent>,
    topic_names: &Interner,
    program_names: &Interner,
    table: &ProgramTable,
    options: ValidationOptions,
    issues: &mut Vec<Issue>,
) -> (Interner, Vec<Student>) {
    let stream = InputStream::Students;
    let unique = dedup_by_id(
        raw,
        |s| s.id.as_str(),
        |s| s.line,
        stream,
        IssueKind::DuplicateStudent,
        "student",
        issues,
    );

    let names = Interner::intern_sorted(unique.iter().map(|s| s.id.clone()).collect());
    let mut students = Vec::with_capacity(unique.len());

    for (i, raw_student) in unique.into_iter().enumerate() {
        let count = raw_student.preferences.len();
        let count_ok = if options.strict_preference_count {
            count == MAX_PREFERENCES
        } else {
            (MIN_PREFERENCES..=MAX_PREFERENCES).contains(&count)
        };
        if !count_ok {
            let expected = if options.strict_preference_count {
                format!("exactly {MAX_PREFERENCES}")
            } else {
                format!("{MIN_PREFERENCES} to {MAX_PREFERENCES}")
            };
            issues.push(Issue::new(
                stream,
                raw_student.line,
                IssueKind::PreferenceCountOutOfRange,
                format!(
                    "student '{}' lists {count} preference(s), expected {expected}",
                    raw_student.id
                ),
            ));
            continue;
        }

        let mut seen = HashSet::with_capacity(count);
        let mut preferences = Vec::with_capacity(count);
        let mut ok = true;
        for token in &raw_student.preferences {
            if !seen.insert(token.as_str()) {
                issues.push(Issue::new(
                    stream,
                    raw_student.line,
                    IssueKind::DuplicatePreference,
                    format!("student '{}' lists topic '{token}' twice", raw_student.id),
                ));
                ok = false;
                continue;
            }
            match topic_names.get(token) {
                Some(handle) => preferences.push(TopicId(handle)),
                None => {
                    issues.push(Issue::new(
                        stream,
                        raw_student.line,
                        IssueKind::UnknownTopic,
                        format!(
                            "student '{}' lists unknown topic '{token}'",
                            raw_student.id
                        ),
                    ));
                    ok = false;
                }
            }
        }
        if !ok {
            continue;
        }

        let tag = table.infer(&raw_student.id);
        let program = program_names
            .get(&tag)
            .expect("student program tags are interned up front");

        students.push(Student {
            id: StudentId(i as u32),
            program: ProgramId(program),
            preferences,
        });
    }

    (names, students)
}

fn intern_supervisors(
    raw: Vec<RawSupervisor>,
    topic_names: &Interner,
    program_names: &Interner,
    table: &ProgramTable,
    issues: &mut Vec<Issue>,
) -> (Interner, Vec<Supervisor>) {
    let stream = InputStream::Supervisors;
    let unique = dedup_by_id(
        raw,
        |v| v.id.as_str(),
        |v| v.line,
        stream,
        IssueKind::DuplicateSupervisor,
        "supervisor",
        issues,
    );

    let names = Interner::intern_sorted(unique.iter().map(|v| v.id.clone()).collect());
    let mut supervisors = Vec::with_capacity(unique.len());

    for (i, raw_sup) in unique.into_iter().enumerate() {
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&raw_sup.capacity) {
            issues.push(Issue::new(
                stream,
                raw_sup.line,
                IssueKind::CapacityOutOfRange,
                format!(
                    "supervisor '{}' has capacity {}, expected {MIN_CAPACITY} to {MAX_CAPACITY}",
                    raw_sup.id, raw_sup.capacity
                ),
            ));
            continue;
        }

        let mut seen: HashSet<(u32, u32)> = HashSet::with_capacity(raw_sup.entries.len());
        let mut entries = Vec::with_capacity(raw_sup.entries.len());
        let mut ok = true;
        for raw_entry in &raw_sup.entries {
            let Some(topic) = topic_names.get(&raw_entry.topic) else {
                issues.push(Issue::new(
                    stream,
                    raw_sup.line,
                    IssueKind::UnknownTopic,
                    format!(
                        "supervisor '{}' declares unknown topic '{}'",
                        raw_sup.id, raw_entry.topic
                    ),
                ));
                ok = false;
                continue;
            };
            let tag = table.canonical(&raw_entry.program);
            let program = program_names
                .get(&tag)
                .expect("supervisor program tags are interned up front");

            if !seen.insert((program, topic)) {
                issues.push(Issue::new(
                    stream,
                    raw_sup.line,
                    IssueKind::DuplicateEntry,
                    format!(
                        "supervisor '{}' declares '{}:{}' more than once",
                        raw_sup.id, raw_entry.program, raw_entry.topic
                    ),
                ));
                ok = false;
                continue;
            }

            entries.push(ExpertiseEntry {
                program: ProgramId(program),
                topic: TopicId(topic),
                level: raw_entry.level,
            });
        }
        if !ok {
            continue;
        }

        supervisors.push(Supervisor {
            id: SupervisorId(i as u32),
            capacity: raw_sup.capacity as u32,
            entries,
        });
    }

    (names, supervisors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn build(
        students: &str,
        topics: &str,
        supervisors: &str,
        options: ValidationOptions,
    ) -> (Option<Instance>, Vec<Issue>) {
        let mut issues = Vec::new();
        let raw_students = parser::parse_students(students, &mut issues);
        let raw_topics = parser::parse_topics(topics, &mut issues);
        let raw_supervisors = parser::parse_supervisors(supervisors, &mut issues);
        let instance = build_instance(
            raw_students,
            raw_topics,
            raw_supervisors,
            &ProgramTable::new(),
            options,
            &mut issues,
        );
        (instance, issues)
    }

    const TOPICS: &str = "T1: A\nT2: A\nT3: A\nT4: A\nT5: A\n";

    #[test]
    fn test_clean_instance() {
        let (instance, issues) = build(
            "BDBA1: T1, T2, T3\n",
            TOPICS,
            "V1: 3, BDBA:T1:Expert\n",
            ValidationOptions::default(),
        );
        assert!(issues.is_empty(), "{issues:?}");
        let instance = instance.unwrap();
        assert_eq!(instance.students.len(), 1);
        assert_eq!(instance.topics.len(), 5);
        assert_eq!(instance.supervisors.len(), 1);
        assert_eq!(instance.program_name(instance.students[0].program), "BDBA");
    }

    #[test]
    fn test_handles_follow_id_order() {
        let (instance, _) = build(
            "BDBA2: T2\nBDBA1: T1\n",
            TOPICS,
            "V2: 1, BDBA:T2:Expert\nV1: 1, BDBA:T1:Expert\n",
            ValidationOptions::default(),
        );
        let instance = instance.unwrap();
        assert_eq!(instance.student_name(StudentId(0)), "BDBA1");
        assert_eq!(instance.student_name(StudentId(1)), "BDBA2");
        assert_eq!(instance.supervisor_name(SupervisorId(0)), "V1");
    }

    #[test]
    fn test_unknown_topic_in_preferences() {
        let (instance, issues) = build(
            "BDBA1: T1, T9\n",
            TOPICS,
            "V1: 1, BDBA:T1:Expert\n",
            ValidationOptions::default(),
        );
        assert!(instance.is_none());
        assert!(issues.iter().any(|i| i.kind == IssueKind::UnknownTopic));
    }

    #[test]
    fn test_duplicate_preference() {
        let (instance, issues) = build(
            "BDBA1: T1, T1\n",
            TOPICS,
            "V1: 1, BDBA:T1:Expert\n",
            ValidationOptions::default(),
        );
        assert!(instance.is_none());
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::DuplicatePreference));
    }

    #[test]
    fn test_preference_count_bounds() {
        let (instance, issues) = build(
            "BDBA1: T1, T2, T3, T4, T5, T1\n",
            TOPICS,
            "V1: 1, BDBA:T1:Expert\n",
            ValidationOptions::default(),
        );
        assert!(instance.is_none());
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::PreferenceCountOutOfRange));
    }

    #[test]
    fn test_strict_mode_requires_five() {
        let (instance, issues) = build(
            "BDBA1: T1, T2\n",
            TOPICS,
            "V1: 1, BDBA:T1:Expert\n",
            ValidationOptions {
                strict_preference_count: true,
            },
        );
        assert!(instance.is_none());
        assert_eq!(issues[0].kind, IssueKind::PreferenceCountOutOfRange);

        let (instance, issues) = build(
            "BDBA1: T1, T2, T3, T4, T5\n",
            TOPICS,
            "V1: 1, BDBA:T1:Expert\n",
            ValidationOptions {
                strict_preference_count: true,
            },
        );
        assert!(issues.is_empty());
        assert!(instance.is_some());
    }

    #[test]
    fn test_capacity_out_of_range() {
        for capacity in ["0", "11"] {
            let (instance, issues) = build(
                "BDBA1: T1\n",
                TOPICS,
                &format!("V1: {capacity}, BDBA:T1:Expert\n"),
                ValidationOptions::default(),
            );
            assert!(instance.is_none());
            assert!(issues
                .iter()
                .any(|i| i.kind == IssueKind::CapacityOutOfRange));
        }
    }

    #[test]
    fn test_duplicate_records() {
        let (instance, issues) = build(
            "BDBA1: T1\nBDBA1: T2\n",
            "T1: A\nT2: B\nT1: C\n",
            "V1: 1, BDBA:T1:Expert\nV1: 2, BDBA:T2:Expert\n",
            ValidationOptions::default(),
        );
        assert!(instance.is_none());
        assert!(issues.iter().any(|i| i.kind == IssueKind::DuplicateStudent));
        assert!(issues.iter().any(|i| i.kind == IssueKind::DuplicateTopic));
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::DuplicateSupervisor));
    }

    #[test]
    fn test_duplicate_supervisor_entry() {
        let (instance, issues) = build(
            "BDBA1: T1\n",
            TOPICS,
            "V1: 2, BDBA:T1:Expert, BDBA_x:T2:Advanced, BDBA:T1:Beginner\n",
            ValidationOptions::default(),
        );
        assert!(instance.is_none());
        assert!(issues.iter().any(|i| i.kind == IssueKind::DuplicateEntry));
    }

    #[test]
    fn test_entry_program_normalization_collides() {
        // BBA_BDBA and BBA+BDBA are the same program, so two entries for the
        // same topic under both spellings are duplicates.
        let (instance, issues) = build(
            "BDBA1: T1\n",
            TOPICS,
            "V1: 2, BBA_BDBA:T1:Expert, BBA+BDBA:T1:Advanced\n",
            ValidationOptions::default(),
        );
        assert!(instance.is_none());
        assert!(issues.iter().any(|i| i.kind == IssueKind::DuplicateEntry));
    }

    #[test]
    fn test_empty_students_is_valid() {
        let (instance, issues) = build(
            "# nobody enrolled yet\n",
            TOPICS,
            "V1: 1, BDBA:T1:Expert\n",
            ValidationOptions::default(),
        );
        assert!(issues.is_empty());
        assert_eq!(instance.unwrap().students.len(), 0);
    }
}
