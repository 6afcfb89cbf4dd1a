//! # Input Stream Parser
//!
//! Lexes the three line-oriented input streams (students, topics,
//! supervisors) into raw string records. Handles `#` line comments, blank
//! lines, CRLF endings, and whitespace trimming around every field.
//!
//! The parser is purely syntactic: it checks line shape, identifier grammar,
//! integer and level tokens, and accumulates an [`Issue`] per problem instead
//! of stopping. Cross-record checks (unknown topics, duplicates, ranges) are
//! the job of [`crate::validate`].
//!
//! ## Grammar
//!
//! ```text
//! students:     <StudentId> ":" <TopicId> ("," <TopicId>){0,4}
//! topics:       <TopicId> ":" <Area>
//! supervisors:  <SupervisorId> ":" <Capacity> ("," <Bachelor> ":" <Topic> ":" <Level>)+
//! ```
//!
//! Identifiers are non-empty runs of ASCII alphanumerics plus the connectors
//! `+` and `_`. `<Area>` is the trimmed remainder of the line and may contain
//! spaces.

use crate::error::{InputStream, Issue, IssueKind};
use crate::model::ExpertiseLevel;

/// Unvalidated student record.
#[derive(Debug, Clone)]
pub struct RawStudent {
    pub line: usize,
    pub id: String,
    pub preferences: Vec<String>,
}

/// Unvalidated topic record.
#[derive(Debug, Clone)]
pub struct RawTopic {
    pub line: usize,
    pub id: String,
    pub area: String,
}

/// Unvalidated supervisor expertise entry.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub program: String,
    pub topic: String,
    pub level: ExpertiseLevel,
}

/// Unvalidated supervisor record.
#[derive(Debug, Clone)]
pub struct RawSupervisor {
    pub line: usize,
    pub id: String,
    pub capacity: i64,
    pub entries: Vec<RawEntry>,
}

/// Check the identifier grammar: non-empty, ASCII alphanumerics and `+`/`_`.
pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '_')
}

/// Iterate the non-comment, non-blank lines of a stream as
/// `(1-based line number, trimmed content)`.
///
/// A line whose first non-whitespace character is `#` is a comment. CRLF
/// endings are handled by the trim.
fn logical_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(i, raw)| {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            None
        } else {
            Some((i + 1, line))
        }
    })
}

/// Split a logical line at its first colon into `(identifier, payload)`.
///
/// Emits `MissingColon` or `InvalidIdentifier` and returns `None` when the
/// line does not have the `LHS: RHS` shape.
fn split_lhs_rhs<'a>(
    stream: InputStream,
    line_no: usize,
    line: &'a str,
    issues: &mut Vec<Issue>,
) -> Option<(&'a str, &'a str)> {
    let Some((lhs, rhs)) = line.split_once(':') else {
        issues.push(Issue::new(
            stream,
            line_no,
            IssueKind::MissingColon,
            format!("expected '<id>: <payload>', got '{line}'"),
        ));
        return None;
    };
    let lhs = lhs.trim();
    if !is_valid_identifier(lhs) {
        issues.push(Issue::new(
            stream,
            line_no,
            IssueKind::InvalidIdentifier,
            format!("'{lhs}' is not a valid identifier"),
        ));
        return None;
    }
    Some((lhs, rhs.trim()))
}

/// Parse the students stream.
///
/// Each record is a student id and a comma-separated preference list. List
/// length and token uniqueness are validated later; here only the token
/// grammar is checked.
pub fn parse_students(text: &str, issues: &mut Vec<Issue>) -> Vec<RawStudent> {
    let stream = InputStream::Students;
    let mut records = Vec::new();

    for (line_no, line) in logical_lines(text) {
        let Some((id, payload)) = split_lhs_rhs(stream, line_no, line, issues) else {
            continue;
        };

        let mut preferences = Vec::new();
        let mut ok = true;
        for token in payload.split(',') {
            let token = token.trim();
            if !is_valid_identifier(token) {
                issues.push(Issue::new(
                    stream,
                    line_no,
                    IssueKind::InvalidIdentifier,
                    format!("preference token '{token}' of student '{id}' is not a valid topic id"),
                ));
                ok = false;
                continue;
            }
            preferences.push(token.to_string());
        }

        if ok {
            records.push(RawStudent {
                line: line_no,
                id: id.to_string(),
                preferences,
            });
        }
    }

    records
}

/// Parse the topics stream.
///
/// The payload is a single free-form area string (spaces allowed); an empty
/// payload is `MissingArea`.
pub fn parse_topics(text: &str, issues: &mut Vec<Issue>) -> Vec<RawTopic> {
    let stream = InputStream::Topics;
    let mut records = Vec::new();

    for (line_no, line) in logical_lines(text) {
        let Some((id, area)) = split_lhs_rhs(stream, line_no, line, issues) else {
            continue;
        };

        if area.is_empty() {
            issues.push(Issue::new(
                stream,
                line_no,
                IssueKind::MissingArea,
                format!("topic '{id}' has no area"),
            ));
            continue;
        }

        records.push(RawTopic {
            line: line_no,
            id: id.to_string(),
            area: area.to_string(),
        });
    }

    records
}

/// Parse one `Bachelor:Topic:Level` entry of a supervisor line.
fn parse_entry(
    line_no: usize,
    supervisor: &str,
    token: &str,
    issues: &mut Vec<Issue>,
) -> Option<RawEntry> {
    let stream = InputStream::Supervisors;
    let fields: Vec<&str> = token.split(':').map(str::trim).collect();
    if fields.len() != 3 {
        issues.push(Issue::new(
            stream,
            line_no,
            IssueKind::MalformedEntry,
            format!("entry '{token}' of supervisor '{supervisor}' is not 'Bachelor:Topic:Level'"),
        ));
        return None;
    }

    let (program, topic, level_token) = (fields[0], fields[1], fields[2]);
    if !is_valid_identifier(program) || !is_valid_identifier(topic) {
        issues.push(Issue::new(
            stream,
            line_no,
            IssueKind::InvalidIdentifier,
            format!("entry '{token}' of supervisor '{supervisor}' has an invalid identifier"),
        ));
        return None;
    }

    let Some(level) = ExpertiseLevel::parse(level_token) else {
        issues.push(Issue::new(
            stream,
            line_no,
            IssueKind::InvalidLevel,
            format!(
                "'{level_token}' is not a recognized level \
                 (expected Expert, Advanced, Intermediate or Beginner)"
            ),
        ));
        return None;
    };

    Some(RawEntry {
        program: program.to_string(),
        topic: topic.to_string(),
        level,
    })
}

/// Parse the supervisors stream.
///
/// The payload is a capacity integer followed by one or more
/// `Bachelor:Topic:Level` entries. Capacity range and entry uniqueness are
/// validated later.
pub fn parse_supervisors(text: &str, issues: &mut Vec<Issue>) -> Vec<RawSupervisor> {
    let stream = InputStream::Supervisors;
    let mut records = Vec::new();

    for (line_no, line) in logical_lines(text) {
        let Some((id, payload)) = split_lhs_rhs(stream, line_no, line, issues) else {
            continue;
        };

        let mut fields = payload.split(',').map(str::trim);
        let capacity_token = fields.next().unwrap_or("");
        let capacity: i64 = match capacity_token.parse() {
            Ok(n) => n,
            Err(_) => {
                issues.push(Issue::new(
                    stream,
                    line_no,
                    IssueKind::BadInteger,
                    format!(
                        "capacity '{capacity_token}' of supervisor '{id}' is not a decimal integer"
                    ),
                ));
                continue;
            }
        };

        let mut entries = Vec::new();
        let mut entry_ok = true;
        for token in fields {
            match parse_entry(line_no, id, token, issues) {
                Some(entry) => entries.push(entry),
                None => entry_ok = false,
            }
        }

        if entries.is_empty() && entry_ok {
            issues.push(Issue::new(
                stream,
                line_no,
                IssueKind::EmptySupervisorEntries,
                format!("supervisor '{id}' declares no expertise entries"),
            ));
            continue;
        }

        if entry_ok {
            records.push(RawSupervisor {
                line: line_no,
                id: id.to_string(),
                capacity,
                entries,
            });
        }
    }

    records
}
