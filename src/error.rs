//! Input error taxonomy.
//!
//! Parsing and validation accumulate every issue they find instead of
//! stopping at the first; the matcher only runs when the issue list is empty.
//! The engine itself never produces errors at runtime, only diagnostic events
//! (see [`crate::engine`]).

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which input stream an issue was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputStream {
    Students,
    Topics,
    Supervisors,
}

impl fmt::Display for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputStream::Students => f.write_str("students"),
            InputStream::Topics => f.write_str("topics"),
            InputStream::Supervisors => f.write_str("supervisors"),
        }
    }
}

/// Classification of a single input issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    // Syntax issues
    /// Line has no `:` separating identifier from payload.
    MissingColon,
    /// Identifier contains characters outside `[A-Za-z0-9+_]` or is empty.
    InvalidIdentifier,
    /// A field that should be a decimal integer is not.
    BadInteger,
    /// Expertise level token is not one of the four recognized ones.
    InvalidLevel,
    /// Supervisor entry does not have the `Bachelor:Topic:Level` shape.
    MalformedEntry,

    // Semantic issues
    /// Referenced topic does not exist in the topics catalog.
    UnknownTopic,
    /// Topic id declared more than once.
    DuplicateTopic,
    /// Student id declared more than once.
    DuplicateStudent,
    /// Supervisor id declared more than once.
    DuplicateSupervisor,
    /// Supervisor declared the same `(program, topic)` pair twice.
    DuplicateEntry,
    /// Student listed the same topic twice.
    DuplicatePreference,
    /// Preference list length outside the accepted range.
    PreferenceCountOutOfRange,
    /// Supervisor capacity outside `[1, 10]`.
    CapacityOutOfRange,
    /// Topic line has no area string.
    MissingArea,
    /// Supervisor line has a capacity but no expertise entries.
    EmptySupervisorEntries,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueKind::MissingColon => "MissingColon",
            IssueKind::InvalidIdentifier => "InvalidIdentifier",
            IssueKind::BadInteger => "BadInteger",
            IssueKind::InvalidLevel => "InvalidLevel",
            IssueKind::MalformedEntry => "MalformedEntry",
            IssueKind::UnknownTopic => "UnknownTopic",
            IssueKind::DuplicateTopic => "DuplicateTopic",
            IssueKind::DuplicateStudent => "DuplicateStudent",
            IssueKind::DuplicateSupervisor => "DuplicateSupervisor",
            IssueKind::DuplicateEntry => "DuplicateEntry",
            IssueKind::DuplicatePreference => "DuplicatePreference",
            IssueKind::PreferenceCountOutOfRange => "PreferenceCountOutOfRange",
            IssueKind::CapacityOutOfRange => "CapacityOutOfRange",
            IssueKind::MissingArea => "MissingArea",
            IssueKind::EmptySupervisorEntries => "EmptySupervisorEntries",
        };
        f.write_str(name)
    }
}

/// One parsing or validation issue, tied to the input line that caused it.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    /// Input stream the issue was found in.
    pub stream: InputStream,
    /// 1-based line number in that stream.
    pub line: usize,
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(
        stream: InputStream,
        line: usize,
        kind: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Issue {
            stream,
            line,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.stream, self.line, self.kind, self.message
        )
    }
}

/// Failure to turn raw input into a valid [`crate::model::Instance`].
#[derive(Error, Debug)]
pub enum LoadError {
    /// Reading an input file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// One or more parsing/validation issues; the matcher was not run.
    #[error("input validation failed with {} issue(s)", .0.len())]
    Validation(Vec<Issue>),
}

impl LoadError {
    /// The accumulated issues, if this is a validation failure.
    pub fn issues(&self) -> &[Issue] {
        match self {
            LoadError::Validation(issues) => issues,
            LoadError::Io { .. } => &[],
        }
    }
}
