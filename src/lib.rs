//! # Topicmatch
//!
//! A deterministic student-project allocation core: students rank up to five
//! topics, supervisors declare per-program expertise and a global capacity,
//! and an iterated proposal procedure produces a stable assignment in the
//! style of the SPA-student algorithm of Abraham, Irving and Manlove (2007).
//!
//! ## Pipeline Architecture
//!
//! ```text
//! students / topics / supervisors streams
//!     ↓
//! [Parser]              → raw records, syntax issues
//!     ↓
//! [Validator]           → interned Instance, semantic issues
//!     ↓
//! [Ownership Catalog]   → (topic, program) → supervisor
//!     ↓
//! [Matching Engine]     → Assignment + diagnostics + round log
//!     ↓
//! [Stability / Metrics] → blocking pairs, classification, statistics
//!     ↓
//! [Report]              → text / JSON / CSV
//! ```
//!
//! All errors surface before the engine runs; the engine itself is a pure
//! function from a validated instance to an outcome and cannot fail. Re-runs
//! on identical input produce identical assignments, diagnostics and round
//! logs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use topicmatch::{Config, Report};
//!
//! let config = Config::load()?;
//! let instance = topicmatch::load_instance(&students, &topics, &supervisors, &config)?;
//! let (catalog, outcome) = topicmatch::run_matching(&instance, config.match_options());
//! let report = Report::build(&instance, &catalog, &outcome);
//! println!("{}", report.render_text());
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod intern;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod programs;
pub mod report;
pub mod stability;
pub mod validate;

// Re-export the public surface
pub use catalog::OwnershipCatalog;
pub use config::{Config, ReportFormat};
pub use engine::{
    DiagnosticEvent, MatchOptions, MatchOutcome, MatchState, MatchingEngine, RoundRecord,
    StudentStatus,
};
pub use error::{InputStream, Issue, IssueKind, LoadError};
pub use intern::{ProgramId, StudentId, SupervisorId, TopicId};
pub use metrics::{ConstraintViolation, MatchMetrics};
pub use model::{ExpertiseLevel, Instance, Student, Supervisor, Topic};
pub use programs::ProgramTable;
pub use report::Report;
pub use stability::{BlockingPair, UnmatchedReason, UnmatchedStudent};
pub use validate::ValidationOptions;

/// Parse, validate and intern the three input streams.
///
/// Accumulates every syntax and semantic issue across all three streams and
/// fails with the complete list; a partially valid input never reaches the
/// engine.
pub fn load_instance(
    students: &str,
    topics: &str,
    supervisors: &str,
    config: &Config,
) -> Result<Instance, LoadError> {
    let table = config.program_table();
    let mut issues = Vec::new();

    let raw_students = parser::parse_students(students, &mut issues);
    let raw_topics = parser::parse_topics(topics, &mut issues);
    let raw_supervisors = parser::parse_supervisors(supervisors, &mut issues);

    match validate::build_instance(
        raw_students,
        raw_topics,
        raw_supervisors,
        &table,
        config.validation_options(),
        &mut issues,
    ) {
        Some(instance) => Ok(instance),
        None => Err(LoadError::Validation(issues)),
    }
}

/// Build the ownership catalog and run the proposal rounds.
pub fn run_matching(
    instance: &Instance,
    options: MatchOptions,
) -> (OwnershipCatalog, MatchOutcome) {
    let catalog = OwnershipCatalog::build(instance);
    let outcome = MatchingEngine::new(instance, &catalog, options).run();
    (catalog, outcome)
}
