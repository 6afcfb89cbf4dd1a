//! Validated instance records.
//!
//! These are the immutable inputs to the matching session: students with
//! ordered preference lists, topics, and supervisors with their expertise
//! declarations. All cross-references are interned handles; the raw id
//! strings live in the [`Instance`] interners for reporting.

use crate::intern::{Interner, ProgramId, StudentId, SupervisorId, TopicId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supervisor expertise for a `(program, topic)` combination.
///
/// The derive order matters: variants are declared weakest first so that
/// `Ord` agrees with Expert > Advanced > Intermediate > Beginner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpertiseLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ExpertiseLevel {
    /// Parse one of the four recognized level tokens (case-sensitive).
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "Expert" => Some(ExpertiseLevel::Expert),
            "Advanced" => Some(ExpertiseLevel::Advanced),
            "Intermediate" => Some(ExpertiseLevel::Intermediate),
            "Beginner" => Some(ExpertiseLevel::Beginner),
            _ => None,
        }
    }

    /// The canonical token for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpertiseLevel::Expert => "Expert",
            ExpertiseLevel::Advanced => "Advanced",
            ExpertiseLevel::Intermediate => "Intermediate",
            ExpertiseLevel::Beginner => "Beginner",
        }
    }
}

impl fmt::Display for ExpertiseLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student with an ordered preference list (1 to 5 distinct topics).
#[derive(Debug, Clone)]
pub struct Student {
    pub id: StudentId,
    /// Bachelor program, inferred from the id prefix at validation time.
    pub program: ProgramId,
    /// Preference order, most preferred first.
    pub preferences: Vec<TopicId>,
}

impl Student {
    /// 0-based position of a topic in this student's preference list.
    pub fn rank_of(&self, topic: TopicId) -> Option<usize> {
        self.preferences.iter().position(|&t| t == topic)
    }
}

/// A project topic. The area string is informational only; it never
/// influences matching.
#[derive(Debug, Clone)]
pub struct Topic {
    pub id: TopicId,
    pub area: String,
}

/// One expertise declaration of a supervisor.
#[derive(Debug, Clone, Copy)]
pub struct ExpertiseEntry {
    pub program: ProgramId,
    pub topic: TopicId,
    pub level: ExpertiseLevel,
}

/// A supervisor with a global capacity and a non-empty set of expertise
/// declarations. Capacity binds across all topics the supervisor ends up
/// owning; topics themselves are uncapacitated.
#[derive(Debug, Clone)]
pub struct Supervisor {
    pub id: SupervisorId,
    pub capacity: u32,
    pub entries: Vec<ExpertiseEntry>,
}

/// A fully validated matching instance.
///
/// Handles are dense and assigned in lexicographic id order (see
/// [`crate::intern`]), so `students[i].id.index() == i` and ordering on
/// handles is ordering on the original ids.
#[derive(Debug, Clone)]
pub struct Instance {
    pub students: Vec<Student>,
    pub topics: Vec<Topic>,
    pub supervisors: Vec<Supervisor>,
    pub student_names: Interner,
    pub topic_names: Interner,
    pub supervisor_names: Interner,
    pub program_names: Interner,
}

impl Instance {
    pub fn student(&self, id: StudentId) -> &Student {
        &self.students[id.index()]
    }

    pub fn topic(&self, id: TopicId) -> &Topic {
        &self.topics[id.index()]
    }

    pub fn supervisor(&self, id: SupervisorId) -> &Supervisor {
        &self.supervisors[id.index()]
    }

    pub fn student_name(&self, id: StudentId) -> &str {
        self.student_names.resolve(id.0)
    }

    pub fn topic_name(&self, id: TopicId) -> &str {
        self.topic_names.resolve(id.0)
    }

    pub fn supervisor_name(&self, id: SupervisorId) -> &str {
        self.supervisor_names.resolve(id.0)
    }

    pub fn program_name(&self, id: ProgramId) -> &str {
        self.program_names.resolve(id.0)
    }

    /// Longest preference list in the instance (0 for no students).
    pub fn max_preference_len(&self) -> usize {
        self.students
            .iter()
            .map(|s| s.preferences.len())
            .max()
            .unwrap_or(0)
    }
}
