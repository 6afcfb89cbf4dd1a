//! Bachelor-program inference.
//!
//! The input format carries no explicit program field; a student's bachelor
//! program is inferred from the leading alphabetic run of the student id
//! (`BDBA17` is a `BDBA` student). Dual-degree tags use `+` as connector and
//! `_` is accepted as an equivalent spelling (`BBA_BDBA` reads as
//! `BBA+BDBA`), in student ids and supervisor entries alike.
//!
//! Institutions rename programs over time, so the table supports aliases
//! (old tag to canonical tag) loaded from configuration. Tags without an
//! alias pass through unchanged; the set of programs is open.

use std::collections::BTreeMap;

/// Canonical spelling of a program tag: `_` and `+` are the same connector.
pub fn normalize_tag(tag: &str) -> String {
    tag.replace('_', "+")
}

/// Table-driven program inference strategy.
///
/// The only program-specific logic in the crate lives here; the matching
/// engine sees opaque interned program handles.
#[derive(Debug, Clone, Default)]
pub struct ProgramTable {
    /// Normalized alias to canonical tag.
    aliases: BTreeMap<String, String>,
}

impl ProgramTable {
    /// Table with no aliases: every normalized tag is its own program.
    pub fn new() -> Self {
        ProgramTable {
            aliases: BTreeMap::new(),
        }
    }

    /// Build a table from alias pairs (as configured under
    /// `programs.prefixes`). Both sides are normalized.
    pub fn with_aliases<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let aliases = pairs
            .into_iter()
            .map(|(alias, canonical)| {
                (
                    normalize_tag(alias.as_ref()),
                    normalize_tag(canonical.as_ref()),
                )
            })
            .collect();
        ProgramTable { aliases }
    }

    /// Canonicalize an explicit program tag (supervisor entry field).
    pub fn canonical(&self, tag: &str) -> String {
        let normalized = normalize_tag(tag);
        self.aliases
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Infer the program of a student from its id: the leading run of
    /// letters and connectors, canonicalized. Empty when the id starts with
    /// a digit.
    pub fn infer(&self, student_id: &str) -> String {
        let prefix: String = student_id
            .chars()
            .take_while(|c| c.is_ascii_alphabetic() || *c == '_' || *c == '+')
            .collect();
        self.canonical(&prefix)
    }
}
