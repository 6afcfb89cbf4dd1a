//! Ownership catalog: which supervisor owns which `(topic, program)` pair.
//!
//! Raw expertise declarations may overlap; the catalog resolves each
//! `(topic, program)` combination to the single owning supervisor with the
//! highest declared level, breaking ties by lexicographically smallest
//! supervisor id. The matching engine and the stability checker both consult
//! the catalog; neither ever looks at raw entries again.

use crate::intern::{ProgramId, SupervisorId, TopicId};
use crate::model::{ExpertiseLevel, Instance};
use std::collections::HashMap;

/// Resolved owner of one `(topic, program)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub supervisor: SupervisorId,
    pub level: ExpertiseLevel,
}

/// Derived `(topic, program)` to supervisor mapping.
#[derive(Debug, Clone)]
pub struct OwnershipCatalog {
    owners: HashMap<(TopicId, ProgramId), Owner>,
    /// Owned combinations per supervisor, sorted, for diagnostics.
    by_supervisor: Vec<Vec<(TopicId, ProgramId)>>,
}

impl OwnershipCatalog {
    /// Resolve ownership for every declared `(topic, program)` pair.
    ///
    /// Supervisors are scanned in handle order, which is lexicographic id
    /// order, and an owner is only displaced by a strictly higher level;
    /// ties therefore settle on the smallest id without a separate pass.
    pub fn build(instance: &Instance) -> Self {
        let mut owners: HashMap<(TopicId, ProgramId), Owner> = HashMap::new();

        for supervisor in &instance.supervisors {
            for entry in &supervisor.entries {
                let key = (entry.topic, entry.program);
                let candidate = Owner {
                    supervisor: supervisor.id,
                    level: entry.level,
                };
                owners
                    .entry(key)
                    .and_modify(|current| {
                        if candidate.level > current.level {
                            *current = candidate;
                        }
                    })
                    .or_insert(candidate);
            }
        }

        let mut by_supervisor = vec![Vec::new(); instance.supervisors.len()];
        for (&(topic, program), owner) in &owners {
            by_supervisor[owner.supervisor.index()].push((topic, program));
        }
        for owned in &mut by_supervisor {
            owned.sort();
        }

        OwnershipCatalog {
            owners,
            by_supervisor,
        }
    }

    /// The owning supervisor for `(topic, program)`, if any supervisor
    /// declared that combination.
    pub fn owner(&self, topic: TopicId, program: ProgramId) -> Option<SupervisorId> {
        self.owners.get(&(topic, program)).map(|o| o.supervisor)
    }

    /// Owner plus its declared level, as needed by the derived preference
    /// comparator.
    pub fn owner_entry(&self, topic: TopicId, program: ProgramId) -> Option<Owner> {
        self.owners.get(&(topic, program)).copied()
    }

    /// All `(topic, program)` combinations a supervisor ended up owning.
    pub fn topics_of(&self, supervisor: SupervisorId) -> &[(TopicId, ProgramId)] {
        &self.by_supervisor[supervisor.index()]
    }

    /// Number of resolved combinations.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
