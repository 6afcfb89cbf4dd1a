//! Mutable matching-session state.
//!
//! All four state tables (`Assignment`, `Load`, `Cursor`, `StudentStatus`)
//! are dense vectors indexed by interned handles. The engine has exclusive
//! ownership while a session runs; between rounds the state is inspectable
//! read-only, and the final state moves into the
//! [`MatchOutcome`](crate::engine::MatchOutcome).

use crate::catalog::OwnershipCatalog;
use crate::intern::{StudentId, SupervisorId, TopicId};
use crate::model::Instance;

/// Where a student currently stands in the proposal process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentStatus {
    /// Unmatched with preferences still to propose.
    Unproposed,
    /// Currently holds an assignment (may still be evicted).
    Matched,
    /// Unmatched and out of preferences; terminal.
    Exhausted,
}

/// The mutable state of one matching session.
#[derive(Debug, Clone)]
pub struct MatchState {
    /// Student to assigned topic (partial).
    assignment: Vec<Option<TopicId>>,
    /// Supervisor to current number of assigned students.
    load: Vec<u32>,
    /// Student to next preference index (0-based, monotone).
    cursor: Vec<usize>,
    status: Vec<StudentStatus>,
    /// Supervisor to currently assigned students, insertion order.
    assigned: Vec<Vec<StudentId>>,
}

impl MatchState {
    pub fn new(num_students: usize, num_supervisors: usize) -> Self {
        MatchState {
            assignment: vec![None; num_students],
            load: vec![0; num_supervisors],
            cursor: vec![0; num_students],
            status: vec![StudentStatus::Unproposed; num_students],
            assigned: vec![Vec::new(); num_supervisors],
        }
    }

    pub fn assignment(&self, student: StudentId) -> Option<TopicId> {
        self.assignment[student.index()]
    }

    pub fn load(&self, supervisor: SupervisorId) -> u32 {
        self.load[supervisor.index()]
    }

    pub fn cursor(&self, student: StudentId) -> usize {
        self.cursor[student.index()]
    }

    pub fn status(&self, student: StudentId) -> StudentStatus {
        self.status[student.index()]
    }

    /// Students currently assigned to a supervisor (the set `C(v)`).
    pub fn assigned_students(&self, supervisor: SupervisorId) -> &[StudentId] {
        &self.assigned[supervisor.index()]
    }

    /// Consume the next preference slot. The cursor moves regardless of the
    /// proposal's outcome; a used preference is never proposed again.
    pub fn advance_cursor(&mut self, student: StudentId) {
        self.cursor[student.index()] += 1;
    }

    /// Step the cursor back one slot so the topic just lost to eviction is
    /// retried. Only used in the non-default retry mode.
    pub fn rewind_cursor(&mut self, student: StudentId) {
        debug_assert!(self.cursor[student.index()] > 0);
        self.cursor[student.index()] -= 1;
    }

    pub fn mark_exhausted(&mut self, student: StudentId) {
        debug_assert!(self.assignment[student.index()].is_none());
        self.status[student.index()] = StudentStatus::Exhausted;
    }

    /// Record an acceptance: assign `student` to `topic` under `supervisor`.
    pub fn assign(&mut self, student: StudentId, topic: TopicId, supervisor: SupervisorId) {
        debug_assert!(self.assignment[student.index()].is_none());
        self.assignment[student.index()] = Some(topic);
        self.load[supervisor.index()] += 1;
        self.assigned[supervisor.index()].push(student);
        self.status[student.index()] = StudentStatus::Matched;
    }

    /// Undo a student's assignment under `supervisor`, returning the topic
    /// it held. The cursor is untouched; the student re-proposes from where
    /// it left off in the next round.
    pub fn evict(&mut self, student: StudentId, supervisor: SupervisorId) -> TopicId {
        let topic = self.assignment[student.index()]
            .take()
            .expect("evicted student must hold an assignment");
        self.load[supervisor.index()] -= 1;
        let held = &mut self.assigned[supervisor.index()];
        let pos = held
            .iter()
            .position(|&s| s == student)
            .expect("evicted student must be in the supervisor's set");
        held.remove(pos);
        self.status[student.index()] = StudentStatus::Unproposed;
        topic
    }

    /// Number of students currently matched.
    pub fn matched_count(&self) -> usize {
        self.assignment.iter().filter(|a| a.is_some()).count()
    }

    /// All current `(student, topic)` pairs in student order.
    pub fn iter_assignments(&self) -> impl Iterator<Item = (StudentId, TopicId)> + '_ {
        self.assignment
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.map(|t| (StudentId(i as u32), t)))
    }

    /// Check the session invariants. Violations are programmer errors, so
    /// this panics; the engine calls it at round boundaries in debug builds.
    pub fn verify_invariants(&self, instance: &Instance, catalog: &OwnershipCatalog) {
        for student in &instance.students {
            let idx = student.id.index();
            // Cursor never runs past the preference list.
            assert!(self.cursor[idx] <= student.preferences.len());

            match self.assignment[idx] {
                Some(topic) => {
                    // A held topic comes from the student's own list and its
                    // owner accounts for the student.
                    assert!(student.rank_of(topic).is_some());
                    let owner = catalog
                        .owner(topic, student.program)
                        .expect("assigned topic must have an owner");
                    assert!(self.assigned[owner.index()].contains(&student.id));
                    assert_eq!(self.status[idx], StudentStatus::Matched);
                }
                None => {
                    if self.status[idx] == StudentStatus::Exhausted {
                        assert_eq!(self.cursor[idx], student.preferences.len());
                    }
                }
            }
        }

        let mut seen_assigned = 0;
        for supervisor in &instance.supervisors {
            let idx = supervisor.id.index();
            assert!(self.load[idx] <= supervisor.capacity);
            assert_eq!(self.load[idx] as usize, self.assigned[idx].len());
            seen_assigned += self.assigned[idx].len();
        }
        // Each matched student is held by exactly one supervisor.
        assert_eq!(seen_assigned, self.matched_count());
    }
}
