use std::collections::HashSet;

use db::models::{applicant::Applicant, task::Task};

/// How many more volunteers `task` can take. Never negative.
pub fn remaining_capacity(task: &Task, accepted: &[Applicant]) -> u32 {
    let accepted_count = accepted
        .iter()
        .filter(|applicant| applicant.is_accepted())
        .count();
    let accepted_count = u32::try_from(accepted_count).unwrap_or(u32::MAX);

    task.required_volunteers().saturating_sub(accepted_count)
}

/// Whether one more applicant can join a selection of `current_selection_size`.
pub fn can_select(current_selection_size: usize, remaining_capacity: u32) -> bool {
    current_selection_size < remaining_capacity as usize
}

/// PENDING applicants whose user is not already ACCEPTED on the same task.
pub fn pending_candidates(applicants: &[Applicant]) -> Vec<Applicant> {
    let accepted_users: HashSet<i64> = applicants
        .iter()
        .filter(|applicant| applicant.is_accepted())
        .map(|applicant| applicant.user_id)
        .collect();

    applicants
        .iter()
        .filter(|applicant| applicant.is_pending() && !accepted_users.contains(&applicant.user_id))
        .cloned()
        .collect()
}

/// Applicant ids picked for assignment in pick order, bounded by the task's remaining capacity.
#[derive(Debug, Clone, Default)]
pub struct VolunteerSelection {
    remaining_capacity: u32,
    selected: Vec<i64>,
}

impl VolunteerSelection {
    pub fn new(remaining_capacity: u32) -> Self {
        Self {
            remaining_capacity,
            selected: Vec::new(),
        }
    }

    /// Removes `applicant_id` if selected, otherwise adds it while capacity allows.
    /// Returns whether the applicant is selected afterwards.
    pub fn toggle(&mut self, applicant_id: i64) -> bool {
        if let Some(index) = self.selected.iter().position(|id| *id == applicant_id) {
            self.selected.remove(index);
            return false;
        }
        if !self.can_add() {
            return false;
        }
        self.selected.push(applicant_id);
        true
    }

    pub fn can_add(&self) -> bool {
        can_select(self.selected.len(), self.remaining_capacity)
    }

    pub fn is_selected(&self, applicant_id: i64) -> bool {
        self.selected.contains(&applicant_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.remaining_capacity
    }

    pub fn ids(&self) -> Vec<i64> {
        self.selected.clone()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
