//! Works out which units of a path a learner can open.
//!
//! The walk follows progression order. Completed units stay open so they can
//! be revisited, the first unit that is not completed is the one to do next,
//! and everything after it is locked. Completing a later unit out of order
//! does not move the resume point: the earliest gap is still the next unit.

use std::collections::HashSet;

use crate::path::{LearningPath, LearningUnit, Module, UnitId};

/// Units a learner has finished: what the record store confirmed plus what was
/// completed locally and may not be written yet. Ids are only ever added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionSet {
    persisted: HashSet<UnitId>,
    local: HashSet<UnitId>,
}

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_persisted(persisted: HashSet<UnitId>) -> Self {
        Self {
            persisted,
            local: HashSet::new(),
        }
    }

    pub fn contains(&self, unit_id: &str) -> bool {
        self.persisted.contains(unit_id) || self.local.contains(unit_id)
    }

    /// Records a completion that has not reached the store yet.
    pub fn mark_local(&mut self, unit_id: impl Into<UnitId>) {
        let unit_id = unit_id.into();
        if !self.persisted.contains(&unit_id) {
            self.local.insert(unit_id);
        }
    }

    /// Moves a local completion over once the store has it.
    pub fn mark_persisted(&mut self, unit_id: &str) {
        if let Some(unit_id) = self.local.take(unit_id) {
            self.persisted.insert(unit_id);
        }
    }

    pub fn merge_persisted(&mut self, ids: impl IntoIterator<Item = UnitId>) {
        for id in ids {
            self.local.remove(&id);
            self.persisted.insert(id);
        }
    }

    pub fn unpersisted(&self) -> impl Iterator<Item = &UnitId> {
        self.local.iter()
    }

    pub fn len(&self) -> usize {
        self.persisted.len() + self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<UnitId> for CompletionSet {
    fn from_iter<I: IntoIterator<Item = UnitId>>(iter: I) -> Self {
        Self::from_persisted(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Locked,
    Unlocked,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitProgress<'a> {
    pub unit: &'a LearningUnit,
    pub is_locked: bool,
    pub is_completed: bool,
}

impl UnitProgress<'_> {
    pub fn status(&self) -> UnitStatus {
        if self.is_completed {
            UnitStatus::Completed
        } else if self.is_locked {
            UnitStatus::Locked
        } else {
            UnitStatus::Unlocked
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleProgress<'a> {
    pub module: &'a Module,
    pub units: Vec<UnitProgress<'a>>,
}

/// A path annotated with one learner's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathBoard<'a> {
    pub path: &'a LearningPath,
    pub modules: Vec<ModuleProgress<'a>>,
}

pub fn resolve<'a>(path: &'a LearningPath, completed: &CompletionSet) -> PathBoard<'a> {
    let mut next_unlock_assigned = false;

    let mut modules = path
        .modules
        .iter()
        .map(|module| {
            let units = module
                .units
                .iter()
                .map(|unit| {
                    if completed.contains(&unit.id) {
                        UnitProgress {
                            unit,
                            is_locked: false,
                            is_completed: true,
                        }
                    } else if !next_unlock_assigned {
                        next_unlock_assigned = true;
                        UnitProgress {
                            unit,
                            is_locked: false,
                            is_completed: false,
                        }
                    } else {
                        UnitProgress {
                            unit,
                            is_locked: true,
                            is_completed: false,
                        }
                    }
                })
                .collect();
            ModuleProgress { module, units }
        })
        .collect::<Vec<_>>();

    // A fresh path always has somewhere to start.
    if let Some(first) = modules.first_mut().and_then(|m| m.units.first_mut()) {
        first.is_locked = false;
    }

    PathBoard { path, modules }
}

impl<'a> PathBoard<'a> {
    pub fn units(&self) -> impl Iterator<Item = &UnitProgress<'a>> {
        self.modules.iter().flat_map(|m| m.units.iter())
    }

    pub fn unit(&self, unit_id: &str) -> Option<&UnitProgress<'a>> {
        self.units().find(|u| u.unit.id == unit_id)
    }

    pub fn status_of(&self, unit_id: &str) -> Option<UnitStatus> {
        self.unit(unit_id).map(UnitProgress::status)
    }

    /// The unlocked unit that still has to be done, if any.
    pub fn next_unit(&self) -> Option<&UnitProgress<'a>> {
        self.units().find(|u| !u.is_locked && !u.is_completed)
    }

    pub fn total_units(&self) -> usize {
        self.units().count()
    }

    pub fn completed_count(&self) -> usize {
        self.units().filter(|u| u.is_completed).count()
    }

    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.completed_count(), self.total_units())
    }

    pub fn is_mastered(&self) -> bool {
        self.total_units() > 0 && self.completed_count() == self.total_units()
    }
}

/// `round(100 * completed / total)`, 0 for an empty path.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u64;
    let total = total as u64;
    ((completed * 200 + total) / (total * 2)) as u8
}
