use std::time::{Duration, Instant};

use log::{debug, info};

use crate::path::progress::{PathBoard, UnitStatus};
use crate::path::LearningUnit;
use crate::quiz::intercept::Evaluation;

/// Score recorded for units that have nothing to evaluate.
pub const FULL_SCORE: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpenUnitError {
    #[error("there is no unit {0} on this path")]
    UnknownUnit(String),

    #[error("unit {0} is locked")]
    Locked(String),
}

/// The parts of a unit, in the order they unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    Concept,
    Video,
    Evaluation,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Concept => Some(Stage::Video),
            Stage::Video => Some(Stage::Evaluation),
            Stage::Evaluation => None,
        }
    }
}

pub enum EvaluationStart {
    Play(Evaluation),
    /// The unit has no questions and completes outright.
    Skip { score: u8 },
}

/// An open unit. Dropping it discards everything done inside it.
#[derive(Debug, Clone)]
pub struct UnitVisit {
    unit: LearningUnit,
    opened_at: Instant,
    stage: Stage,
    furthest: Stage,
}

impl UnitVisit {
    pub fn open(board: &PathBoard, unit_id: &str) -> Result<Self, OpenUnitError> {
        Self::open_at(board, unit_id, Instant::now())
    }

    pub fn open_at(board: &PathBoard, unit_id: &str, opened_at: Instant) -> Result<Self, OpenUnitError> {
        let progress = board
            .unit(unit_id)
            .ok_or_else(|| OpenUnitError::UnknownUnit(unit_id.to_string()))?;
        if progress.status() == UnitStatus::Locked {
            return Err(OpenUnitError::Locked(unit_id.to_string()));
        }
        info!("Opening unit {}", unit_id);
        Ok(Self {
            unit: progress.unit.clone(),
            opened_at,
            stage: Stage::Concept,
            furthest: Stage::Concept,
        })
    }

    pub fn unit(&self) -> &LearningUnit {
        &self.unit
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_unlocked(&self, stage: Stage) -> bool {
        stage <= self.furthest
    }

    /// Moves to the stage after the current one, unlocking it.
    pub fn advance(&mut self) -> Stage {
        if let Some(next) = self.stage.next() {
            self.stage = next;
            self.furthest = self.furthest.max(next);
            debug!("Unit {} moved to {:?}", self.unit.id, next);
        }
        self.stage
    }

    /// Jumps back or forth between stages that are already unlocked.
    pub fn go_to(&mut self, stage: Stage) -> bool {
        if !self.is_unlocked(stage) {
            return false;
        }
        self.stage = stage;
        true
    }

    /// `None` until the evaluation stage has been unlocked.
    pub fn begin_evaluation(&self) -> Option<EvaluationStart> {
        if !self.is_unlocked(Stage::Evaluation) {
            return None;
        }
        if !self.unit.has_evaluation() {
            return Some(EvaluationStart::Skip { score: FULL_SCORE });
        }
        Some(EvaluationStart::Play(Evaluation::start(
            self.unit.quiz_questions.clone(),
        )))
    }

    pub fn time_open(&self) -> Duration {
        self.time_open_at(Instant::now())
    }

    pub fn time_open_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.opened_at)
    }
}
