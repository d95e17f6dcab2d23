//! The intercept mini-game played at the end of a unit.
//!
//! Every option of the current question rises through its own lane as a
//! target. Catching the correct target scores and moves on to the next
//! question once [`ADVANCE_DELAY`] has elapsed; catching a wrong one costs a
//! life and some score. The game is an [`EvaluationState`] value moved
//! through [`EvaluationState::on_event`]; [`Evaluation`] owns the questions
//! and the lane shuffler around it.

use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::quiz::QuizQuestion;

pub const STARTING_LIVES: u8 = 3;
pub const CATCH_REWARD: u32 = 25;
pub const MISS_PENALTY: u32 = 10;

/// Period of the scheduler tick that moves the targets.
pub const TICK_PERIOD: Duration = Duration::from_millis(16);
/// Pause between a correct catch and the next question.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(600);

// Positions are percentages of the play field height, 0 being the top edge.
// Targets spawn below the field, staggered per lane, and rise.
const SPAWN_Y: f32 = 110.0;
const LANE_STAGGER: f32 = 20.0;
const TOP_BOUNDARY: f32 = -20.0;
const TARGET_SPEED: f32 = 0.12;

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub option_index: usize,
    pub is_correct: bool,
    pub lane: usize,
    pub start_y: f32,
    pub y: f32,
    pub clicked: bool,
}

impl Target {
    fn rise(&mut self) {
        let next = self.y - TARGET_SPEED;
        self.y = if next < TOP_BOUNDARY { self.start_y } else { next };
    }
}

fn spawn_targets(question: &QuizQuestion, rng: &mut impl Rng) -> Vec<Target> {
    let mut lanes: Vec<usize> = (0..question.options.len()).collect();
    lanes.shuffle(rng);

    let mut targets = lanes
        .into_iter()
        .enumerate()
        .map(|(option_index, lane)| {
            let start_y = SPAWN_Y + lane as f32 * LANE_STAGGER;
            Target {
                option_index,
                is_correct: option_index == question.correct_answer,
                lane,
                start_y,
                y: start_y,
                clicked: false,
            }
        })
        .collect::<Vec<_>>();
    targets.sort_by_key(|t| t.lane);
    targets
}

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub question_index: usize,
    pub score: u32,
    pub lives: u8,
    /// Ordered by lane.
    pub targets: Vec<Target>,
    /// Set once the correct target is caught; counts down to the next question.
    pub advance_in: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationState {
    InProgress(Round),
    Success { score: u8 },
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Tick,
    Catch(usize),
    Restart,
}

/// What a catch did, for the host to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchOutcome {
    Ignored,
    Hit,
    Miss { lives: u8 },
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Success(u8),
    Failure,
}

/// Percentage of the best possible raw score, rounded half up and capped at 100.
pub fn efficiency(score: u32, question_count: usize) -> u8 {
    if question_count == 0 {
        return 100;
    }
    let max = question_count as u64 * CATCH_REWARD as u64;
    let percent = (score as u64 * 200 + max) / (max * 2);
    percent.min(100) as u8
}

impl EvaluationState {
    pub fn initial(questions: &[QuizQuestion], rng: &mut impl Rng) -> Self {
        match questions.first() {
            Some(first) => EvaluationState::InProgress(Round {
                question_index: 0,
                score: 0,
                lives: STARTING_LIVES,
                targets: spawn_targets(first, rng),
                advance_in: None,
            }),
            None => EvaluationState::Success { score: 100 },
        }
    }

    /// The transition function. Catch events report what they did; ticks and
    /// restarts report nothing.
    pub fn on_event(
        self,
        event: Event,
        questions: &[QuizQuestion],
        rng: &mut impl Rng,
    ) -> (Self, Option<CatchOutcome>) {
        match (self, event) {
            (EvaluationState::InProgress(round), Event::Tick) => (tick(round, questions, rng), None),
            (EvaluationState::InProgress(round), Event::Catch(option_index)) => {
                let (state, outcome) = catch(round, option_index);
                (state, Some(outcome))
            }
            (EvaluationState::Failure, Event::Restart) => (Self::initial(questions, rng), None),
            (state, Event::Catch(_)) => (state, Some(CatchOutcome::Ignored)),
            (state, _) => (state, None),
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            EvaluationState::InProgress(_) => Outcome::InProgress,
            EvaluationState::Success { score } => Outcome::Success(*score),
            EvaluationState::Failure => Outcome::Failure,
        }
    }
}

fn tick(mut round: Round, questions: &[QuizQuestion], rng: &mut impl Rng) -> EvaluationState {
    round.targets.iter_mut().for_each(Target::rise);

    let Some(remaining) = round.advance_in else {
        return EvaluationState::InProgress(round);
    };
    let remaining = remaining.saturating_sub(TICK_PERIOD);
    if !remaining.is_zero() {
        round.advance_in = Some(remaining);
        return EvaluationState::InProgress(round);
    }

    let next_index = round.question_index + 1;
    match questions.get(next_index) {
        Some(next) => EvaluationState::InProgress(Round {
            question_index: next_index,
            score: round.score,
            lives: round.lives,
            targets: spawn_targets(next, rng),
            advance_in: None,
        }),
        None => EvaluationState::Success {
            score: efficiency(round.score, questions.len()),
        },
    }
}

fn catch(mut round: Round, option_index: usize) -> (EvaluationState, CatchOutcome) {
    let Some(position) = round
        .targets
        .iter()
        .position(|t| t.option_index == option_index)
    else {
        return (EvaluationState::InProgress(round), CatchOutcome::Ignored);
    };
    let target = &mut round.targets[position];
    if target.clicked {
        return (EvaluationState::InProgress(round), CatchOutcome::Ignored);
    }
    target.clicked = true;

    if target.is_correct {
        round.score += CATCH_REWARD;
        if round.advance_in.is_none() {
            round.advance_in = Some(ADVANCE_DELAY);
        }
        return (EvaluationState::InProgress(round), CatchOutcome::Hit);
    }

    round.lives = round.lives.saturating_sub(1);
    round.score = round.score.saturating_sub(MISS_PENALTY);
    if round.lives == 0 {
        return (EvaluationState::Failure, CatchOutcome::Failed);
    }
    let lives = round.lives;
    (EvaluationState::InProgress(round), CatchOutcome::Miss { lives })
}

/// A read-only view of an evaluation for the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub question_index: usize,
    pub question_count: usize,
    /// Raw points of the round in play, 0 once it has ended. The final
    /// efficiency is carried by `outcome`.
    pub points: u32,
    pub lives: u8,
    pub advancing: bool,
    pub targets: Vec<Target>,
    pub outcome: Outcome,
}

pub struct Evaluation {
    questions: Vec<QuizQuestion>,
    state: EvaluationState,
    rng: StdRng,
}

impl Evaluation {
    pub fn start(questions: Vec<QuizQuestion>) -> Self {
        Self::with_rng(questions, StdRng::from_entropy())
    }

    pub fn with_rng(questions: Vec<QuizQuestion>, mut rng: StdRng) -> Self {
        info!("Starting evaluation with {} question(s)", questions.len());
        let state = EvaluationState::initial(&questions, &mut rng);
        Self {
            questions,
            state,
            rng,
        }
    }

    pub fn apply(&mut self, event: Event) -> Option<CatchOutcome> {
        let state = std::mem::replace(&mut self.state, EvaluationState::Failure);
        let before = state.outcome();
        let (state, outcome) = state.on_event(event, &self.questions, &mut self.rng);
        self.state = state;

        let after = self.state.outcome();
        if before != after {
            debug!("Evaluation moved from {:?} to {:?}", before, after);
        }
        outcome
    }

    pub fn catch(&mut self, option_index: usize) -> CatchOutcome {
        self.apply(Event::Catch(option_index))
            .unwrap_or(CatchOutcome::Ignored)
    }

    pub fn tick(&mut self) {
        self.apply(Event::Tick);
    }

    /// Starts over from the first question. Only a failed evaluation restarts.
    pub fn restart(&mut self) -> bool {
        if self.state != EvaluationState::Failure {
            return false;
        }
        info!("Restarting evaluation");
        self.apply(Event::Restart);
        true
    }

    pub fn state(&self) -> &EvaluationState {
        &self.state
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match &self.state {
            EvaluationState::InProgress(round) => self.questions.get(round.question_index),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let question_count = self.questions.len();
        match &self.state {
            EvaluationState::InProgress(round) => Snapshot {
                question_index: round.question_index,
                question_count,
                points: round.score,
                lives: round.lives,
                advancing: round.advance_in.is_some(),
                targets: round.targets.clone(),
                outcome: Outcome::InProgress,
            },
            EvaluationState::Success { score } => Snapshot {
                question_index: question_count,
                question_count,
                points: 0,
                lives: 0,
                advancing: false,
                targets: Vec::new(),
                outcome: Outcome::Success(*score),
            },
            EvaluationState::Failure => Snapshot {
                question_index: 0,
                question_count,
                points: 0,
                lives: 0,
                advancing: false,
                targets: Vec::new(),
                outcome: Outcome::Failure,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, options: usize, correct_answer: usize) -> QuizQuestion {
        QuizQuestion::new(
            id,
            format!("Question {id}"),
            (0..options).map(|i| format!("option {i}")).collect(),
            correct_answer,
            "explanation",
        )
    }

    fn two_questions() -> Vec<QuizQuestion> {
        vec![question("q1", 4, 1), question("q2", 4, 2)]
    }

    fn evaluation(questions: Vec<QuizQuestion>) -> Evaluation {
        Evaluation::with_rng(questions, StdRng::seed_from_u64(7))
    }

    fn ticks_until_settled(evaluation: &mut Evaluation) {
        let ticks = ADVANCE_DELAY.as_millis().div_ceil(TICK_PERIOD.as_millis());
        for _ in 0..ticks {
            evaluation.tick();
        }
    }

    fn round(evaluation: &Evaluation) -> &Round {
        match evaluation.state() {
            EvaluationState::InProgress(round) => round,
            other => panic!("expected a round in progress, got {:?}", other),
        }
    }

    #[test]
    fn starts_on_first_question_with_full_lives() {
        let evaluation = evaluation(two_questions());
        let round = round(&evaluation);
        assert_eq!(round.question_index, 0);
        assert_eq!(round.score, 0);
        assert_eq!(round.lives, STARTING_LIVES);
        assert_eq!(round.targets.len(), 4);
        assert_eq!(round.targets.iter().filter(|t| t.is_correct).count(), 1);
    }

    #[test]
    fn targets_get_distinct_lanes() {
        let evaluation = evaluation(two_questions());
        let mut lanes: Vec<usize> = round(&evaluation).targets.iter().map(|t| t.lane).collect();
        lanes.dedup();
        assert_eq!(lanes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn correct_target_matches_answer_index() {
        let evaluation = evaluation(two_questions());
        let correct = round(&evaluation)
            .targets
            .iter()
            .find(|t| t.is_correct)
            .unwrap();
        assert_eq!(correct.option_index, 1);
    }

    #[test]
    fn two_clean_catches_score_full_marks() {
        let mut evaluation = evaluation(two_questions());
        assert_eq!(evaluation.catch(1), CatchOutcome::Hit);
        ticks_until_settled(&mut evaluation);
        assert_eq!(round(&evaluation).question_index, 1);
        assert_eq!(round(&evaluation).score, 25);

        assert_eq!(evaluation.catch(2), CatchOutcome::Hit);
        ticks_until_settled(&mut evaluation);
        assert_eq!(evaluation.outcome(), Outcome::Success(100));
    }

    #[test]
    fn wrong_then_right_on_each_question_scores_eighty() {
        let mut evaluation = evaluation(two_questions());
        assert_eq!(evaluation.catch(0), CatchOutcome::Miss { lives: 2 });
        assert_eq!(round(&evaluation).score, 0);
        assert_eq!(evaluation.catch(1), CatchOutcome::Hit);
        assert_eq!(round(&evaluation).score, 25);
        ticks_until_settled(&mut evaluation);

        assert_eq!(evaluation.catch(0), CatchOutcome::Miss { lives: 1 });
        assert_eq!(round(&evaluation).score, 15);
        assert_eq!(evaluation.catch(2), CatchOutcome::Hit);
        ticks_until_settled(&mut evaluation);
        assert_eq!(evaluation.outcome(), Outcome::Success(80));
    }

    #[test]
    fn right_then_wrong_on_each_question_scores_sixty() {
        let mut evaluation = evaluation(two_questions());
        assert_eq!(evaluation.catch(1), CatchOutcome::Hit);
        assert_eq!(evaluation.catch(0), CatchOutcome::Miss { lives: 2 });
        assert_eq!(round(&evaluation).score, 15);
        ticks_until_settled(&mut evaluation);

        assert_eq!(evaluation.catch(2), CatchOutcome::Hit);
        assert_eq!(evaluation.catch(0), CatchOutcome::Miss { lives: 1 });
        assert_eq!(round(&evaluation).score, 30);
        ticks_until_settled(&mut evaluation);
        assert_eq!(evaluation.outcome(), Outcome::Success(60));
    }

    #[test]
    fn third_miss_fails_not_the_second() {
        let mut evaluation = evaluation(vec![question("q1", 4, 3)]);
        assert_eq!(evaluation.catch(0), CatchOutcome::Miss { lives: 2 });
        assert_eq!(evaluation.catch(1), CatchOutcome::Miss { lives: 1 });
        assert_eq!(evaluation.outcome(), Outcome::InProgress);
        assert_eq!(evaluation.catch(2), CatchOutcome::Failed);
        assert_eq!(evaluation.outcome(), Outcome::Failure);
    }

    #[test]
    fn misses_spread_over_questions_still_fail_on_the_third() {
        let mut evaluation = evaluation(vec![question("q1", 3, 0), question("q2", 3, 0)]);
        assert_eq!(evaluation.catch(1), CatchOutcome::Miss { lives: 2 });
        assert_eq!(evaluation.catch(0), CatchOutcome::Hit);
        ticks_until_settled(&mut evaluation);
        assert_eq!(evaluation.catch(1), CatchOutcome::Miss { lives: 1 });
        assert_eq!(evaluation.catch(2), CatchOutcome::Failed);
    }

    #[test]
    fn score_never_drops_below_zero() {
        let mut evaluation = evaluation(vec![question("q1", 4, 3)]);
        evaluation.catch(0);
        assert_eq!(round(&evaluation).score, 0);
    }

    #[test]
    fn clicked_targets_are_ignored() {
        let mut evaluation = evaluation(vec![question("q1", 4, 3)]);
        assert_eq!(evaluation.catch(0), CatchOutcome::Miss { lives: 2 });
        assert_eq!(evaluation.catch(0), CatchOutcome::Ignored);
        assert_eq!(round(&evaluation).lives, 2);
    }

    #[test]
    fn wrong_catch_during_advance_delay_still_costs_a_life() {
        let mut evaluation = evaluation(two_questions());
        assert_eq!(evaluation.catch(1), CatchOutcome::Hit);
        let delay = round(&evaluation).advance_in;
        evaluation.tick();

        assert_eq!(evaluation.catch(0), CatchOutcome::Miss { lives: 2 });
        assert_eq!(round(&evaluation).score, 15);
        assert_eq!(round(&evaluation).question_index, 0);
        assert!(round(&evaluation).advance_in < delay);

        assert_eq!(evaluation.catch(1), CatchOutcome::Ignored);
        ticks_until_settled(&mut evaluation);
        assert_eq!(round(&evaluation).question_index, 1);
    }

    #[test]
    fn snapshot_points_are_raw_and_outcome_carries_efficiency() {
        let mut evaluation = evaluation(vec![question("q1", 2, 0)]);
        evaluation.catch(0);
        assert_eq!(evaluation.snapshot().points, 25);
        ticks_until_settled(&mut evaluation);

        let snapshot = evaluation.snapshot();
        assert_eq!(snapshot.points, 0);
        assert_eq!(snapshot.outcome, Outcome::Success(100));
    }

    #[test]
    fn unknown_option_is_ignored() {
        let mut evaluation = evaluation(two_questions());
        assert_eq!(evaluation.catch(9), CatchOutcome::Ignored);
    }

    #[test]
    fn last_question_succeeds_only_after_the_delay() {
        let mut evaluation = evaluation(vec![question("q1", 2, 0)]);
        evaluation.catch(0);
        evaluation.tick();
        assert_eq!(evaluation.outcome(), Outcome::InProgress);
        ticks_until_settled(&mut evaluation);
        assert_eq!(evaluation.outcome(), Outcome::Success(100));
    }

    #[test]
    fn restart_after_failure_resets_everything() {
        let mut evaluation = evaluation(vec![question("q1", 4, 3), question("q2", 4, 0)]);
        evaluation.catch(3);
        ticks_until_settled(&mut evaluation);
        for option in 0..3 {
            evaluation.catch(option + 1);
        }
        assert_eq!(evaluation.outcome(), Outcome::Failure);

        assert!(evaluation.restart());
        let round = round(&evaluation);
        assert_eq!(round.question_index, 0);
        assert_eq!(round.score, 0);
        assert_eq!(round.lives, STARTING_LIVES);
        assert!(round.targets.iter().all(|t| !t.clicked));
    }

    #[test]
    fn restart_is_refused_while_playing() {
        let mut evaluation = evaluation(two_questions());
        assert!(!evaluation.restart());
    }

    #[test]
    fn terminal_states_ignore_catches() {
        let mut evaluation = evaluation(vec![question("q1", 2, 0)]);
        evaluation.catch(0);
        ticks_until_settled(&mut evaluation);
        assert_eq!(evaluation.catch(1), CatchOutcome::Ignored);
        assert_eq!(evaluation.outcome(), Outcome::Success(100));
    }

    #[test]
    fn no_questions_is_an_immediate_success() {
        let evaluation = evaluation(Vec::new());
        assert_eq!(evaluation.outcome(), Outcome::Success(100));
    }

    #[test]
    fn targets_rise_and_wrap_to_their_start() {
        let mut evaluation = evaluation(vec![question("q1", 2, 0)]);
        let start = round(&evaluation).targets[0].start_y;
        evaluation.tick();
        let y = round(&evaluation).targets[0].y;
        assert!((start - y - TARGET_SPEED).abs() < 1e-4);

        let ticks_to_top = ((start - TOP_BOUNDARY) / TARGET_SPEED).ceil() as usize;
        for _ in 0..ticks_to_top {
            evaluation.tick();
        }
        let target = &round(&evaluation).targets[0];
        assert!(target.y <= target.start_y && target.y >= TOP_BOUNDARY);
        assert!(target.y > start - 1.0, "target should have wrapped, y = {}", target.y);
    }

    #[test]
    fn efficiency_rounds_half_up_and_caps() {
        assert_eq!(efficiency(50, 2), 100);
        assert_eq!(efficiency(30, 2), 60);
        assert_eq!(efficiency(25, 3), 33);
        assert_eq!(efficiency(50, 3), 67);
        assert_eq!(efficiency(500, 1), 100);
        assert_eq!(efficiency(0, 4), 0);
    }
}
