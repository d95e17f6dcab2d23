use log::{debug, info};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};

use super::intercept::{CatchOutcome, Evaluation, Outcome, Snapshot, TICK_PERIOD};

enum Command {
    Catch {
        option_index: usize,
        reply: oneshot::Sender<CatchOutcome>,
    },
    Restart {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("the evaluation is no longer running")]
pub struct EvaluationClosed;

/// Talks to an evaluation owned by its runner task. The task stops, and the
/// evaluation is thrown away, once every handle is dropped.
#[derive(Clone)]
pub struct EvaluationHandle {
    commands: mpsc::Sender<Command>,
    updates: watch::Receiver<Snapshot>,
}

pub fn spawn(evaluation: Evaluation) -> EvaluationHandle {
    let (commands, receiver) = mpsc::channel(32);
    let (publisher, updates) = watch::channel(evaluation.snapshot());
    tokio::spawn(run(evaluation, receiver, publisher));
    EvaluationHandle { commands, updates }
}

impl EvaluationHandle {
    pub async fn catch(&self, option_index: usize) -> Result<CatchOutcome, EvaluationClosed> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Catch {
            option_index,
            reply,
        })
        .await?;
        response.await.map_err(|_| EvaluationClosed)
    }

    pub async fn restart(&self) -> Result<bool, EvaluationClosed> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Restart { reply }).await?;
        response.await.map_err(|_| EvaluationClosed)
    }

    pub async fn snapshot(&self) -> Result<Snapshot, EvaluationClosed> {
        let (reply, response) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        response.await.map_err(|_| EvaluationClosed)
    }

    /// Waits out a pending advance delay and returns the state that follows it.
    pub async fn settled(&self) -> Result<Snapshot, EvaluationClosed> {
        let mut updates = self.updates.clone();
        let snapshot = updates
            .wait_for(|snapshot| !snapshot.advancing)
            .await
            .map_err(|_| EvaluationClosed)?;
        Ok(snapshot.clone())
    }

    async fn send(&self, command: Command) -> Result<(), EvaluationClosed> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EvaluationClosed)
    }
}

// Ticks and commands go through the same select loop, so a catch always sees
// the targets exactly as the last tick left them.
async fn run(
    mut evaluation: Evaluation,
    mut commands: mpsc::Receiver<Command>,
    publisher: watch::Sender<Snapshot>,
) {
    let mut ticker = interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                match command {
                    Command::Catch { option_index, reply } => {
                        let outcome = evaluation.catch(option_index);
                        debug!("Catch on option {} gave {:?}", option_index, outcome);
                        if outcome != CatchOutcome::Ignored {
                            publisher.send_replace(evaluation.snapshot());
                        }
                        let _ = reply.send(outcome);
                    }
                    Command::Restart { reply } => {
                        let restarted = evaluation.restart();
                        if restarted {
                            publisher.send_replace(evaluation.snapshot());
                        }
                        let _ = reply.send(restarted);
                    }
                    Command::Snapshot { reply } => {
                        let _ = reply.send(evaluation.snapshot());
                    }
                }
            }
            // A finished evaluation has nothing to move; ticking resumes on restart.
            _ = ticker.tick(), if evaluation.outcome() == Outcome::InProgress => {
                let before = milestone(&evaluation.snapshot());
                evaluation.tick();
                let snapshot = evaluation.snapshot();
                if milestone(&snapshot) != before {
                    if let Outcome::Success(score) = snapshot.outcome {
                        info!("Evaluation finished with {}% efficiency", score);
                    }
                    publisher.send_replace(snapshot);
                }
            }
        }
    }

    debug!("Evaluation runner stopped, outcome was {:?}", evaluation.outcome());
}

fn milestone(snapshot: &Snapshot) -> (usize, bool, Outcome) {
    (snapshot.question_index, snapshot.advancing, snapshot.outcome)
}
