use std::{
    collections::HashMap,
    fs::File,
    sync::{Arc, Mutex},
};

use dotenv::dotenv;
use learnpath::{
    config::Config,
    learner::{LearnerSession, SessionRegistry},
    path::{catalog::Catalog, progress::UnitStatus, LearningPath},
    quiz::{
        intercept::{CatchOutcome, Outcome, Snapshot},
        runner::{self, EvaluationHandle},
    },
    store::{JsonFileStore, RecordStore},
    unit::{EvaluationStart, OpenUnitError, Stage, UnitVisit},
};
use log::{info, warn};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    RequestError,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove},
};

type LearnDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveUsername,
    ReceivePathChoice,
    OnPath {
        slug: String,
    },
    InUnit {
        slug: String,
        unit_id: String,
    },
    Evaluating {
        slug: String,
        unit_id: String,
    },
}

type DialogueStorage = Arc<ErasedStorage<State>>;

/// A unit the learner has open. Lives only in memory: a restart closes it.
struct OpenUnit {
    visit: UnitVisit,
    evaluation: Option<EvaluationHandle>,
}

struct App {
    catalog: Catalog,
    registry: SessionRegistry,
    open_units: Mutex<HashMap<ChatId, OpenUnit>>,
    config: Config,
}

type Shared = Arc<App>;

impl App {
    fn visit(&self, chat: ChatId) -> Option<UnitVisit> {
        self.open_units
            .lock()
            .ok()?
            .get(&chat)
            .map(|open| open.visit.clone())
    }

    fn evaluation(&self, chat: ChatId) -> Option<EvaluationHandle> {
        self.open_units
            .lock()
            .ok()?
            .get(&chat)
            .and_then(|open| open.evaluation.clone())
    }

    fn with_open_unit<T>(&self, chat: ChatId, f: impl FnOnce(&mut OpenUnit) -> T) -> Option<T> {
        let mut open_units = self.open_units.lock().ok()?;
        open_units.get_mut(&chat).map(f)
    }

    fn open(&self, chat: ChatId, visit: UnitVisit) {
        if let Ok(mut open_units) = self.open_units.lock() {
            open_units.insert(
                chat,
                OpenUnit {
                    visit,
                    evaluation: None,
                },
            );
        }
    }

    /// Dropping the unit also drops its evaluation handle, which stops the game.
    fn close(&self, chat: ChatId) {
        if let Ok(mut open_units) = self.open_units.lock() {
            open_units.remove(&chat);
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting learning path bot...");

    let config = Config::load().expect("Environment misconfigured");

    let bot = Bot::from_env();

    info!("Opening dialogue storage at {}", config.dialogue_db);
    let storage: DialogueStorage = SqliteStorage::open(&config.dialogue_db, Json)
        .await
        .expect("Failed to open the dialogue database")
        .erase();

    let catalog = Catalog::load(
        File::open(&config.paths_file)
            .unwrap_or_else(|e| panic!("Failed to open {}: {e}", config.paths_file.display())),
    )
    .expect("Failed to load the learning paths");

    let store: Arc<dyn RecordStore> = Arc::new(
        JsonFileStore::open(&config.records_file)
            .await
            .expect("Failed to open the record store"),
    );

    let app: Shared = Arc::new(App {
        catalog,
        registry: SessionRegistry::new(store),
        open_units: Mutex::new(HashMap::new()),
        config,
    });

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::filter(|msg: Message| msg.text() == Some("/start")).endpoint(start))
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveUsername].endpoint(receive_username))
            .branch(dptree::case![State::ReceivePathChoice].endpoint(receive_path_choice))
            .branch(dptree::case![State::OnPath { slug }].endpoint(on_path))
            .branch(dptree::case![State::InUnit { slug, unit_id }].endpoint(in_unit))
            .branch(dptree::case![State::Evaluating { slug, unit_id }].endpoint(evaluating)),
    )
    .dependencies(dptree::deps![storage, app])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const GREETING_TEXT: &str =
    "Hi! I'm your learning path guide. Finish units, win the intercept game and climb the leaderboard. What should we call you?";

const LEADERBOARD: &str = "Leaderboard";
const PROFILE: &str = "Profile";
const SWITCH_PATH: &str = "Switch path";
const RETRY_SYNC: &str = "Retry sync";
const CONFIRM_THEORY: &str = "Confirm theory";
const BACK_TO_THEORY: &str = "Back to theory";
const START_EVALUATION: &str = "Start evaluation";
const EXIT_UNIT: &str = "Exit unit";
const RESTART: &str = "Restart";
const CLAIM_XP: &str = "Claim XP";

const STORE_NOTICE: &str =
    "I couldn't reach the record store. Your progress is kept here, tap \"Retry sync\" in a moment.";

fn user_id(msg: &Message) -> String {
    msg.from()
        .map(|user| user.id.0.to_string())
        .unwrap_or_else(|| msg.chat.id.0.to_string())
}

fn fallback_username(msg: &Message) -> String {
    msg.from()
        .map(|user| user.first_name.clone())
        .unwrap_or_else(|| "learner".to_string())
}

/// Loads the learner's session, or tells them the record store is down.
async fn session_or_notice(
    bot: &Bot,
    app: &App,
    msg: &Message,
) -> Result<Option<Arc<tokio::sync::Mutex<LearnerSession>>>, RequestError> {
    match app
        .registry
        .get_or_load(&user_id(msg), &fallback_username(msg))
        .await
    {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            warn!("Unable to load session: {}", e);
            bot.send_message(msg.chat.id, STORE_NOTICE).await?;
            Ok(None)
        }
    }
}

async fn start(bot: Bot, dialogue: LearnDialogue, msg: Message, app: Shared) -> HandlerResult {
    app.close(msg.chat.id);
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(KeyboardRemove::new())
        .await?;

    dialogue.update(State::ReceiveUsername).await?;
    Ok(())
}

async fn receive_username(
    bot: Bot,
    dialogue: LearnDialogue,
    msg: Message,
    app: Shared,
) -> HandlerResult {
    let Some(username) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please send your name as text")
            .await?;
        return Ok(());
    };

    let session = match app.registry.get_or_load(&user_id(&msg), username).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Unable to load session: {}", e);
            bot.send_message(msg.chat.id, STORE_NOTICE).await?;
            return Ok(());
        }
    };
    {
        let mut session = session.lock().await;
        if session.profile().username != username {
            if let Err(e) = session.rename(username).await {
                warn!("Unable to store the new username: {}", e);
            }
        }
    }

    bot.send_message(msg.chat.id, format!("Nice to meet you, {}!", username))
        .await?;
    send_path_choice(&bot, &msg, &app).await?;
    dialogue.update(State::ReceivePathChoice).await?;
    Ok(())
}

async fn send_path_choice(bot: &Bot, msg: &Message, app: &App) -> HandlerResult {
    let rows = app
        .catalog
        .paths()
        .iter()
        .map(|path| vec![KeyboardButton::new(path.title.clone())])
        .collect::<Vec<_>>();
    bot.send_message(msg.chat.id, "Which path do you want to follow?")
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

async fn receive_path_choice(
    bot: Bot,
    dialogue: LearnDialogue,
    msg: Message,
    app: Shared,
) -> HandlerResult {
    let Some(path) = msg.text().and_then(|t| app.catalog.get_by_title(t)) else {
        bot.send_message(msg.chat.id, "Please choose one of the paths")
            .await?;
        return Ok(());
    };

    send_board(&bot, &msg, &app, path).await?;
    dialogue
        .update(State::OnPath {
            slug: path.slug.clone(),
        })
        .await?;
    Ok(())
}

fn status_marker(status: UnitStatus) -> &'static str {
    match status {
        UnitStatus::Completed => "✅",
        UnitStatus::Unlocked => "▶️",
        UnitStatus::Locked => "🔒",
    }
}

async fn send_board(bot: &Bot, msg: &Message, app: &App, path: &LearningPath) -> HandlerResult {
    let Some(session) = session_or_notice(bot, app, msg).await? else {
        return Ok(());
    };
    let session = session.lock().await;
    let board = session.board(path);

    let mut text = format!(
        "{}\n{}% mastered · {} XP\n",
        path.title,
        board.progress_percent(),
        session.profile().xp_total
    );
    for module in &board.modules {
        text.push_str(&format!("\n{}\n", module.module.title));
        for unit in &module.units {
            text.push_str(&format!(
                "{} {} (+{} XP)\n",
                status_marker(unit.status()),
                unit.unit.title,
                unit.unit.xp_points
            ));
        }
    }
    if board.is_mastered() {
        text.push_str("\n🏆 Path mastered! Every unit is complete.");
    } else if let Some(next) = board.next_unit() {
        text.push_str(&format!("\nUp next: {}", next.unit.title));
    }

    let mut rows = board
        .units()
        .filter(|u| !u.is_locked)
        .map(|u| vec![KeyboardButton::new(u.unit.title.clone())])
        .collect::<Vec<_>>();
    rows.push(vec![
        KeyboardButton::new(LEADERBOARD),
        KeyboardButton::new(PROFILE),
    ]);
    let mut last_row = vec![KeyboardButton::new(SWITCH_PATH)];
    if session.pending_writes() > 0 {
        last_row.push(KeyboardButton::new(RETRY_SYNC));
    }
    rows.push(last_row);

    bot.send_message(msg.chat.id, text)
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

async fn back_to_board(
    bot: &Bot,
    dialogue: &LearnDialogue,
    msg: &Message,
    app: &App,
    slug: &str,
) -> HandlerResult {
    app.close(msg.chat.id);
    match app.catalog.get_by_slug(slug) {
        Some(path) => {
            send_board(bot, msg, app, path).await?;
            dialogue
                .update(State::OnPath {
                    slug: slug.to_string(),
                })
                .await?;
        }
        None => {
            send_path_choice(bot, msg, app).await?;
            dialogue.update(State::ReceivePathChoice).await?;
        }
    }
    Ok(())
}

async fn on_path(
    bot: Bot,
    dialogue: LearnDialogue,
    slug: String,
    msg: Message,
    app: Shared,
) -> HandlerResult {
    let Some(path) = app.catalog.get_by_slug(&slug) else {
        send_path_choice(&bot, &msg, &app).await?;
        dialogue.update(State::ReceivePathChoice).await?;
        return Ok(());
    };

    match msg.text() {
        Some(LEADERBOARD) => send_leaderboard(&bot, &msg, &app).await,
        Some(PROFILE) => send_profile(&bot, &msg, &app, path).await,
        Some(SWITCH_PATH) => {
            send_path_choice(&bot, &msg, &app).await?;
            dialogue.update(State::ReceivePathChoice).await?;
            Ok(())
        }
        Some(RETRY_SYNC) => {
            let Some(session) = session_or_notice(&bot, &app, &msg).await? else {
                return Ok(());
            };
            let result = session.lock().await.retry_pending().await;
            let reply = match result {
                Ok(()) => "All progress is synced.",
                Err(_) => STORE_NOTICE,
            };
            bot.send_message(msg.chat.id, reply).await?;
            send_board(&bot, &msg, &app, path).await
        }
        Some(title) => match path.units().find(|u| u.title == title) {
            Some(unit) => open_unit(&bot, &dialogue, &msg, &app, path, &unit.id).await,
            None => {
                bot.send_message(msg.chat.id, "Please choose one of the options")
                    .await?;
                Ok(())
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .await?;
            Ok(())
        }
    }
}

async fn send_leaderboard(bot: &Bot, msg: &Message, app: &App) -> HandlerResult {
    let me = user_id(msg);
    let top = match app.registry.top_profiles(app.config.leaderboard_size).await {
        Ok(top) => top,
        Err(e) => {
            warn!("Unable to read the leaderboard: {}", e);
            bot.send_message(msg.chat.id, STORE_NOTICE).await?;
            return Ok(());
        }
    };
    let mut text = String::from("Leaderboard\n");
    for (rank, hero) in top.iter().enumerate() {
        let you = if hero.user_id == me { " (you)" } else { "" };
        text.push_str(&format!(
            "\n#{} {}{} · {} XP",
            rank + 1,
            hero.username,
            you,
            hero.xp_total
        ));
    }
    if top.is_empty() {
        text.push_str("\nNobody has earned XP yet.");
    }
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn send_profile(bot: &Bot, msg: &Message, app: &App, path: &LearningPath) -> HandlerResult {
    let Some(session) = session_or_notice(bot, app, msg).await? else {
        return Ok(());
    };
    let session = session.lock().await;
    let board = session.board(path);
    let text = format!(
        "{}\nTotal XP: {}\n{}: {} of {} units ({}%)",
        session.profile().username,
        session.profile().xp_total,
        path.title,
        board.completed_count(),
        board.total_units(),
        board.progress_percent()
    );
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn open_unit(
    bot: &Bot,
    dialogue: &LearnDialogue,
    msg: &Message,
    app: &App,
    path: &LearningPath,
    unit_id: &str,
) -> HandlerResult {
    let Some(session) = session_or_notice(bot, app, msg).await? else {
        return Ok(());
    };
    let opened = {
        let session = session.lock().await;
        let board = session.board(path);
        UnitVisit::open(&board, unit_id).map_err(|e| (e, board.next_unit().map(|n| n.unit.title.clone())))
    };

    let visit = match opened {
        Ok(visit) => visit,
        Err((OpenUnitError::Locked(_), next)) => {
            let hint = next
                .map(|title| format!(" Finish \"{}\" first.", title))
                .unwrap_or_default();
            bot.send_message(msg.chat.id, format!("That unit is still locked.{}", hint))
                .await?;
            return Ok(());
        }
        Err((e, _)) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };

    send_stage(bot, msg, &visit).await?;
    app.open(msg.chat.id, visit);
    dialogue
        .update(State::InUnit {
            slug: path.slug.clone(),
            unit_id: unit_id.to_string(),
        })
        .await?;
    Ok(())
}

async fn send_stage(bot: &Bot, msg: &Message, visit: &UnitVisit) -> HandlerResult {
    let unit = visit.unit();
    let (text, buttons) = match visit.stage() {
        Stage::Concept => {
            let mut text = format!("{} · {} · {}\n", unit.title, unit.kind.label(), unit.duration);
            match &unit.concept_info {
                Some(card) => {
                    text.push_str(&format!("\n{}\n{}\n", card.title, card.description));
                    for point in &card.points {
                        text.push_str(&format!("• {}\n", point));
                    }
                }
                None => text.push_str(&format!("\n{}\n", unit.description)),
            }
            (text, vec![CONFIRM_THEORY, EXIT_UNIT])
        }
        Stage::Video => {
            let text = match &unit.content_url {
                Some(url) => format!("Watch this, then take the evaluation:\n{}", url),
                None => "Nothing to watch for this unit, the evaluation is next.".to_string(),
            };
            (text, vec![START_EVALUATION, BACK_TO_THEORY, EXIT_UNIT])
        }
        Stage::Evaluation => (
            "Catch the right answer before it gets away. Three lives, 25 points a catch, wrong catches cost 10.".to_string(),
            vec![START_EVALUATION, EXIT_UNIT],
        ),
    };

    let rows = buttons
        .into_iter()
        .map(|b| vec![KeyboardButton::new(b)])
        .collect::<Vec<_>>();
    bot.send_message(msg.chat.id, text)
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

async fn in_unit(
    bot: Bot,
    dialogue: LearnDialogue,
    (slug, unit_id): (String, String),
    msg: Message,
    app: Shared,
) -> HandlerResult {
    let chat = msg.chat.id;
    if app.visit(chat).is_none() {
        bot.send_message(chat, "That unit was closed, back to your path.")
            .await?;
        return back_to_board(&bot, &dialogue, &msg, &app, &slug).await;
    }

    match msg.text() {
        Some(EXIT_UNIT) => back_to_board(&bot, &dialogue, &msg, &app, &slug).await,
        Some(CONFIRM_THEORY) => {
            if let Some(visit) = app.with_open_unit(chat, |open| {
                open.visit.advance();
                open.visit.clone()
            }) {
                send_stage(&bot, &msg, &visit).await?;
            }
            Ok(())
        }
        Some(BACK_TO_THEORY) => {
            if let Some(visit) = app.with_open_unit(chat, |open| {
                open.visit.go_to(Stage::Concept);
                open.visit.clone()
            }) {
                send_stage(&bot, &msg, &visit).await?;
            }
            Ok(())
        }
        Some(START_EVALUATION) => start_evaluation(&bot, &dialogue, &msg, &app, slug, unit_id).await,
        _ => {
            bot.send_message(chat, "Please choose one of the options")
                .await?;
            Ok(())
        }
    }
}

async fn start_evaluation(
    bot: &Bot,
    dialogue: &LearnDialogue,
    msg: &Message,
    app: &App,
    slug: String,
    unit_id: String,
) -> HandlerResult {
    let chat = msg.chat.id;
    let start = app.with_open_unit(chat, |open| {
        if open.visit.stage() == Stage::Video {
            open.visit.advance();
        }
        open.visit.go_to(Stage::Evaluation);
        open.visit.begin_evaluation()
    });

    match start.flatten() {
        Some(EvaluationStart::Skip { score }) => commit(bot, dialogue, msg, app, &slug, score).await,
        Some(EvaluationStart::Play(evaluation)) => {
            let handle = runner::spawn(evaluation);
            let snapshot = handle.snapshot().await?;
            app.with_open_unit(chat, |open| open.evaluation = Some(handle));
            send_question(bot, msg, app, &snapshot).await?;
            dialogue
                .update(State::Evaluating { slug, unit_id })
                .await?;
            Ok(())
        }
        None => {
            bot.send_message(chat, "Finish the theory first.").await?;
            Ok(())
        }
    }
}

fn lane_letter(lane: usize) -> char {
    (b'A' + (lane % 26) as u8) as char
}

fn parse_lane(text: &str) -> Option<usize> {
    let (letter, _) = text.split_once(". ")?;
    let mut chars = letter.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_uppercase() {
        return None;
    }
    Some((c as u8 - b'A') as usize)
}

async fn send_question(bot: &Bot, msg: &Message, app: &App, snapshot: &Snapshot) -> HandlerResult {
    let Some(visit) = app.visit(msg.chat.id) else {
        return Ok(());
    };
    let Some(question) = visit.unit().quiz_questions.get(snapshot.question_index) else {
        return Ok(());
    };

    let text = format!(
        "Sync phase {}/{} · {} pts · {}\n\n{}",
        snapshot.question_index + 1,
        snapshot.question_count,
        snapshot.points,
        "❤️".repeat(snapshot.lives as usize),
        question.question
    );
    let mut rows = snapshot
        .targets
        .iter()
        .filter(|t| !t.clicked)
        .map(|t| {
            vec![KeyboardButton::new(format!(
                "{}. {}",
                lane_letter(t.lane),
                question.options[t.option_index]
            ))]
        })
        .collect::<Vec<_>>();
    rows.push(vec![KeyboardButton::new(EXIT_UNIT)]);

    bot.send_message(msg.chat.id, text)
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

async fn evaluating(
    bot: Bot,
    dialogue: LearnDialogue,
    (slug, _unit_id): (String, String),
    msg: Message,
    app: Shared,
) -> HandlerResult {
    let chat = msg.chat.id;
    let Some(handle) = app.evaluation(chat) else {
        bot.send_message(chat, "That evaluation was closed, back to your path.")
            .await?;
        return back_to_board(&bot, &dialogue, &msg, &app, &slug).await;
    };

    match msg.text() {
        Some(EXIT_UNIT) => back_to_board(&bot, &dialogue, &msg, &app, &slug).await,
        Some(RESTART) => {
            if handle.restart().await? {
                let snapshot = handle.snapshot().await?;
                send_question(&bot, &msg, &app, &snapshot).await?;
            }
            Ok(())
        }
        Some(CLAIM_XP) => match handle.snapshot().await?.outcome {
            Outcome::Success(score) => commit(&bot, &dialogue, &msg, &app, &slug, score).await,
            _ => Ok(()),
        },
        Some(text) => match parse_lane(text) {
            Some(lane) => catch_lane(&bot, &msg, &app, &handle, lane).await,
            None => {
                bot.send_message(chat, "Tap one of the answers to intercept it")
                    .await?;
                Ok(())
            }
        },
        None => Ok(()),
    }
}

async fn catch_lane(
    bot: &Bot,
    msg: &Message,
    app: &App,
    handle: &EvaluationHandle,
    lane: usize,
) -> HandlerResult {
    let chat = msg.chat.id;
    let snapshot = handle.snapshot().await?;
    let Some(target) = snapshot.targets.iter().find(|t| t.lane == lane) else {
        return Ok(());
    };

    match handle.catch(target.option_index).await? {
        CatchOutcome::Ignored => Ok(()),
        CatchOutcome::Hit => {
            let explanation = app
                .visit(chat)
                .and_then(|visit| {
                    visit
                        .unit()
                        .quiz_questions
                        .get(snapshot.question_index)
                        .map(|q| q.explanation.clone())
                })
                .unwrap_or_default();
            bot.send_message(chat, format!("Intercepted! {}", explanation))
                .await?;

            let settled = handle.settled().await?;
            match settled.outcome {
                Outcome::Success(score) => {
                    let keyboard = KeyboardMarkup::new(vec![
                        vec![KeyboardButton::new(CLAIM_XP)],
                        vec![KeyboardButton::new(EXIT_UNIT)],
                    ]);
                    bot.send_message(chat, format!("Sync mastered. {}% efficiency", score))
                        .reply_markup(keyboard)
                        .await?;
                    Ok(())
                }
                _ => send_question(bot, msg, app, &settled).await,
            }
        }
        CatchOutcome::Miss { lives } => {
            bot.send_message(chat, format!("Wrong node! {} left", "❤️".repeat(lives as usize)))
                .await?;
            let snapshot = handle.snapshot().await?;
            send_question(bot, msg, app, &snapshot).await
        }
        CatchOutcome::Failed => {
            let keyboard = KeyboardMarkup::new(vec![
                vec![KeyboardButton::new(RESTART)],
                vec![KeyboardButton::new(EXIT_UNIT)],
            ]);
            bot.send_message(chat, "Protocol breached. You're out of lives.")
                .reply_markup(keyboard)
                .await?;
            Ok(())
        }
    }
}

async fn commit(
    bot: &Bot,
    dialogue: &LearnDialogue,
    msg: &Message,
    app: &App,
    slug: &str,
    score: u8,
) -> HandlerResult {
    let chat = msg.chat.id;
    let Some(visit) = app.visit(chat) else {
        return back_to_board(bot, dialogue, msg, app, slug).await;
    };

    let Some(session) = session_or_notice(bot, app, msg).await? else {
        return Ok(());
    };
    let receipt = session
        .lock()
        .await
        .complete_unit(visit.unit(), score, visit.time_open())
        .await;

    let mut text = format!(
        "{} complete! +{} XP, {} XP in total.",
        visit.unit().title,
        receipt.earned_xp,
        receipt.xp_total
    );
    if receipt.sync_error.is_some() {
        text.push_str("\n\n");
        text.push_str(STORE_NOTICE);
    }
    bot.send_message(chat, text).await?;

    back_to_board(bot, dialogue, msg, app, slug).await
}
