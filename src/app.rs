//! Headless host: lays phrases out as dwell buttons, feeds the tracking loop
//! from stdin and speaks whatever gets selected.

use std::{
    env, fs,
    path::PathBuf,
    sync::{Arc, RwLock},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::db::{Category, CategoryName, Database, NewPhrase, Phrase, PresetCategory};
use crate::pointer::{
    tracking_channel, DwellButton, ElementAction, PointerEngine, Rect,
    Rotation, ScreenSize, Selection, TrackingController, TrackingFeed, TrackingSource,
    ViewHierarchy, ViewNode,
};
use crate::presets::PresetsStore;
use crate::settings::SettingsStore;
use crate::utils::logging::init_logging;

pub const DATA_DIR_ENV: &str = "VOCABLE_DATA_DIR";
pub const DEFAULT_LOCALE: &str = "en_US";

const TAB_HEIGHT: f32 = 80.0;
const GRID_COLUMNS: usize = 3;
const ROW_HEIGHT: f32 = 120.0;

/// Text-to-speech collaborator.
pub trait Speaker: Send + Sync {
    fn speak(&self, text: &str) -> Result<()>;
}

/// Writes utterances to the log instead of an audio device.
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        info!("speaking: {text}");
        Ok(())
    }
}

/// Stands in for the camera pipeline. Resets are only logged.
struct LoggingTrackingSource;

impl TrackingSource for LoggingTrackingSource {
    fn reset(&self, tag: &str) -> Result<()> {
        info!("tracking source reset requested ({tag})");
        Ok(())
    }
}

pub fn button_id_for_phrase(phrase_id: i64) -> String {
    format!("phrase-{phrase_id}")
}

pub fn button_id_for_category(category_id: &str) -> String {
    format!("category-{category_id}")
}

/// The on-screen board: a row of category tabs above a grid of phrases.
pub struct PhraseBoard {
    screen: ScreenSize,
    dwell: Duration,
    selections: mpsc::UnboundedSender<Selection>,
    root: RwLock<ViewNode>,
}

impl PhraseBoard {
    pub fn new(screen: ScreenSize, dwell: Duration, selections: mpsc::UnboundedSender<Selection>) -> Self {
        Self {
            screen,
            dwell,
            selections,
            root: RwLock::new(ViewNode::Group(Vec::new())),
        }
    }

    /// Replaces the tree. Buttons from the previous layout are dropped, so
    /// the engine sees them as stale.
    pub fn show(&self, categories: &[Category], phrases: &[Phrase]) {
        let tabs: Vec<&Category> = categories.iter().filter(|c| !c.hidden).collect();
        let tab_width = self.screen.width / tabs.len().max(1) as f32;

        let tab_row = tabs.iter().enumerate().map(|(index, category)| {
            let bounds = Rect::from_origin_size(index as f32 * tab_width, 0.0, tab_width, TAB_HEIGHT);
            self.button(
                button_id_for_category(&category.id),
                ElementAction::OpenCategory(category.id.clone()),
                bounds,
            )
        });

        let cell_width = self.screen.width / GRID_COLUMNS as f32;
        let grid = phrases.iter().enumerate().map(|(index, phrase)| {
            let column = (index % GRID_COLUMNS) as f32;
            let row = (index / GRID_COLUMNS) as f32;
            let bounds = Rect::from_origin_size(
                column * cell_width,
                TAB_HEIGHT + row * ROW_HEIGHT,
                cell_width,
                ROW_HEIGHT,
            );
            self.button(
                button_id_for_phrase(phrase.id),
                ElementAction::SpeakPhrase(phrase.id),
                bounds,
            )
        });

        let root = ViewNode::group([ViewNode::group(tab_row), ViewNode::group(grid)]);
        match self.root.write() {
            Ok(mut guard) => *guard = root,
            Err(poisoned) => *poisoned.into_inner() = root,
        }
    }

    fn button(&self, id: String, action: ElementAction, bounds: Rect) -> ViewNode {
        let button = DwellButton::new(id, action, bounds, self.dwell, self.selections.clone());
        ViewNode::element(Arc::new(button))
    }

    /// Bounds of the element with `id` in the current layout.
    pub fn bounds_of(&self, id: &str) -> Option<Rect> {
        fn find(node: &ViewNode, id: &str) -> Option<Rect> {
            match node {
                ViewNode::Element(element) if element.id() == id => Some(element.bounds()),
                ViewNode::Group(children) => children.iter().find_map(|child| find(child, id)),
                _ => None,
            }
        }
        find(&ViewHierarchy::root(self), id)
    }
}

impl ViewHierarchy for PhraseBoard {
    fn root(&self) -> ViewNode {
        match self.root.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pointer { x: f32, y: f32 },
    ShowError(bool),
    Rotate(i32),
    Pause(bool),
    HeadTracking(bool),
    Open(String),
    AddSaying(String),
    Hide(String),
    Quit,
}

fn parse_switch(value: Option<&str>) -> Result<bool> {
    match value {
        Some("on") => Ok(true),
        Some("off") => Ok(false),
        other => bail!("expected on/off, got {other:?}"),
    }
}

/// Parses one line of driver input.
///
/// `<x> <y>` moves the pointer; everything else is a keyword command.
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    if let Ok(x) = word.parse::<f32>() {
        let y = rest
            .parse::<f32>()
            .with_context(|| format!("invalid y coordinate {rest:?}"))?;
        return Ok(Command::Pointer { x, y });
    }

    let argument = || {
        if rest.is_empty() {
            Err(anyhow!("{word} needs an argument"))
        } else {
            Ok(rest.to_string())
        }
    };

    Ok(match word {
        "error" => Command::ShowError(parse_switch(Some(rest))?),
        "tracking" => Command::HeadTracking(parse_switch(Some(rest))?),
        "pause" => Command::Pause(true),
        "resume" => Command::Pause(false),
        "rotate" => Command::Rotate(rest.parse().with_context(|| format!("invalid rotation {rest:?}"))?),
        "open" => Command::Open(argument()?),
        "add" => Command::AddSaying(argument()?),
        "hide" => Command::Hide(argument()?),
        "quit" | "exit" => Command::Quit,
        "" => bail!("empty command"),
        other => bail!("unknown command {other:?}"),
    })
}

/// One running board: routes selections to the speaker and the store and
/// keeps the layout in sync with the open category.
pub struct Session {
    store: PresetsStore,
    speaker: Arc<dyn Speaker>,
    board: Arc<PhraseBoard>,
    feed: TrackingFeed,
    locale: String,
    current_category: Option<String>,
}

impl Session {
    pub fn new(
        store: PresetsStore,
        speaker: Arc<dyn Speaker>,
        board: Arc<PhraseBoard>,
        feed: TrackingFeed,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            store,
            speaker,
            board,
            feed,
            locale: locale.into(),
            current_category: None,
        }
    }

    pub fn feed(&self) -> &TrackingFeed {
        &self.feed
    }

    pub fn current_category(&self) -> Option<&str> {
        self.current_category.as_deref()
    }

    /// Opens the first visible category.
    pub async fn open_first_category(&mut self) -> Result<()> {
        let categories = self.store.get_categories().await?;
        match categories.iter().find(|category| !category.hidden) {
            Some(category) => {
                let id = category.id.clone();
                self.open_category(&id).await
            }
            None => {
                warn!("every category is hidden");
                Ok(())
            }
        }
    }

    pub async fn open_category(&mut self, category_id: &str) -> Result<()> {
        let category = self.store.get_category_by_id(category_id).await?;
        info!("opening category {}", display_name(&category, &self.locale));
        self.current_category = Some(category.id);
        self.redraw().await
    }

    /// Rebuilds the board from the store and tells the engine the layout moved.
    pub async fn redraw(&mut self) -> Result<()> {
        let categories = self.store.get_categories().await?;
        let phrases = match &self.current_category {
            Some(id) => self.store.get_phrases_for_category(id).await?,
            None => Vec::new(),
        };
        self.board.show(&categories, &phrases);
        self.feed.layout_changed();
        Ok(())
    }

    pub async fn handle_selection(&mut self, selection: Selection) -> Result<()> {
        match selection.action {
            ElementAction::SpeakPhrase(phrase_id) => {
                let phrase = self.store.get_phrase(phrase_id).await?;
                let text = phrase
                    .utterance(&self.locale)
                    .ok_or_else(|| anyhow!("phrase {phrase_id} has no utterance"))?;
                self.speaker.speak(text)?;
                self.store.phrase_spoken(phrase_id).await?;

                if self.current_category.as_deref() == Some(PresetCategory::Recents.id()) {
                    self.redraw().await?;
                }
                Ok(())
            }
            ElementAction::OpenCategory(category_id) => self.open_category(&category_id).await,
        }
    }

    /// Applies a driver command. `Quit` is the caller's to handle.
    pub async fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Pointer { x, y } => self.feed.push_pointer(x, y),
            Command::ShowError(error) => self.feed.show_error(error),
            Command::Rotate(degrees) => self.feed.rotate(degrees),
            Command::Pause(paused) => self.feed.set_paused(paused),
            Command::HeadTracking(enabled) => self.feed.set_head_tracking_enabled(enabled),
            Command::Open(category_id) => self.open_category(&category_id).await?,
            Command::AddSaying(text) => {
                self.store
                    .add_phrase(NewPhrase {
                        parent_category_id: PresetCategory::MySayings.id().to_string(),
                        localized_utterance: [(self.locale.clone(), text)].into(),
                        sort_order: None,
                    })
                    .await?;
                if self.current_category.as_deref() == Some(PresetCategory::MySayings.id()) {
                    self.redraw().await?;
                }
            }
            Command::Hide(category_id) => self.store.update_category_hidden(&category_id, true).await?,
            Command::Quit => {}
        }
        Ok(())
    }
}

fn display_name(category: &Category, locale: &str) -> String {
    match &category.name {
        CategoryName::Key(key) => key.clone(),
        CategoryName::Localized(names) => names
            .get(locale)
            .or_else(|| names.values().next())
            .cloned()
            .unwrap_or_else(|| category.id.clone()),
    }
}

fn data_dir() -> PathBuf {
    env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("vocable-data"))
}

pub fn run() -> Result<()> {
    init_logging();
    info!("Vocable starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;
    runtime.block_on(run_headless(data_dir()))
}

async fn run_headless(data_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

    let database = Database::new(data_dir.join("vocable.sqlite3"))?;
    let store = PresetsStore::new(database);
    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    let user = settings.current()?;

    let (selection_tx, mut selection_rx) = mpsc::unbounded_channel();
    let board = Arc::new(PhraseBoard::new(user.screen, user.dwell_time(), selection_tx));
    let (feed, signals) = tracking_channel(Rotation::Deg0, user.head_tracking_enabled);

    let mut controller = TrackingController::new();
    controller.start(
        PointerEngine::new(user.engine_config(), board.clone()),
        signals,
        Arc::new(LoggingTrackingSource),
    )?;

    let mut session = Session::new(store.clone(), Arc::new(LogSpeaker), board, feed, DEFAULT_LOCALE);
    session.open_first_category().await?;

    let mut categories_rx = store.subscribe_categories();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let command = match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => command,
                    Err(err) => {
                        warn!("{err:#}");
                        continue;
                    }
                };
                if let Command::HeadTracking(enabled) = command {
                    settings.set_head_tracking_enabled(enabled)?;
                }
                if let Err(err) = session.apply(command).await {
                    warn!("command failed: {err:#}");
                }
            }
            Some(selection) = selection_rx.recv() => {
                if let Err(err) = session.handle_selection(selection).await {
                    warn!("selection failed: {err:#}");
                }
            }
            Ok(()) = categories_rx.changed() => {
                let _ = categories_rx.borrow_and_update();
                session.redraw().await?;
            }
        }
    }

    controller.stop().await?;
    info!("Vocable shut down");
    Ok(())
}
