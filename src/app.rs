//! Bridges the session state machine to storage, background workers and
//! the presentation layer.
//!
//! All state lives on the control thread. Workers (scan, decode, timer,
//! watcher) only ever send `AppMessage`s back; `Slideshow::handle` is the
//! single entry point that mutates anything.

use crate::error::{AppError, ScanError};
use crate::file_utils::{PathExt, absolute_path, is_supported_image};
use crate::image_cache::{CacheKey, CachedImage, ImageCache};
use crate::image_loader::{self, Transform};
use crate::services::watch_service;
use crate::services::{FolderScanner, FolderWatcher, ScanMessage, Ticker, Trash};
use crate::settings::{Settings, SettingsStore};
use crate::state::session;
use crate::state::{
    FolderStats, HistoryStore, Notice, SchedulerCommand, SchedulerEvent, SessionScheduler,
    SessionState, Timing,
};
use crate::ui::Presenter;
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

/// Actions the user can trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    Next,
    Previous,
    Skip,
    TogglePause,
    Pause,
    Resume,
    Stop,
    Start,
    Delete,
    Rotate,
    FlipHorizontal,
    FlipVertical,
    ResetTransform,
    SkipBreak,
    ClearHistory,
    /// Opens the settings dialog on a copy of the current settings.
    OpenSettings,
    /// Edits one key of the open dialog's copy.
    SetSetting { key: String, value: String },
    /// Applies the edited copy and closes the dialog.
    CloseSettings,
    ChooseFolder(PathBuf),
    Status,
}

/// Everything that reaches the control thread.
#[derive(Debug)]
pub enum AppMessage {
    Scan(ScanMessage),
    Tick {
        generation: u64,
    },
    Decoded {
        path: PathBuf,
        result: Result<CachedImage, AppError>,
    },
    FileVanished(PathBuf),
    FileAppeared(PathBuf),
    User(UserCommand),
    Quit,
}

/// The slideshow application: settings, storage, scheduler and workers.
pub struct Slideshow<P: Presenter, T: Trash> {
    settings: Settings,
    settings_draft: Option<Settings>,
    settings_store: SettingsStore,
    files: Vec<PathBuf>,
    scanned_folder: Option<PathBuf>,
    history: HistoryStore,
    folder_stats: FolderStats,
    cache: ImageCache,
    pending_decodes: HashSet<PathBuf>,
    transform: Transform,
    scheduler: SessionScheduler,
    scanner: FolderScanner,
    ticker: Ticker,
    watcher: Option<FolderWatcher>,
    watch_enabled: bool,
    session_started: Option<DateTime<Local>>,
    sender: Sender<AppMessage>,
    presenter: P,
    trash: T,
}

impl<P: Presenter, T: Trash> Slideshow<P, T> {
    /// Loads settings, history and folder stats from `data_dir`.
    ///
    /// Returns the application and the receiving end of its message channel.
    pub fn new(data_dir: &Path, presenter: P, trash: T) -> (Self, Receiver<AppMessage>) {
        let (sender, receiver) = mpsc::channel();

        let settings_store = SettingsStore::in_dir(data_dir);
        let settings = settings_store.load();
        info!("Settings file: {}", settings_store.path().display());
        // backfill keys missing from older files
        if let Err(e) = settings_store.save(&settings) {
            warn!("Failed to write settings: {}", e);
        }

        let app = Self {
            history: HistoryStore::in_dir(data_dir, settings.save_history),
            folder_stats: FolderStats::in_dir(data_dir),
            cache: ImageCache::new(settings.cache_capacity),
            pending_decodes: HashSet::new(),
            transform: Transform::default(),
            scheduler: SessionScheduler::new(Timing::from(&settings)),
            scanner: FolderScanner::new(sender.clone()),
            ticker: Ticker::new(sender.clone()),
            watcher: None,
            watch_enabled: true,
            session_started: None,
            files: Vec::new(),
            scanned_folder: None,
            settings,
            settings_draft: None,
            settings_store,
            sender,
            presenter,
            trash,
        };
        (app, receiver)
    }

    /// Turns the folder watcher on or off for subsequent scans.
    pub fn with_folder_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    pub fn sender(&self) -> Sender<AppMessage> {
        self.sender.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.scheduler.state()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Starts scanning the configured folder, if there is one.
    pub fn start(&mut self) {
        match self.settings.folder.clone() {
            Some(folder) => self.choose_folder(folder),
            None => self.presenter.notify(&Notice::info(
                "Choose a folder",
                "Select a folder with reference images to begin",
            )),
        }
    }

    /// Processes messages until `Quit` arrives or every sender is gone.
    pub fn run(&mut self, receiver: Receiver<AppMessage>) {
        while let Ok(message) = receiver.recv() {
            if !self.handle(message) {
                break;
            }
        }
        self.ticker.stop();
        self.scanner.stop();
        info!("Slideshow shutting down");
    }

    /// Handles one message. Returns false when the application should quit.
    pub fn handle(&mut self, message: AppMessage) -> bool {
        match message {
            AppMessage::Scan(ScanMessage::Progress {
                generation,
                processed,
                total,
            }) => {
                if self.scanner.is_current(generation) {
                    self.presenter.scan_progress(processed, total);
                }
            }
            AppMessage::Scan(ScanMessage::Finished {
                generation,
                root,
                result,
            }) => self.on_scan_finished(generation, root, result),
            AppMessage::Tick { generation } => {
                if self.ticker.is_current(generation) {
                    self.dispatch(SchedulerEvent::Tick);
                } else {
                    debug!("Dropping stale tick {}", generation);
                }
            }
            AppMessage::Decoded { path, result } => self.on_decoded(path, result),
            AppMessage::FileVanished(path) => {
                if self.files.contains(&path) || self.scheduler.queue().contains(&path) {
                    info!("{} disappeared", path.format_for_log());
                    self.forget_file(&path);
                }
            }
            AppMessage::FileAppeared(path) => self.on_file_appeared(path),
            AppMessage::User(command) => self.on_user_command(command),
            AppMessage::Quit => return false,
        }
        true
    }

    fn on_user_command(&mut self, command: UserCommand) {
        match command {
            UserCommand::Next => self.dispatch(SchedulerEvent::Next),
            UserCommand::Previous => self.dispatch(SchedulerEvent::Previous),
            UserCommand::Skip => self.dispatch(SchedulerEvent::Skip),
            UserCommand::TogglePause => self.dispatch(SchedulerEvent::TogglePause),
            UserCommand::Pause => self.dispatch(SchedulerEvent::Pause),
            UserCommand::Resume => self.dispatch(SchedulerEvent::Resume),
            UserCommand::Stop => self.dispatch(SchedulerEvent::Stop),
            UserCommand::Start => self.dispatch(SchedulerEvent::StartSession),
            UserCommand::SkipBreak => self.dispatch(SchedulerEvent::SkipBreak),
            UserCommand::Delete => self.delete_current(),
            UserCommand::Rotate => self.change_transform(Transform::rotate),
            UserCommand::FlipHorizontal => self.change_transform(Transform::toggle_flip_horizontal),
            UserCommand::FlipVertical => self.change_transform(Transform::toggle_flip_vertical),
            UserCommand::ResetTransform => self.change_transform(Transform::reset),
            UserCommand::ClearHistory => {
                self.history.clear();
                self.presenter
                    .notify(&Notice::info("History cleared", "All images are available again"));
            }
            UserCommand::OpenSettings => self.open_settings(),
            UserCommand::SetSetting { key, value } => self.edit_setting(&key, &value),
            UserCommand::CloseSettings => {
                if let Some(draft) = self.settings_draft.take() {
                    self.apply_settings(draft);
                }
            }
            UserCommand::ChooseFolder(folder) => {
                let folder = absolute_path(&folder);
                self.settings.folder = Some(folder.clone());
                self.save_settings();
                self.choose_folder(folder);
            }
            UserCommand::Status => {
                let status = self.scheduler.status();
                self.presenter.status(&status);
            }
        }
    }

    /// Cancels whatever is running and scans `folder` from scratch.
    pub fn choose_folder(&mut self, folder: PathBuf) {
        self.watcher = None;
        self.cache.clear();
        self.pending_decodes.clear();
        self.files.clear();
        self.scanned_folder = None;
        self.dispatch(SchedulerEvent::ScanStarted);
        self.scanner.start(folder);
    }

    fn on_scan_finished(
        &mut self,
        generation: u64,
        root: PathBuf,
        result: Result<Vec<PathBuf>, ScanError>,
    ) {
        if !self.scanner.is_current(generation) {
            debug!("Ignoring stale scan of {}", root.display());
            return;
        }
        self.scanner.finish(generation);

        match result {
            Ok(files) => {
                self.files = files;
                self.scanned_folder = Some(root.clone());
                self.start_watcher(&root);
                self.plan_session();
            }
            Err(e) => {
                let notice = if e.is_soft() {
                    warn!("{}", e);
                    Notice::warning("No images", e.to_string())
                } else {
                    error!("Scan failed: {}", e);
                    Notice::error("Cannot open folder", e.to_string())
                };
                self.dispatch(SchedulerEvent::ScanFailed(notice));
            }
        }
    }

    fn start_watcher(&mut self, folder: &Path) {
        if !self.watch_enabled {
            return;
        }
        match watch_service::start_watching(folder, self.sender.clone()) {
            Ok(watcher) => {
                debug!("Watching {}", watcher.folder().display());
                self.watcher = Some(watcher);
            }
            Err(e) => warn!("{}", e),
        }
    }

    /// Builds the next session, rescanning first if the folder changed.
    fn plan_session(&mut self) {
        if self.settings.folder.is_some() && self.settings.folder != self.scanned_folder {
            if let Some(folder) = self.settings.folder.clone() {
                self.choose_folder(folder);
            }
            return;
        }

        let plan = session::plan(
            &self.files,
            &mut self.history,
            &self.settings,
            &mut rand::thread_rng(),
        );
        if plan.history_reset {
            self.presenter.notify(&Notice::warning(
                "History reset",
                "Every image has been shown, starting over",
            ));
        }
        if !plan.queue.is_empty() {
            if let Some(folder) = &self.scanned_folder {
                let count = self.folder_stats.increment(folder);
                debug!("{} sessions from {}", count, folder.display());
            }
            self.session_started = Some(Local::now());
        }
        self.dispatch(SchedulerEvent::SessionPlanned(plan.queue));
    }

    fn dispatch(&mut self, event: SchedulerEvent) {
        let commands = self.scheduler.process(event);
        self.execute(commands);
    }

    /// Executes scheduler commands, feeding synchronous results back in.
    fn execute(&mut self, commands: Vec<SchedulerCommand>) {
        let mut queue: VecDeque<SchedulerCommand> = commands.into();
        while let Some(command) = queue.pop_front() {
            match command {
                SchedulerCommand::Show(path) => {
                    if let Some(event) = self.show(&path) {
                        queue.extend(self.scheduler.process(event));
                    }
                }
                SchedulerCommand::StartTimer | SchedulerCommand::StopTimer => self.sync_ticker(),
                SchedulerCommand::RecordViewed(path) => {
                    if self.settings.tracks_history() {
                        self.history.record(&path);
                    }
                }
                SchedulerCommand::PlanSession => self.plan_session(),
                SchedulerCommand::SessionFinished { shown, aborted } => {
                    self.log_session_summary(shown, aborted)
                }
                SchedulerCommand::Notify(notice) => self.presenter.notify(&notice),
                SchedulerCommand::UpdateStatus => {
                    let status = self.scheduler.status();
                    self.presenter.status(&status);
                }
            }
        }
    }

    /// Runs the ticker exactly when the scheduler wants one.
    ///
    /// A nested `PlanSession` can start a timer before an earlier stop in the
    /// same batch is executed, so the scheduler flag is the source of truth.
    fn sync_ticker(&mut self) {
        if self.scheduler.is_timer_running() {
            self.ticker.start();
        } else {
            self.ticker.stop();
        }
    }

    /// Presents `path` from cache, or starts decoding it.
    ///
    /// A cache hit completes synchronously and yields the `ImageLoaded` event.
    fn show(&mut self, path: &Path) -> Option<SchedulerEvent> {
        let event = match self.cache.get(&CacheKey::original(path)) {
            Some(original) => Some(self.present(path, &original)),
            None => {
                self.spawn_decode(path);
                None
            }
        };
        self.preload_adjacent();
        event
    }

    fn present(&mut self, path: &Path, original: &CachedImage) -> SchedulerEvent {
        if self.transform.is_identity() {
            self.presenter.present(path, original, self.transform);
            return SchedulerEvent::ImageLoaded(path.to_path_buf());
        }

        let key = CacheKey::transformed(path, self.transform);
        let transform = self.transform;
        let transformed = self.cache.get_or_load(&key, || {
            transform.apply(original).ok_or_else(|| AppError::DecodeFailure {
                path: path.to_path_buf(),
                message: "pixel buffer does not match its dimensions".to_string(),
            })
        });

        match transformed {
            Ok(image) => {
                self.presenter.present(path, &image, self.transform);
                SchedulerEvent::ImageLoaded(path.to_path_buf())
            }
            Err(e) => self.failure_event(path, &e),
        }
    }

    fn spawn_decode(&mut self, path: &Path) {
        if !self.pending_decodes.insert(path.to_path_buf()) {
            return;
        }
        let path = path.to_path_buf();
        let sender = self.sender.clone();
        rayon::spawn(move || {
            let result = image_loader::decode(&path);
            let _ = sender.send(AppMessage::Decoded { path, result });
        });
    }

    /// Decodes the neighbours of the current image in the background.
    fn preload_adjacent(&mut self) {
        let queue = self.scheduler.queue();
        let neighbours: Vec<PathBuf> = [queue.peek_next(), queue.peek_previous()]
            .into_iter()
            .flatten()
            .map(Path::to_path_buf)
            .collect();

        for path in neighbours {
            if !self.cache.contains(&CacheKey::original(&path)) {
                debug!("Preloading {}", path.format_for_log());
                self.spawn_decode(&path);
            }
        }
    }

    fn on_decoded(&mut self, path: PathBuf, result: Result<CachedImage, AppError>) {
        self.pending_decodes.remove(&path);
        let is_current = self.scheduler.current() == Some(path.as_path())
            && matches!(
                self.scheduler.state(),
                SessionState::Active | SessionState::Paused
            );

        let event = match result {
            Ok(image) => {
                // the file may have vanished while it was decoding
                if !self.files.contains(&path) {
                    debug!("Dropping decode of removed {}", path.format_for_log());
                    return;
                }
                self.cache.put(CacheKey::original(&path), image.clone());
                if !is_current {
                    return;
                }
                self.present(&path, &image)
            }
            Err(e) => {
                if matches!(e, AppError::NotFound(_)) {
                    self.forget_file_silently(&path);
                }
                if !is_current {
                    debug!("Background decode failed: {}", e);
                    return;
                }
                self.failure_event(&path, &e)
            }
        };
        self.dispatch(event);
    }

    fn failure_event(&self, path: &Path, e: &AppError) -> SchedulerEvent {
        error!("Failed to load {}: {}", path.display(), e);
        SchedulerEvent::ImageFailed {
            path: path.to_path_buf(),
            notice: Notice::error("Cannot open image", e.to_string()),
        }
    }

    fn change_transform(&mut self, change: fn(&mut Transform)) {
        let previous = self.transform;
        change(&mut self.transform);
        if previous == self.transform {
            return;
        }
        let Some(current) = self.scheduler.current().map(Path::to_path_buf) else {
            return;
        };
        if !previous.is_identity() {
            self.cache.invalidate(&CacheKey::transformed(&current, previous));
        }
        if let Some(original) = self.cache.get(&CacheKey::original(&current)) {
            let event = self.present(&current, &original);
            self.dispatch(event);
        }
    }

    fn delete_current(&mut self) {
        let Some(path) = self.scheduler.current().map(Path::to_path_buf) else {
            return;
        };
        match self.trash.trash(&path) {
            Ok(()) => self.forget_file(&path),
            Err(e) => {
                let err = AppError::from_io(&path, e);
                error!("Failed to delete {}: {}", path.display(), err);
                self.presenter
                    .notify(&Notice::error("Cannot delete image", err.to_string()));
            }
        }
    }

    /// Drops every trace of a file that no longer exists.
    fn forget_file(&mut self, path: &Path) {
        self.forget_file_silently(path);
        self.dispatch(SchedulerEvent::FileRemoved(path.to_path_buf()));
    }

    /// Like `forget_file`, but leaves the session queue to the scheduler.
    fn forget_file_silently(&mut self, path: &Path) {
        self.files.retain(|p| p != path);
        self.history.remove(path);
        self.cache.invalidate_path(path);
    }

    fn on_file_appeared(&mut self, path: PathBuf) {
        if !is_supported_image(&path) || self.files.contains(&path) {
            return;
        }
        let in_folder = self
            .scanned_folder
            .as_ref()
            .is_some_and(|folder| path.starts_with(folder));
        if in_folder {
            info!("{} appeared", path.format_for_log());
            let index = self.files.partition_point(|p| p < &path);
            self.files.insert(index, path);
        }
    }

    fn open_settings(&mut self) {
        let draft = self
            .settings_draft
            .get_or_insert_with(|| self.settings.clone())
            .clone();
        self.dispatch(SchedulerEvent::SettingsOpened);
        let summary = serde_json::to_string(&draft).unwrap_or_default();
        self.presenter.notify(&Notice::info("Settings", summary));
    }

    fn edit_setting(&mut self, key: &str, value: &str) {
        if !self.scheduler.is_settings_open() {
            self.presenter.notify(&Notice::warning(
                "Settings closed",
                "Open the settings before changing them",
            ));
            return;
        }
        let draft = self.settings_draft.get_or_insert_with(|| self.settings.clone());
        match draft.with_value(key, value) {
            Ok(edited) => {
                debug!("Setting {} = {}", key, value);
                *draft = edited;
            }
            Err(e) => {
                warn!("{}", e);
                self.presenter
                    .notify(&Notice::warning("Invalid setting", e.to_string()));
            }
        }
    }

    fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.normalized();
        let folder_changed = settings.folder != self.settings.folder;

        self.history.set_persist(settings.save_history);
        if settings.cache_capacity != self.cache.capacity() {
            self.cache.resize(settings.cache_capacity);
        }
        let timing = Timing::from(&settings);
        if timing != self.scheduler.timing() {
            info!("Timing changed: {:?}", timing);
        }
        self.settings = settings;
        self.save_settings();
        self.dispatch(SchedulerEvent::SettingsClosed(timing));

        if folder_changed {
            if let Some(folder) = self.settings.folder.clone() {
                self.choose_folder(folder);
            }
        }
    }

    fn save_settings(&self) {
        if let Err(e) = self.settings_store.save(&self.settings) {
            error!("Failed to save settings: {}", e);
        }
    }

    fn log_session_summary(&mut self, shown: usize, aborted: bool) {
        let finished = Local::now();
        let Some(started) = self.session_started.take() else {
            return;
        };
        let elapsed = finished.signed_duration_since(started);
        info!(
            "Session {} at {}: {} images in {}m{:02}s",
            if aborted { "ended early" } else { "finished" },
            finished.format("%H:%M:%S"),
            shown,
            elapsed.num_minutes(),
            elapsed.num_seconds() % 60
        );
    }
}
