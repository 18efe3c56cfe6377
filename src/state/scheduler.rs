//! GUI-free session state machine.
//!
//! Owns the session queue and both countdowns. Events come from the timer,
//! the user and the loaders; the returned commands are executed by the
//! application layer, which feeds results back as further events.

use crate::settings::{Limit, Settings};
use crate::state::session::{SessionQueue, Step};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing loaded yet, or the last scan/plan produced nothing
    Idle,
    /// Waiting for the folder scan
    Scanning,
    /// Showing images, countdown running (unless display time is unlimited)
    Active,
    /// Countdown frozen by the user
    Paused,
    /// Queue exhausted; resolves to OnBreak or Completed within the same event
    Finishing,
    /// Counting down the break between sessions
    OnBreak,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A message for the notification surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, message)
    }
}

/// The subset of settings the scheduler acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub display_time: Limit,
    pub use_break: bool,
    pub break_duration: u32,
    pub max_load_failures: u32,
}

impl From<&Settings> for Timing {
    fn from(settings: &Settings) -> Self {
        Self {
            display_time: settings.display_time,
            use_break: settings.use_break,
            break_duration: settings.break_duration,
            max_load_failures: settings.max_load_failures,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing::from(&Settings::default())
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    ScanStarted,
    ScanFailed(Notice),
    SessionPlanned(SessionQueue),
    Tick,

    // User actions
    TogglePause,
    Pause,
    Resume,
    Next,
    Previous,
    Skip,
    SkipBreak,
    StartSession,
    Stop,
    SettingsOpened,
    SettingsClosed(Timing),

    // Loader and filesystem results
    ImageLoaded(PathBuf),
    ImageFailed { path: PathBuf, notice: Notice },
    FileRemoved(PathBuf),
}

/// Commands emitted by the state machine for the application layer to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Load and present this image
    Show(PathBuf),
    StartTimer,
    StopTimer,
    /// Add to viewing history
    RecordViewed(PathBuf),
    /// Build a new queue (rescanning first if the folder changed)
    PlanSession,
    SessionFinished { shown: usize, aborted: bool },
    Notify(Notice),
    /// Countdown or position changed
    UpdateStatus,
}

/// Read-only view for status lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub state: SessionState,
    /// One-based position in the session, 0 when no session runs.
    pub position: usize,
    pub total: usize,
    pub remaining_time: Option<u32>,
    pub break_remaining: Option<u32>,
    pub settings_open: bool,
}

#[derive(Debug)]
pub struct SessionScheduler {
    state: SessionState,
    timing: Timing,
    queue: SessionQueue,
    remaining_time: Option<u32>,
    break_remaining: u32,
    failure_streak: u32,
    settings_open: bool,
    timer_running: bool,
    viewed: HashSet<PathBuf>,
}

impl SessionScheduler {
    pub fn new(timing: Timing) -> Self {
        Self {
            state: SessionState::Idle,
            timing,
            queue: SessionQueue::default(),
            remaining_time: None,
            break_remaining: 0,
            failure_streak: 0,
            settings_open: false,
            timer_running: false,
            viewed: HashSet::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn queue(&self) -> &SessionQueue {
        &self.queue
    }

    pub fn current(&self) -> Option<&Path> {
        self.queue.current()
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn remaining_time(&self) -> Option<u32> {
        self.remaining_time
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer_running
    }

    pub fn is_settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn status(&self) -> StatusSnapshot {
        let in_session = matches!(self.state, SessionState::Active | SessionState::Paused);
        StatusSnapshot {
            state: self.state,
            position: if in_session { self.queue.position() + 1 } else { 0 },
            total: if in_session { self.queue.len() } else { 0 },
            remaining_time: if in_session { self.remaining_time } else { None },
            break_remaining: (self.state == SessionState::OnBreak).then_some(self.break_remaining),
            settings_open: self.settings_open,
        }
    }

    fn in_session(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::Paused)
    }

    /// Process an event and return commands to execute
    pub fn process(&mut self, event: SchedulerEvent) -> Vec<SchedulerCommand> {
        let mut commands = Vec::new();
        let before = self.state;

        match event {
            SchedulerEvent::ScanStarted => {
                self.queue = SessionQueue::default();
                self.remaining_time = None;
                self.state = SessionState::Scanning;
            }

            SchedulerEvent::ScanFailed(notice) => {
                if self.state == SessionState::Scanning {
                    self.state = SessionState::Idle;
                }
                commands.push(SchedulerCommand::Notify(notice));
            }

            SchedulerEvent::SessionPlanned(queue) => self.begin_session(queue, &mut commands),

            SchedulerEvent::Tick => self.tick(&mut commands),

            SchedulerEvent::TogglePause => match self.state {
                SessionState::Active => self.state = SessionState::Paused,
                SessionState::Paused => self.state = SessionState::Active,
                _ => {}
            },

            SchedulerEvent::Pause => {
                if self.state == SessionState::Active {
                    self.state = SessionState::Paused;
                }
            }

            SchedulerEvent::Resume => {
                if self.state == SessionState::Paused {
                    self.state = SessionState::Active;
                }
            }

            SchedulerEvent::Next => {
                if self.in_session() {
                    self.advance(&mut commands);
                }
            }

            SchedulerEvent::Previous => {
                if self.in_session() {
                    if let Step::Moved(path) = self.queue.go_previous() {
                        self.show(path, &mut commands);
                    }
                }
            }

            SchedulerEvent::Skip => {
                if self.in_session() {
                    if let Some(skipped) = self.queue.skip() {
                        debug!("Skipped {}", skipped.display());
                    }
                    self.show_current_or_finish(&mut commands);
                }
            }

            SchedulerEvent::SkipBreak => {
                if self.state == SessionState::OnBreak {
                    info!("Break skipped");
                    self.end_break(&mut commands);
                }
            }

            SchedulerEvent::StartSession => {
                if matches!(self.state, SessionState::Idle | SessionState::Completed) {
                    commands.push(SchedulerCommand::PlanSession);
                }
            }

            SchedulerEvent::Stop => match self.state {
                SessionState::Active | SessionState::Paused => {
                    commands.push(SchedulerCommand::SessionFinished {
                        shown: self.viewed.len(),
                        aborted: true,
                    });
                    self.state = SessionState::Completed;
                }
                SessionState::OnBreak => self.state = SessionState::Completed,
                _ => {}
            },

            SchedulerEvent::SettingsOpened => self.settings_open = true,

            SchedulerEvent::SettingsClosed(timing) => {
                self.settings_open = false;
                self.apply_timing(timing);
            }

            SchedulerEvent::ImageLoaded(path) => {
                if self.in_session() && self.queue.current() == Some(path.as_path()) {
                    self.failure_streak = 0;
                    self.viewed.insert(path.clone());
                    commands.push(SchedulerCommand::RecordViewed(path));
                }
            }

            SchedulerEvent::ImageFailed { path, notice } => {
                if self.in_session() && self.queue.current() == Some(path.as_path()) {
                    self.image_failed(notice, &mut commands);
                }
            }

            SchedulerEvent::FileRemoved(path) => {
                if self.in_session() {
                    let current_changed = self.queue.remove(&path);
                    if self.queue.is_empty() {
                        self.finish(false, &mut commands);
                    } else if current_changed {
                        self.show_current_or_finish(&mut commands);
                    }
                    commands.push(SchedulerCommand::UpdateStatus);
                }
            }
        }

        if before != self.state {
            info!("Session state: {:?} -> {:?}", before, self.state);
            commands.push(SchedulerCommand::UpdateStatus);
        }
        self.sync_timer(&mut commands);
        commands
    }

    fn begin_session(&mut self, queue: SessionQueue, commands: &mut Vec<SchedulerCommand>) {
        self.failure_streak = 0;
        self.viewed.clear();
        self.queue = queue;

        let Some(first) = self.queue.current().map(Path::to_path_buf) else {
            warn!("Planned session is empty");
            self.state = SessionState::Idle;
            commands.push(SchedulerCommand::Notify(Notice::warning(
                "No images",
                "There are no images to show in this folder",
            )));
            return;
        };

        info!(
            "Session of {} images ({} in reserve)",
            self.queue.len(),
            self.queue.reserve_len()
        );
        self.state = SessionState::Active;
        self.show(first, commands);
    }

    fn tick(&mut self, commands: &mut Vec<SchedulerCommand>) {
        if self.settings_open {
            return;
        }
        match self.state {
            SessionState::Active => {
                let Some(remaining) = self.remaining_time.as_mut() else {
                    return;
                };
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.advance(commands);
                } else {
                    commands.push(SchedulerCommand::UpdateStatus);
                }
            }
            SessionState::OnBreak => {
                self.break_remaining = self.break_remaining.saturating_sub(1);
                if self.break_remaining == 0 {
                    info!("Break finished");
                    self.end_break(commands);
                } else {
                    commands.push(SchedulerCommand::UpdateStatus);
                }
            }
            _ => {}
        }
    }

    /// Moves to the next image or finishes the session at the end.
    fn advance(&mut self, commands: &mut Vec<SchedulerCommand>) {
        match self.queue.advance() {
            Step::Moved(path) => self.show(path, commands),
            Step::Exhausted => self.finish(false, commands),
            Step::Stayed => {}
        }
    }

    fn show(&mut self, path: PathBuf, commands: &mut Vec<SchedulerCommand>) {
        self.remaining_time = self.timing.display_time.bounded();
        commands.push(SchedulerCommand::Show(path));
        commands.push(SchedulerCommand::UpdateStatus);
    }

    fn show_current_or_finish(&mut self, commands: &mut Vec<SchedulerCommand>) {
        match self.queue.current().map(Path::to_path_buf) {
            Some(path) => self.show(path, commands),
            None => self.finish(false, commands),
        }
    }

    fn image_failed(&mut self, notice: Notice, commands: &mut Vec<SchedulerCommand>) {
        self.failure_streak += 1;
        warn!(
            "Image failed to load ({} in a row): {}",
            self.failure_streak, notice.message
        );
        commands.push(SchedulerCommand::Notify(notice));

        if self.failure_streak >= self.timing.max_load_failures {
            commands.push(SchedulerCommand::Notify(Notice::error(
                "Session aborted",
                format!("{} images in a row could not be loaded", self.failure_streak),
            )));
            self.finish(true, commands);
            return;
        }

        self.queue.replace_current();
        self.show_current_or_finish(commands);
    }

    fn finish(&mut self, aborted: bool, commands: &mut Vec<SchedulerCommand>) {
        self.state = SessionState::Finishing;
        self.remaining_time = None;
        commands.push(SchedulerCommand::SessionFinished {
            shown: self.viewed.len(),
            aborted,
        });

        if self.timing.use_break && !aborted {
            self.break_remaining = self.timing.break_duration.max(1);
            self.state = SessionState::OnBreak;
            commands.push(SchedulerCommand::Notify(Notice::info(
                "Break",
                format!("Take a break: {}", format_clock(self.break_remaining)),
            )));
        } else {
            self.state = SessionState::Completed;
            if !aborted {
                commands.push(SchedulerCommand::Notify(Notice::info(
                    "Session complete",
                    "Session finished successfully",
                )));
            }
        }
    }

    fn end_break(&mut self, commands: &mut Vec<SchedulerCommand>) {
        self.break_remaining = 0;
        self.state = SessionState::Completed;
        commands.push(SchedulerCommand::PlanSession);
    }

    fn apply_timing(&mut self, timing: Timing) {
        self.timing = timing;
        if !self.in_session() {
            return;
        }
        self.remaining_time = match (timing.display_time, self.remaining_time) {
            (Limit::Unlimited, _) => None,
            (Limit::Bounded(n), None) => Some(n),
            (Limit::Bounded(n), Some(left)) => Some(left.min(n)),
        };
    }

    /// Starts or stops the external timer so it runs exactly when ticks matter.
    fn sync_timer(&mut self, commands: &mut Vec<SchedulerCommand>) {
        let wanted = !self.settings_open
            && match self.state {
                SessionState::Active => self.remaining_time.is_some(),
                SessionState::OnBreak => true,
                _ => false,
            };

        if wanted != self.timer_running {
            self.timer_running = wanted;
            commands.push(if wanted {
                SchedulerCommand::StartTimer
            } else {
                SchedulerCommand::StopTimer
            });
        }
    }
}

/// `mm:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("/refs/{i}.png"))).collect()
    }

    fn timing(display: u32, use_break: bool) -> Timing {
        Timing {
            display_time: Limit::Bounded(display),
            use_break,
            break_duration: 3,
            max_load_failures: 5,
        }
    }

    fn started(timing: Timing, n: usize) -> (SessionScheduler, Vec<SchedulerCommand>) {
        let mut sm = SessionScheduler::new(timing);
        sm.process(SchedulerEvent::ScanStarted);
        let cmds = sm.process(SchedulerEvent::SessionPlanned(SessionQueue::new(paths(n))));
        (sm, cmds)
    }

    fn shows(cmds: &[SchedulerCommand]) -> Vec<PathBuf> {
        cmds.iter()
            .filter_map(|c| match c {
                SchedulerCommand::Show(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    fn has(cmds: &[SchedulerCommand], wanted: &SchedulerCommand) -> bool {
        cmds.iter().any(|c| c == wanted)
    }

    #[test]
    fn test_initial_state() {
        let sm = SessionScheduler::new(Timing::default());
        assert_eq!(sm.state(), SessionState::Idle);
        assert!(!sm.is_timer_running());
        assert_eq!(sm.status().position, 0);
    }

    #[test]
    fn test_session_start_shows_first_and_starts_timer() {
        let (sm, cmds) = started(timing(2, false), 3);
        assert_eq!(sm.state(), SessionState::Active);
        assert_eq!(shows(&cmds), vec![PathBuf::from("/refs/0.png")]);
        assert!(has(&cmds, &SchedulerCommand::StartTimer));
        assert_eq!(sm.remaining_time(), Some(2));
        assert_eq!(sm.status().position, 1);
        assert_eq!(sm.status().total, 3);
    }

    #[test]
    fn test_countdown_reaches_zero_after_exactly_t_ticks() {
        let (mut sm, _) = started(timing(5, false), 3);
        for _ in 0..4 {
            let cmds = sm.process(SchedulerEvent::Tick);
            assert!(shows(&cmds).is_empty());
        }
        assert_eq!(sm.remaining_time(), Some(1));
        let cmds = sm.process(SchedulerEvent::Tick);
        assert_eq!(shows(&cmds), vec![PathBuf::from("/refs/1.png")]);
        assert_eq!(sm.remaining_time(), Some(5));
    }

    #[test]
    fn test_pause_freezes_countdown() {
        let (mut sm, _) = started(timing(4, false), 2);
        sm.process(SchedulerEvent::Tick);
        let cmds = sm.process(SchedulerEvent::TogglePause);
        assert_eq!(sm.state(), SessionState::Paused);
        assert!(has(&cmds, &SchedulerCommand::StopTimer));

        // stray ticks while paused count nothing
        for _ in 0..3 {
            sm.process(SchedulerEvent::Tick);
        }
        assert_eq!(sm.remaining_time(), Some(3));

        let cmds = sm.process(SchedulerEvent::TogglePause);
        assert!(has(&cmds, &SchedulerCommand::StartTimer));
        assert_eq!(sm.remaining_time(), Some(3));

        let mut counted = 0;
        while sm.current() == Some(Path::new("/refs/0.png")) {
            sm.process(SchedulerEvent::Tick);
            counted += 1;
        }
        // 3 ticks after resuming; with the one before the pause that makes 4
        assert_eq!(counted, 3);
    }

    #[test]
    fn test_unlimited_time_never_runs_timer() {
        let t = Timing {
            display_time: Limit::Unlimited,
            ..timing(1, false)
        };
        let (mut sm, cmds) = started(t, 2);
        assert!(!has(&cmds, &SchedulerCommand::StartTimer));
        assert_eq!(sm.remaining_time(), None);

        for _ in 0..10 {
            sm.process(SchedulerEvent::Tick);
        }
        assert_eq!(sm.current(), Some(Path::new("/refs/0.png")));

        let cmds = sm.process(SchedulerEvent::Next);
        assert_eq!(shows(&cmds), vec![PathBuf::from("/refs/1.png")]);
    }

    #[test]
    fn test_full_session_completes_without_breaks() {
        let (mut sm, _) = started(timing(2, false), 3);
        let mut finished = Vec::new();
        for _ in 0..6 {
            finished.extend(sm.process(SchedulerEvent::Tick));
        }
        assert_eq!(sm.state(), SessionState::Completed);
        assert!(finished
            .iter()
            .any(|c| matches!(c, SchedulerCommand::SessionFinished { aborted: false, .. })));
        assert!(has(&finished, &SchedulerCommand::StopTimer));
        assert!(!sm.is_timer_running());
    }

    #[test]
    fn test_break_then_new_session() {
        let (mut sm, _) = started(timing(1, true), 1);
        let cmds = sm.process(SchedulerEvent::Tick);
        assert_eq!(sm.state(), SessionState::OnBreak);
        assert_eq!(sm.status().break_remaining, Some(3));
        assert!(sm.is_timer_running());
        // session timer hands over to break timer without a restart
        assert!(!has(&cmds, &SchedulerCommand::StopTimer));

        sm.process(SchedulerEvent::Tick);
        sm.process(SchedulerEvent::Tick);
        let cmds = sm.process(SchedulerEvent::Tick);
        assert!(has(&cmds, &SchedulerCommand::PlanSession));
        assert!(has(&cmds, &SchedulerCommand::StopTimer));
        assert_eq!(sm.state(), SessionState::Completed);

        sm.process(SchedulerEvent::SessionPlanned(SessionQueue::new(paths(2))));
        assert_eq!(sm.state(), SessionState::Active);
    }

    #[test]
    fn test_skip_break_plans_immediately() {
        let (mut sm, _) = started(timing(1, true), 1);
        sm.process(SchedulerEvent::Next);
        assert_eq!(sm.state(), SessionState::OnBreak);

        let cmds = sm.process(SchedulerEvent::SkipBreak);
        assert!(has(&cmds, &SchedulerCommand::PlanSession));
        assert!(!sm.is_timer_running());
    }

    #[test]
    fn test_previous_is_noop_at_start_and_resets_countdown() {
        let (mut sm, _) = started(timing(5, false), 3);
        let cmds = sm.process(SchedulerEvent::Previous);
        assert!(shows(&cmds).is_empty());

        sm.process(SchedulerEvent::Next);
        sm.process(SchedulerEvent::Tick);
        let cmds = sm.process(SchedulerEvent::Previous);
        assert_eq!(shows(&cmds), vec![PathBuf::from("/refs/0.png")]);
        assert_eq!(sm.remaining_time(), Some(5));
    }

    #[test]
    fn test_skip_keeps_cursor_valid_and_ends_when_empty() {
        let (mut sm, _) = started(timing(5, false), 2);
        let cmds = sm.process(SchedulerEvent::Skip);
        assert_eq!(sm.queue().len(), 1);
        assert_eq!(shows(&cmds), vec![PathBuf::from("/refs/1.png")]);
        assert!(!cmds
            .iter()
            .any(|c| matches!(c, SchedulerCommand::RecordViewed(_))));

        sm.process(SchedulerEvent::Skip);
        assert_eq!(sm.state(), SessionState::Completed);
    }

    #[test]
    fn test_loaded_image_is_recorded_once_shown() {
        let (mut sm, _) = started(timing(5, false), 2);
        let cmds = sm.process(SchedulerEvent::ImageLoaded(PathBuf::from("/refs/0.png")));
        assert!(has(
            &cmds,
            &SchedulerCommand::RecordViewed(PathBuf::from("/refs/0.png"))
        ));

        // a late result for another image is not a display event
        let cmds = sm.process(SchedulerEvent::ImageLoaded(PathBuf::from("/refs/1.png")));
        assert!(cmds.is_empty());
    }

    #[test]
    fn test_single_failure_substitutes_from_reserve() {
        let mut sm = SessionScheduler::new(timing(5, false));
        let queue = SessionQueue::with_reserve(paths(2), vec![PathBuf::from("/refs/r.png")]);
        sm.process(SchedulerEvent::SessionPlanned(queue));

        let cmds = sm.process(SchedulerEvent::ImageFailed {
            path: PathBuf::from("/refs/0.png"),
            notice: Notice::error("Load failed", "corrupt"),
        });
        assert_eq!(shows(&cmds), vec![PathBuf::from("/refs/1.png")]);
        assert_eq!(sm.queue().len(), 2);
        assert_eq!(sm.state(), SessionState::Active);
    }

    #[test]
    fn test_failure_streak_aborts_session() {
        let t = Timing {
            max_load_failures: 3,
            ..timing(5, true)
        };
        let (mut sm, _) = started(t, 10);
        for _ in 0..3 {
            let path = sm.current().unwrap().to_path_buf();
            sm.process(SchedulerEvent::ImageFailed {
                path,
                notice: Notice::error("Load failed", "missing"),
            });
        }
        // aborted sessions never go on break
        assert_eq!(sm.state(), SessionState::Completed);
        assert!(!sm.is_timer_running());
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let t = Timing {
            max_load_failures: 2,
            ..timing(5, false)
        };
        let (mut sm, _) = started(t, 10);
        for _ in 0..4 {
            let path = sm.current().unwrap().to_path_buf();
            sm.process(SchedulerEvent::ImageFailed {
                path,
                notice: Notice::error("Load failed", "missing"),
            });
            let path = sm.current().unwrap().to_path_buf();
            sm.process(SchedulerEvent::ImageLoaded(path));
            sm.process(SchedulerEvent::Next);
        }
        assert_eq!(sm.state(), SessionState::Active);
    }

    #[test]
    fn test_settings_dialog_preserves_pause() {
        let (mut sm, _) = started(timing(5, false), 3);
        sm.process(SchedulerEvent::Pause);
        sm.process(SchedulerEvent::SettingsOpened);
        sm.process(SchedulerEvent::SettingsClosed(timing(5, false)));
        assert_eq!(sm.state(), SessionState::Paused);
        assert!(!sm.is_timer_running());
    }

    #[test]
    fn test_settings_dialog_suspends_ticks() {
        let (mut sm, _) = started(timing(5, false), 3);
        let cmds = sm.process(SchedulerEvent::SettingsOpened);
        assert!(has(&cmds, &SchedulerCommand::StopTimer));
        sm.process(SchedulerEvent::Tick);
        assert_eq!(sm.remaining_time(), Some(5));

        let cmds = sm.process(SchedulerEvent::SettingsClosed(timing(3, false)));
        assert!(has(&cmds, &SchedulerCommand::StartTimer));
        assert_eq!(sm.state(), SessionState::Active);
        assert_eq!(sm.remaining_time(), Some(3));
    }

    #[test]
    fn test_file_removed_shows_next_or_finishes() {
        let (mut sm, _) = started(timing(5, false), 2);
        let cmds = sm.process(SchedulerEvent::FileRemoved(PathBuf::from("/refs/0.png")));
        assert_eq!(shows(&cmds), vec![PathBuf::from("/refs/1.png")]);

        let cmds = sm.process(SchedulerEvent::FileRemoved(PathBuf::from("/refs/9.png")));
        assert!(shows(&cmds).is_empty());

        sm.process(SchedulerEvent::FileRemoved(PathBuf::from("/refs/1.png")));
        assert_eq!(sm.state(), SessionState::Completed);
    }

    #[test]
    fn test_empty_plan_returns_to_idle_with_warning() {
        let mut sm = SessionScheduler::new(Timing::default());
        sm.process(SchedulerEvent::ScanStarted);
        let cmds = sm.process(SchedulerEvent::SessionPlanned(SessionQueue::default()));
        assert_eq!(sm.state(), SessionState::Idle);
        assert!(cmds.iter().any(|c| matches!(
            c,
            SchedulerCommand::Notify(Notice { severity: Severity::Warning, .. })
        )));
    }

    #[test]
    fn test_stop_skips_break() {
        let (mut sm, _) = started(timing(5, true), 3);
        let cmds = sm.process(SchedulerEvent::Stop);
        assert_eq!(sm.state(), SessionState::Completed);
        assert!(has(&cmds, &SchedulerCommand::StopTimer));

        let cmds = sm.process(SchedulerEvent::StartSession);
        assert!(has(&cmds, &SchedulerCommand::PlanSession));
    }

    #[test]
    fn test_clock_format() {
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(61), "01:01");
    }
}
