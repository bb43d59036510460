//! Application controller and coordination layer
//!
//! The controller executes user commands against the link list, the config,
//! a clipboard source and a process launcher. It never calls Win32 for UI
//! work itself; it returns `Effect`s that the window layer applies.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::app::command::Command;
use crate::app::state::{AppState, StateEvent, StateMachine};
use crate::config::{AppConfig, AppPaths, ConfigError};
use crate::domain::download::plan_jobs;
use crate::domain::hotkey::HotkeyBindings;
use crate::domain::link_kind::DownloadFolders;
use crate::domain::link_list::{LinkList, LinkListError, extract_links};
use crate::platform::clipboard::{ClipboardError, ClipboardSource};
use crate::platform::process::Launcher;

/// Balloon title used for every notification
pub const APP_TITLE: &str = "YT Downloader";

/// Application errors that can occur during controller operations
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    LinkList(#[from] LinkListError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Instruction for the window layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Redraw the tray icon and tooltip
    Status { state: AppState, queued: usize },
    /// Show a tray balloon
    Notify { title: String, message: String },
    /// Open a file or folder with its default handler
    Open(PathBuf),
    /// Replace the registered global hotkeys
    RebindHotkeys(HotkeyBindings),
    /// Tear down the tray and leave the message loop
    Quit,
}

/// Tray tooltip for a queue length
pub fn tooltip(queued: usize) -> String {
    match queued {
        0 => APP_TITLE.to_string(),
        1 => format!("{APP_TITLE} (1 link queued)"),
        n => format!("{APP_TITLE} ({n} links queued)"),
    }
}

/// Main application controller
pub struct AppController<C, L> {
    paths: AppPaths,
    config: AppConfig,
    links: LinkList,
    clipboard: C,
    launcher: L,
    state: AppState,
}

impl<C: ClipboardSource, L: Launcher> AppController<C, L> {
    pub fn new(paths: AppPaths, config: AppConfig, clipboard: C, launcher: L) -> Self {
        let links = LinkList::new(paths.list_file.clone());
        Self {
            paths,
            config,
            links,
            clipboard,
            launcher,
            state: AppState::Idle,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn folders(&self) -> DownloadFolders {
        DownloadFolders::new(self.config.downloads_base(&self.paths))
    }

    /// Creates the download folders and an empty list file
    pub fn prepare(&self) -> Result<(), AppError> {
        let folders = self.folders();
        folders.ensure().map_err(|source| AppError::CreateDir {
            path: folders.base().to_path_buf(),
            source,
        })?;
        self.links.ensure_exists()?;
        Ok(())
    }

    /// Number of queued links; an unreadable list counts as empty
    pub fn queued(&self) -> usize {
        match self.links.read() {
            Ok(links) => links.len(),
            Err(err) => {
                tracing::warn!("could not read link list: {err}");
                0
            }
        }
    }

    /// Effects to apply once the tray window exists
    pub fn startup_effects(&self) -> Vec<Effect> {
        let mut effects = vec![self.status_effect()];
        match self.config.hotkey_bindings() {
            Ok(bindings) => effects.push(Effect::RebindHotkeys(bindings)),
            Err(err) => {
                tracing::warn!("hotkeys disabled: {err}");
                effects.extend(self.notify(format!("Hotkeys disabled: {err}")));
            }
        }
        effects
    }

    pub fn handle(&mut self, command: Command) -> Result<Vec<Effect>, AppError> {
        tracing::debug!(?command, "handling command");
        match command {
            Command::AddFromClipboard => self.add_from_clipboard(),
            Command::DownloadAll => self.download_all(),
            Command::OpenList => {
                self.links.ensure_exists()?;
                Ok(vec![Effect::Open(self.links.path().to_path_buf())])
            }
            Command::OpenDownloads => {
                self.prepare()?;
                Ok(vec![Effect::Open(self.folders().base().to_path_buf())])
            }
            Command::OpenSettings => {
                if !self.paths.config_file.exists() {
                    self.config.save(&self.paths.config_file)?;
                }
                Ok(vec![Effect::Open(self.paths.config_file.clone())])
            }
            Command::ReloadSettings => Ok(self.reload_settings()),
            Command::ShowInfo => {
                if self.paths.info_file.exists() {
                    Ok(vec![Effect::Open(self.paths.info_file.clone())])
                } else {
                    tracing::info!("info file missing at {}", self.paths.info_file.display());
                    Ok(self.notify("info.txt not found".to_string()))
                }
            }
            Command::Exit => Ok(vec![Effect::Quit]),
        }
    }

    /// Called when the icon flash runs out
    pub fn on_status_timer(&mut self) -> Vec<Effect> {
        self.transition(StateEvent::StatusTimerElapsed);
        vec![self.status_effect()]
    }

    /// Turns a failed command into a user-visible balloon
    pub fn error_effects(&self, err: &AppError) -> Vec<Effect> {
        self.notify(format!("Something went wrong: {err}"))
    }

    fn add_from_clipboard(&mut self) -> Result<Vec<Effect>, AppError> {
        let capture = &self.config.capture;
        if capture.copy_selection {
            self.clipboard
                .copy_selection(Duration::from_millis(capture.copy_delay_ms))?;
        }

        let text = self.clipboard.read_text()?.unwrap_or_default();
        let found = extract_links(&text);
        if found.is_empty() {
            tracing::debug!("clipboard holds no text, nothing to add");
            return Ok(Vec::new());
        }

        let added = self.links.append(&found, capture.skip_duplicates)?;
        if added == 0 {
            tracing::info!("all {} clipboard link(s) already queued", found.len());
        } else {
            tracing::info!(first = %found[0], "queued {added} link(s)");
        }

        self.transition(StateEvent::CaptureStarted);
        Ok(vec![self.status_effect()])
    }

    fn download_all(&mut self) -> Result<Vec<Effect>, AppError> {
        let urls = self.links.read()?;
        if urls.is_empty() {
            tracing::info!("download requested with an empty list");
            return Ok(self.notify("The download list is empty".to_string()));
        }

        let folders = self.folders();
        folders.ensure().map_err(|source| AppError::CreateDir {
            path: folders.base().to_path_buf(),
            source,
        })?;

        let template = self.config.downloader.template();
        let show_console = self.config.downloader.show_console;
        let jobs = plan_jobs(&urls, &template, &folders, self.config.route_by_site);

        let mut failed = 0usize;
        for job in &jobs {
            match self.launcher.launch(job, show_console) {
                Ok(()) => tracing::info!(url = %job.url, kind = ?job.kind, "launched downloader"),
                Err(err) => {
                    failed += 1;
                    tracing::error!(url = %job.url, "failed to launch downloader: {err}");
                }
            }
        }

        self.links.clear()?;
        self.transition(StateEvent::DispatchStarted);

        let launched = jobs.len() - failed;
        let message = if failed == 0 {
            format!("Started {launched} download(s) with {}", template.program)
        } else {
            format!(
                "Started {launched} download(s), {failed} could not be launched (see log)"
            )
        };

        let mut effects = vec![self.status_effect()];
        effects.extend(self.notify(message));
        Ok(effects)
    }

    fn reload_settings(&mut self) -> Vec<Effect> {
        let loaded = AppConfig::load(&self.paths.config_file)
            .and_then(|config| config.hotkey_bindings().map(|bindings| (config, bindings)));

        match loaded {
            Ok((config, bindings)) => {
                tracing::info!("settings reloaded from {}", self.paths.config_file.display());
                self.config = config;
                if let Err(err) = self.prepare() {
                    tracing::warn!("could not prepare folders after reload: {err}");
                }
                let mut effects = vec![Effect::RebindHotkeys(bindings), self.status_effect()];
                effects.extend(self.notify("Settings reloaded".to_string()));
                effects
            }
            Err(err) => {
                tracing::warn!("keeping previous settings: {err}");
                self.notify(format!("Settings not applied: {err}"))
            }
        }
    }

    fn transition(&mut self, event: StateEvent) {
        self.state = StateMachine::process_event(self.state, event);
    }

    fn status_effect(&self) -> Effect {
        Effect::Status {
            state: self.state,
            queued: self.queued(),
        }
    }

    fn notify(&self, message: String) -> Vec<Effect> {
        if !self.config.notifications {
            return Vec::new();
        }
        vec![Effect::Notify {
            title: APP_TITLE.to_string(),
            message,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::download::DownloadJob;
    use crate::domain::link_kind::LinkKind;
    use crate::platform::process::LaunchError;
    use std::fs;

    #[derive(Default)]
    struct FakeClipboard {
        text: Option<String>,
        copies: usize,
    }

    impl ClipboardSource for FakeClipboard {
        fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
            Ok(self.text.clone())
        }

        fn copy_selection(&mut self, _delay: Duration) -> Result<(), ClipboardError> {
            self.copies += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingLauncher {
        jobs: Vec<DownloadJob>,
        fail_urls: Vec<String>,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&mut self, job: &DownloadJob, _visible: bool) -> Result<(), LaunchError> {
            if self.fail_urls.contains(&job.url) {
                return Err(LaunchError::Spawn {
                    command_line: job.command_line.clone(),
                    source: std::io::Error::other("boom"),
                });
            }
            self.jobs.push(job.clone());
            Ok(())
        }
    }

    type TestController = AppController<FakeClipboard, RecordingLauncher>;

    fn controller(dir: &tempfile::TempDir) -> TestController {
        let paths = AppPaths::from_root(dir.path());
        paths.ensure_system_dir().unwrap();
        AppController::new(
            paths,
            AppConfig::default(),
            FakeClipboard::default(),
            RecordingLauncher::default(),
        )
    }

    fn notifications(effects: &[Effect]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn hotkey_add_appends_clipboard_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        app.clipboard.text = Some("  https://youtu.be/abc \n".to_string());

        let effects = app.handle(Command::AddFromClipboard).unwrap();

        assert_eq!(app.links.read().unwrap(), vec!["https://youtu.be/abc"]);
        assert_eq!(app.state, AppState::Capturing);
        assert_eq!(
            effects,
            vec![Effect::Status {
                state: AppState::Capturing,
                queued: 1
            }]
        );
    }

    #[test]
    fn multi_line_clipboard_queues_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        app.clipboard.text = Some("https://a.example\r\n\r\nhttps://b.example".to_string());

        app.handle(Command::AddFromClipboard).unwrap();

        assert_eq!(
            app.links.read().unwrap(),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn empty_clipboard_is_silently_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);

        app.clipboard.text = None;
        assert!(app.handle(Command::AddFromClipboard).unwrap().is_empty());

        app.clipboard.text = Some("   \n".to_string());
        assert!(app.handle(Command::AddFromClipboard).unwrap().is_empty());

        assert!(app.links.read().unwrap().is_empty());
        assert_eq!(app.state, AppState::Idle);
    }

    #[test]
    fn duplicates_are_kept_unless_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        app.clipboard.text = Some("https://a.example".to_string());

        app.handle(Command::AddFromClipboard).unwrap();
        app.handle(Command::AddFromClipboard).unwrap();
        assert_eq!(app.links.read().unwrap().len(), 2);

        app.config.capture.skip_duplicates = true;
        app.handle(Command::AddFromClipboard).unwrap();
        assert_eq!(app.links.read().unwrap().len(), 2);
    }

    #[test]
    fn copy_selection_runs_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        app.config.capture.copy_selection = true;
        app.clipboard.text = Some("https://a.example".to_string());

        app.handle(Command::AddFromClipboard).unwrap();

        assert_eq!(app.clipboard.copies, 1);
    }

    #[test]
    fn download_all_launches_each_link_and_clears_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        app.links
            .append(
                &[
                    "https://youtu.be/abc".to_string(),
                    "https://www.youtube.com/playlist?list=PL1".to_string(),
                ],
                false,
            )
            .unwrap();

        let effects = app.handle(Command::DownloadAll).unwrap();

        let launched: Vec<(&str, LinkKind)> = app
            .launcher
            .jobs
            .iter()
            .map(|j| (j.url.as_str(), j.kind))
            .collect();
        assert_eq!(
            launched,
            vec![
                ("https://youtu.be/abc", LinkKind::YoutubeVideo),
                ("https://www.youtube.com/playlist?list=PL1", LinkKind::YoutubePlaylist),
            ]
        );
        assert!(app.launcher.jobs[1].command_line.contains("--yes-playlist"));
        assert!(app.links.read().unwrap().is_empty());
        assert!(app.folders().playlists().is_dir());
        assert_eq!(app.state, AppState::Dispatching);
        assert_eq!(
            effects[0],
            Effect::Status {
                state: AppState::Dispatching,
                queued: 0
            }
        );
        assert_eq!(notifications(&effects), vec!["Started 2 download(s) with yt-dlp"]);
    }

    #[test]
    fn failed_launch_is_reported_and_list_still_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        app.launcher.fail_urls = vec!["https://b.example".to_string()];
        app.links
            .append(
                &["https://a.example".to_string(), "https://b.example".to_string()],
                false,
            )
            .unwrap();

        let effects = app.handle(Command::DownloadAll).unwrap();

        assert_eq!(app.launcher.jobs.len(), 1);
        assert!(app.links.read().unwrap().is_empty());
        assert_eq!(
            notifications(&effects),
            vec!["Started 1 download(s), 1 could not be launched (see log)"]
        );
    }

    #[test]
    fn download_with_empty_list_launches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);

        let effects = app.handle(Command::DownloadAll).unwrap();

        assert!(app.launcher.jobs.is_empty());
        assert_eq!(notifications(&effects), vec!["The download list is empty"]);
        assert_eq!(app.state, AppState::Idle);
    }

    #[test]
    fn notifications_can_be_turned_off() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        app.config.notifications = false;

        let effects = app.handle(Command::DownloadAll).unwrap();

        assert!(effects.is_empty());
    }

    #[test]
    fn command_failures_become_balloons_unless_silenced() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        let err = AppError::Clipboard(ClipboardError::Busy);

        assert_eq!(
            notifications(&app.error_effects(&err)),
            vec!["Something went wrong: clipboard is held by another program"]
        );

        app.config.notifications = false;
        assert!(app.error_effects(&err).is_empty());
    }

    #[test]
    fn open_commands_create_their_targets() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);

        let list = app.handle(Command::OpenList).unwrap();
        assert_eq!(list, vec![Effect::Open(app.paths.list_file.clone())]);
        assert!(app.paths.list_file.exists());

        let downloads = app.handle(Command::OpenDownloads).unwrap();
        assert_eq!(
            downloads,
            vec![Effect::Open(app.paths.default_downloads_dir.clone())]
        );
        assert!(app.paths.default_downloads_dir.join("Pictures").is_dir());

        let settings = app.handle(Command::OpenSettings).unwrap();
        assert_eq!(settings, vec![Effect::Open(app.paths.config_file.clone())]);
        assert!(app.paths.config_file.exists());
    }

    #[test]
    fn show_info_opens_file_or_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);

        let missing = app.handle(Command::ShowInfo).unwrap();
        assert_eq!(notifications(&missing), vec!["info.txt not found"]);

        fs::write(&app.paths.info_file, "hotkeys: ctrl+space").unwrap();
        let present = app.handle(Command::ShowInfo).unwrap();
        assert_eq!(present, vec![Effect::Open(app.paths.info_file.clone())]);
    }

    #[test]
    fn reload_settings_applies_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        fs::write(
            &app.paths.config_file,
            "[hotkeys]\nadd = \"alt+q\"\ndownload = \"alt+w\"\n",
        )
        .unwrap();

        let effects = app.handle(Command::ReloadSettings).unwrap();

        assert_eq!(app.config().hotkeys.add, "alt+q");
        assert!(matches!(
            &effects[0],
            Effect::RebindHotkeys(bindings) if bindings.add.to_string() == "Alt+Q"
        ));
        assert_eq!(notifications(&effects), vec!["Settings reloaded"]);
    }

    #[test]
    fn reload_settings_keeps_old_config_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        fs::write(
            &app.paths.config_file,
            "[hotkeys]\nadd = \"alt+q\"\ndownload = \"alt+q\"\n",
        )
        .unwrap();

        let effects = app.handle(Command::ReloadSettings).unwrap();

        assert_eq!(app.config(), &AppConfig::default());
        assert!(!effects.iter().any(|e| matches!(e, Effect::RebindHotkeys(_))));
        assert!(notifications(&effects)[0].starts_with("Settings not applied"));
    }

    #[test]
    fn status_timer_settles_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        app.clipboard.text = Some("https://a.example".to_string());
        app.handle(Command::AddFromClipboard).unwrap();

        let effects = app.on_status_timer();

        assert_eq!(app.state, AppState::Idle);
        assert_eq!(
            effects,
            vec![Effect::Status {
                state: AppState::Idle,
                queued: 1
            }]
        );
    }

    #[test]
    fn startup_binds_hotkeys_or_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);

        let effects = app.startup_effects();
        assert!(matches!(effects[1], Effect::RebindHotkeys(_)));

        app.config.hotkeys.add = "nonsense".to_string();
        let effects = app.startup_effects();
        assert_eq!(effects.len(), 2);
        assert!(notifications(&effects)[0].starts_with("Hotkeys disabled"));
    }

    #[test]
    fn exit_quits() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = controller(&dir);
        assert_eq!(app.handle(Command::Exit).unwrap(), vec![Effect::Quit]);
    }

    #[test]
    fn tooltip_mentions_queue_length() {
        assert_eq!(tooltip(0), "YT Downloader");
        assert_eq!(tooltip(1), "YT Downloader (1 link queued)");
        assert_eq!(tooltip(5), "YT Downloader (5 links queued)");
    }
}
