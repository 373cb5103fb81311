use super::camera_app::{CameraApp, CameraOutcome};
use super::launcher::{Launcher, LauncherOutcome};
use super::settings_app::{SettingsApp, SettingsOutcome};
use super::types::{
    AppCommand, AppScreen, DeviceInfo, LauncherSelection, StatusSnapshot, UiTiming, ViewContext,
};
use crate::capture::Photo;
use crate::display::Scene;
use crate::error::CaptureError;
use crate::frame::FrameData;
use crate::input::{Direction, InputEvent};
use crate::storage::PersistedState;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info};

/// Why the storage warning icon is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageWarning {
    LowSpace,
    WriteFailed,
}

/// Owns the active screen and routes every input event to it.
///
/// Input arriving while a capture is in flight is held back and replayed
/// once the capture resolves, except CENTER which goes straight to the
/// camera so a second shutter press is answered with "try again".
pub struct AppStateMachine {
    screen: AppScreen,
    launcher: Launcher,
    camera: CameraApp,
    settings: SettingsApp,
    pending: VecDeque<InputEvent>,
    storage_warning: Option<StorageWarning>,
    photos_taken: u64,
    status: StatusSnapshot,
    info: DeviceInfo,
    width: u32,
    height: u32,
}

impl AppStateMachine {
    pub fn new(
        state: &PersistedState,
        timing: UiTiming,
        info: DeviceInfo,
        status: StatusSnapshot,
        (width, height): (u32, u32),
        now: Instant,
    ) -> Self {
        Self {
            screen: AppScreen::Launcher,
            launcher: Launcher::new(state.launcher_selection, timing.sleep_after, now),
            camera: CameraApp::new(timing, state.camera_overlay_visible),
            settings: SettingsApp::new(),
            pending: VecDeque::new(),
            storage_warning: None,
            photos_taken: state.photos_taken,
            status,
            info,
            width,
            height,
        }
    }

    pub fn screen(&self) -> AppScreen {
        self.screen
    }

    pub fn selection(&self) -> LauncherSelection {
        self.launcher.selection()
    }

    pub fn is_asleep(&self) -> bool {
        self.screen == AppScreen::Launcher && self.launcher.is_asleep()
    }

    pub fn capture_in_flight(&self) -> bool {
        self.camera.is_capturing()
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    pub fn storage_warning(&self) -> bool {
        self.storage_warning.is_some()
    }

    pub fn photos_taken(&self) -> u64 {
        self.photos_taken
    }

    pub fn camera(&self) -> &CameraApp {
        &self.camera
    }

    pub fn settings(&self) -> &SettingsApp {
        &self.settings
    }

    pub fn status(&self) -> &StatusSnapshot {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusSnapshot {
        &mut self.status
    }

    /// Route one debounced event; unmatched combinations are no-ops
    pub fn handle_input(&mut self, event: InputEvent, now: Instant) -> Vec<AppCommand> {
        if self.camera.is_capturing() && event.direction != Direction::Center {
            debug!("Capture in flight, holding {:?} {:?}", event.direction, event.kind);
            self.pending.push_back(event);
            return Vec::new();
        }

        match self.screen {
            AppScreen::Launcher => match self.launcher.handle(event, now) {
                LauncherOutcome::Ignored => Vec::new(),
                LauncherOutcome::Woke => vec![AppCommand::SetBacklight(true)],
                LauncherOutcome::SelectionChanged => vec![AppCommand::PersistState],
                LauncherOutcome::Open(screen) => {
                    let mut commands = self.transition(screen, now);
                    commands.push(AppCommand::PersistState);
                    commands
                }
            },
            AppScreen::CameraApp => match self.camera.handle(event, now) {
                CameraOutcome::Ignored => Vec::new(),
                CameraOutcome::Capture(request) => vec![AppCommand::Capture(request)],
                CameraOutcome::OverlayToggled => vec![AppCommand::PersistState],
                CameraOutcome::Exit => self.transition(AppScreen::Launcher, now),
            },
            AppScreen::SettingsApp => {
                match self.settings.handle(event, &self.info, &self.status) {
                    SettingsOutcome::Ignored
                    | SettingsOutcome::Moved
                    | SettingsOutcome::Opened(_)
                    | SettingsOutcome::Back => Vec::new(),
                    SettingsOutcome::ScanWifi => vec![AppCommand::ScanWifi],
                    SettingsOutcome::Exit => self.transition(AppScreen::Launcher, now),
                }
            }
        }
    }

    /// Feed back the result of a capture, then replay held input
    pub fn capture_resolved(
        &mut self,
        result: Result<Photo, CaptureError>,
        now: Instant,
    ) -> Vec<AppCommand> {
        let finished = self.camera.capture_resolved(&result, now);
        let mut commands = Vec::new();

        match &result {
            Ok(_) => {
                self.photos_taken += 1;
                self.storage_warning = None;
                commands.push(AppCommand::PersistState);
            }
            Err(CaptureError::StorageFull { .. }) => {
                self.storage_warning.get_or_insert(StorageWarning::LowSpace);
            }
            Err(CaptureError::StorageWriteFailed { .. }) => {
                self.storage_warning = Some(StorageWarning::WriteFailed)
            }
            Err(CaptureError::SensorBusy) | Err(CaptureError::SensorFault { .. }) => {}
        }

        if finished {
            while let Some(event) = self.pending.pop_front() {
                commands.extend(self.handle_input(event, now));
            }
        }
        commands
    }

    /// Periodic free-space check. Returns true when the warning flipped.
    ///
    /// Enough free space only clears a low-space warning; a failed write
    /// stays flagged until a capture succeeds.
    pub fn storage_checked(&mut self, space_ok: bool) -> bool {
        let before = self.storage_warning();
        match (space_ok, self.storage_warning) {
            (true, Some(StorageWarning::LowSpace)) => self.storage_warning = None,
            (false, None) => self.storage_warning = Some(StorageWarning::LowSpace),
            _ => {}
        }
        before != self.storage_warning()
    }

    pub fn preview_failed(&mut self, error: &CaptureError, now: Instant) {
        if self.screen == AppScreen::CameraApp {
            self.camera.preview_failed(error, now);
        }
    }

    /// Timers: launcher sleep and banner expiry
    pub fn tick(&mut self, now: Instant) -> Vec<AppCommand> {
        match self.screen {
            AppScreen::Launcher => {
                if self.launcher.tick(now) {
                    vec![AppCommand::SetBacklight(false)]
                } else {
                    Vec::new()
                }
            }
            AppScreen::CameraApp => {
                self.camera.tick(now);
                Vec::new()
            }
            AppScreen::SettingsApp => Vec::new(),
        }
    }

    pub fn render(&self, preview: Option<&FrameData>, now: Instant) -> Scene {
        let view = ViewContext {
            status: &self.status,
            info: &self.info,
            storage_warning: self.storage_warning(),
            photos_taken: self.photos_taken,
            width: self.width,
            height: self.height,
            now,
        };

        let mut scene = Scene::new();
        match self.screen {
            AppScreen::Launcher => self.launcher.render(&mut scene, &view),
            AppScreen::CameraApp => self.camera.render(&mut scene, preview, &view),
            AppScreen::SettingsApp => self.settings.render(&mut scene, &view),
        }
        scene
    }

    /// Copy the durable parts of the UI into `state`
    pub fn persist_into(&self, state: &mut PersistedState) {
        state.launcher_selection = self.launcher.selection();
        state.photos_taken = self.photos_taken;
        state.camera_overlay_visible = self.camera.overlay_enabled();
    }

    fn transition(&mut self, to: AppScreen, now: Instant) -> Vec<AppCommand> {
        let from = self.screen;
        if from == to {
            return Vec::new();
        }

        let mut commands = Vec::new();
        match from {
            AppScreen::CameraApp => {
                self.camera.leave();
                commands.push(AppCommand::StopPreview);
            }
            AppScreen::SettingsApp | AppScreen::Launcher => {}
        }

        match to {
            AppScreen::Launcher => self.launcher.enter(now),
            AppScreen::CameraApp => {
                self.camera.enter(now);
                commands.push(AppCommand::StartPreview);
            }
            AppScreen::SettingsApp => self.settings.enter(),
        }

        info!("Screen {} -> {}", from, to);
        self.screen = to;
        commands
    }
}
