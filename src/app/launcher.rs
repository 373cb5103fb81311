use super::types::{AppScreen, LauncherSelection, ViewContext};
use crate::display::{palette, Icon, Scene, TextSize, ICON_SIZE};
use crate::input::{Direction, InputEvent};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub(super) const STATUS_BAR_HEIGHT: u32 = 14;

const TILE_SIZE: u32 = 52;
const TILE_TOP: i32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherOutcome {
    Ignored,
    SelectionChanged,
    Open(AppScreen),
    /// The event only woke the screen
    Woke,
}

/// Home screen with the two app tiles
#[derive(Debug)]
pub struct Launcher {
    selection: LauncherSelection,
    sleep_after: Option<Duration>,
    last_input: Instant,
    asleep: bool,
}

impl Launcher {
    pub fn new(selection: LauncherSelection, sleep_after: Option<Duration>, now: Instant) -> Self {
        Self {
            selection,
            sleep_after,
            last_input: now,
            asleep: false,
        }
    }

    pub fn selection(&self) -> LauncherSelection {
        self.selection
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    pub fn enter(&mut self, now: Instant) {
        self.last_input = now;
    }

    pub fn handle(&mut self, event: InputEvent, now: Instant) -> LauncherOutcome {
        if !event.is_activation() {
            return LauncherOutcome::Ignored;
        }
        self.last_input = now;

        if self.asleep {
            self.asleep = false;
            info!("Launcher woke up");
            return LauncherOutcome::Woke;
        }

        match event.direction {
            Direction::Left | Direction::Right => {
                self.selection = self.selection.toggled();
                debug!("Launcher selection: {:?}", self.selection);
                LauncherOutcome::SelectionChanged
            }
            Direction::Center => LauncherOutcome::Open(self.selection.screen()),
            Direction::Up | Direction::Down => LauncherOutcome::Ignored,
        }
    }

    /// Returns true when the launcher just fell asleep
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(sleep_after) = self.sleep_after else {
            return false;
        };
        if !self.asleep && now.duration_since(self.last_input) >= sleep_after {
            self.asleep = true;
            info!("Launcher idle for {:?}, sleeping", sleep_after);
            return true;
        }
        false
    }

    pub fn render(&self, scene: &mut Scene, view: &ViewContext<'_>) {
        let (width, height) = (view.width, view.height);
        if self.asleep {
            scene.clear(palette::BLACK).centered_text(
                width,
                height as i32 / 2 - 8,
                view.status.clock.format("%H:%M").to_string(),
                TextSize::Large,
                palette::DIM_TEXT,
            );
            return;
        }

        scene.clear(palette::BACKGROUND);
        draw_status_bar(scene, view);
        scene.centered_text(width, 20, "Pi Camera", TextSize::Large, palette::TEXT);

        let gap = (width.saturating_sub(TILE_SIZE * 2) / 3) as i32;
        self.draw_tile(scene, gap, LauncherSelection::Camera);
        self.draw_tile(scene, gap * 2 + TILE_SIZE as i32, LauncherSelection::Settings);

        scene.centered_text(
            width,
            height as i32 - 12,
            "<> choose  OK open",
            TextSize::Small,
            palette::DIM_TEXT,
        );
    }

    fn draw_tile(&self, scene: &mut Scene, x: i32, tile: LauncherSelection) {
        let (icon, label, color) = match tile {
            LauncherSelection::Camera => (Icon::Camera, "Camera", palette::CAMERA),
            LauncherSelection::Settings => (Icon::Gear, "Setup", palette::SETTINGS),
        };
        let selected = self.selection == tile;
        let stroke = if selected { palette::HIGHLIGHT } else { palette::STATUS_BAR };

        scene.stroke_rect(
            x,
            TILE_TOP,
            TILE_SIZE,
            TILE_SIZE,
            Some(palette::STATUS_BAR),
            stroke,
        );
        if selected {
            scene.stroke_rect(x + 1, TILE_TOP + 1, TILE_SIZE - 2, TILE_SIZE - 2, None, stroke);
        }

        let icon_x = x + (TILE_SIZE - ICON_SIZE) as i32 / 2;
        scene.icon(icon_x, TILE_TOP + 10, icon, color);

        let label_width = label.len() as i32 * TextSize::Small.char_width() as i32;
        scene.text(
            x + (TILE_SIZE as i32 - label_width) / 2,
            TILE_TOP + 32,
            label,
            TextSize::Small,
            if selected { palette::TEXT } else { palette::DIM_TEXT },
        );
    }
}

/// Clock, WiFi and storage indicators along the top edge
pub(super) fn draw_status_bar(scene: &mut Scene, view: &ViewContext<'_>) {
    let width = view.width;
    scene
        .fill_rect(0, 0, width, STATUS_BAR_HEIGHT, palette::STATUS_BAR)
        .text(
            2,
            2,
            view.status.clock.format("%H:%M").to_string(),
            TextSize::Small,
            palette::TEXT,
        );

    let wifi_color = if view.status.wifi.is_connected() {
        palette::OK
    } else {
        palette::DIM_TEXT
    };
    let right = width as i32 - ICON_SIZE as i32 - 1;
    scene.icon(right, 1, Icon::Wifi, wifi_color);
    if view.storage_warning {
        scene.icon(right - ICON_SIZE as i32 - 2, 1, Icon::Warning, palette::WARNING);
    }
}
