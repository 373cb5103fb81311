use super::launcher::{draw_status_bar, STATUS_BAR_HEIGHT};
use super::types::{DeviceInfo, StatusSnapshot, ViewContext};
use crate::display::{palette, Scene, TextSize};
use crate::input::{Direction, InputEvent, InputKind};
use crate::wifi::ScanState;
use tracing::debug;

const ROW_HEIGHT: i32 = 12;
const LIST_TOP: i32 = STATUS_BAR_HEIGHT as i32 + 16;
const VISIBLE_ROWS: usize = 7;
const MAX_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsPage {
    Main,
    Wifi,
    NetworkShare,
    Camera,
    Display,
    About,
}

impl SettingsPage {
    fn title(self) -> &'static str {
        match self {
            SettingsPage::Main => "Settings",
            SettingsPage::Wifi => "WiFi",
            SettingsPage::NetworkShare => "Network Share",
            SettingsPage::Camera => "Camera",
            SettingsPage::Display => "Display",
            SettingsPage::About => "About",
        }
    }
}

/// Main menu entries; `None` is the exit entry
const MAIN_MENU: [(&str, Option<SettingsPage>); 6] = [
    ("WiFi", Some(SettingsPage::Wifi)),
    ("Network Share", Some(SettingsPage::NetworkShare)),
    ("Camera", Some(SettingsPage::Camera)),
    ("Display", Some(SettingsPage::Display)),
    ("About", Some(SettingsPage::About)),
    ("Exit", None),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOutcome {
    Ignored,
    Moved,
    Opened(SettingsPage),
    Back,
    ScanWifi,
    Exit,
}

/// Menu tree of read-only system pages
#[derive(Debug)]
pub struct SettingsApp {
    page: SettingsPage,
    cursor: usize,
    scroll: usize,
}

impl Default for SettingsApp {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsApp {
    pub fn new() -> Self {
        Self {
            page: SettingsPage::Main,
            cursor: 0,
            scroll: 0,
        }
    }

    pub fn page(&self) -> SettingsPage {
        self.page
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn enter(&mut self) {
        self.page = SettingsPage::Main;
        self.cursor = 0;
        self.scroll = 0;
    }

    pub fn handle(
        &mut self,
        event: InputEvent,
        info: &DeviceInfo,
        status: &StatusSnapshot,
    ) -> SettingsOutcome {
        match (event.direction, event.kind) {
            (_, InputKind::Release) => SettingsOutcome::Ignored,
            (Direction::Up, InputKind::LongPress) => SettingsOutcome::Exit,
            (Direction::Up, InputKind::Press) => self.move_by(-1, info, status),
            (Direction::Down, _) => self.move_by(1, info, status),
            (Direction::Center, _) => self.activate(),
            (Direction::Left, _) if self.page != SettingsPage::Main => {
                let from = self.page;
                self.page = SettingsPage::Main;
                self.scroll = 0;
                debug!("Settings: back from {:?}", from);
                SettingsOutcome::Back
            }
            (Direction::Left, _) | (Direction::Right, _) => SettingsOutcome::Ignored,
        }
    }

    fn move_by(
        &mut self,
        delta: isize,
        info: &DeviceInfo,
        status: &StatusSnapshot,
    ) -> SettingsOutcome {
        let (position, limit) = match self.page {
            SettingsPage::Main => (&mut self.cursor, MAIN_MENU.len() - 1),
            page => (
                &mut self.scroll,
                page_lines(page, info, status)
                    .len()
                    .saturating_sub(VISIBLE_ROWS),
            ),
        };
        let next = position.saturating_add_signed(delta).min(limit);
        if next == *position {
            return SettingsOutcome::Ignored;
        }
        *position = next;
        SettingsOutcome::Moved
    }

    fn activate(&mut self) -> SettingsOutcome {
        match self.page {
            SettingsPage::Main => match MAIN_MENU[self.cursor].1 {
                Some(page) => {
                    self.page = page;
                    self.scroll = 0;
                    debug!("Settings: open {:?}", page);
                    SettingsOutcome::Opened(page)
                }
                None => SettingsOutcome::Exit,
            },
            SettingsPage::Wifi => SettingsOutcome::ScanWifi,
            _ => SettingsOutcome::Ignored,
        }
    }

    pub fn render(&self, scene: &mut Scene, view: &ViewContext<'_>) {
        let width = view.width;
        scene.clear(palette::BACKGROUND);
        draw_status_bar(scene, view);
        scene.text(
            4,
            STATUS_BAR_HEIGHT as i32 + 2,
            self.page.title(),
            TextSize::Small,
            palette::SETTINGS,
        );

        match self.page {
            SettingsPage::Main => {
                for (row, (label, _)) in MAIN_MENU.iter().enumerate() {
                    let y = LIST_TOP + row as i32 * ROW_HEIGHT;
                    if row == self.cursor {
                        scene
                            .fill_rect(0, y - 1, width, ROW_HEIGHT as u32, palette::STATUS_BAR)
                            .text(2, y, ">", TextSize::Small, palette::HIGHLIGHT);
                    }
                    scene.text(12, y, *label, TextSize::Small, palette::TEXT);
                }
            }
            page => {
                let lines = page_lines(page, view.info, view.status);
                let first = self.scroll.min(lines.len().saturating_sub(VISIBLE_ROWS));
                for (row, line) in lines.iter().skip(first).take(VISIBLE_ROWS).enumerate() {
                    scene.text(
                        4,
                        LIST_TOP + row as i32 * ROW_HEIGHT,
                        truncate(line),
                        TextSize::Small,
                        palette::TEXT,
                    );
                }
            }
        }

        let hint = match self.page {
            SettingsPage::Main => "OK open  hold^ exit",
            SettingsPage::Wifi => "OK scan  < back",
            _ => "< back",
        };
        scene.centered_text(
            width,
            view.height as i32 - 12,
            hint,
            TextSize::Small,
            palette::DIM_TEXT,
        );
    }
}

/// Text rows of an information page
pub fn page_lines(page: SettingsPage, info: &DeviceInfo, status: &StatusSnapshot) -> Vec<String> {
    match page {
        SettingsPage::Main => MAIN_MENU.iter().map(|(label, _)| label.to_string()).collect(),
        SettingsPage::Wifi => {
            let mut lines = vec![
                match &status.wifi.ssid {
                    Some(ssid) => format!("Net: {}", ssid),
                    None => "Not connected".to_string(),
                },
                format!(
                    "IP: {}",
                    status.wifi.ip_address.as_deref().unwrap_or("-")
                ),
            ];
            match &status.scan {
                ScanState::Idle => {}
                ScanState::Scanning => lines.push("Scanning...".to_string()),
                ScanState::Done(networks) if networks.is_empty() => {
                    lines.push("No networks".to_string())
                }
                ScanState::Done(networks) => {
                    lines.extend(networks.iter().map(|ssid| format!(" {}", ssid)))
                }
                ScanState::Failed(_) => lines.push("Scan failed".to_string()),
            }
            lines
        }
        SettingsPage::NetworkShare => {
            let free = status
                .storage
                .free_bytes
                .map(|bytes| format!("{} MB", bytes / (1024 * 1024)))
                .unwrap_or_else(|| "unknown".to_string());
            vec![
                "Folder:".to_string(),
                info.share_path.clone(),
                format!("Today: {}", status.storage.today_photos),
                format!("Total: {}", status.storage.total_photos),
                format!("Days: {}", status.storage.date_folders),
                format!("Free: {}", free),
            ]
        }
        SettingsPage::Camera => info.camera_lines.clone(),
        SettingsPage::Display => info.display_lines.clone(),
        SettingsPage::About => vec![
            format!("picam {}", info.version),
            format!("ID: {}", info.device_id.get(..8).unwrap_or(&info.device_id)),
            format!("Up: {}", status.system.uptime_label()),
            format!("Mem: {}", status.system.memory_label()),
        ],
    }
}

fn truncate(line: &str) -> String {
    if line.chars().count() <= MAX_CHARS {
        line.to_string()
    } else {
        let mut short: String = line.chars().take(MAX_CHARS - 1).collect();
        short.push('~');
        short
    }
}
