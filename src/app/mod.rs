mod camera_app;
mod launcher;
mod machine;
mod runtime;
mod settings_app;
mod shutdown;
mod startup;
mod system_info;
mod types;


pub use camera_app::{Banner, CameraApp, CameraOutcome};
pub use launcher::{Launcher, LauncherOutcome};
pub use machine::AppStateMachine;
pub use runtime::PicamRuntime;
pub use settings_app::{page_lines, SettingsApp, SettingsOutcome, SettingsPage};
pub use startup::RuntimeOptions;
pub use system_info::SystemInfo;
pub use types::{
    AppCommand, AppScreen, DeviceInfo, LauncherSelection, ShutdownReason, StatusSnapshot,
    UiTiming, ViewContext,
};
