pub mod app;
pub mod camera;
pub mod capture;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod frame;
pub mod input;
pub mod storage;
pub mod wifi;

pub use app::{AppScreen, AppStateMachine, PicamRuntime, RuntimeOptions, ShutdownReason};
pub use capture::{CapturePipeline, CaptureRequest, CaptureStats, Photo};
pub use config::PicamConfig;
pub use display::{FrameRenderer, Scene};
pub use error::{PicamError, Result};
pub use events::{EventBus, PicamEvent};
pub use frame::FrameData;
pub use input::{Direction, InputDebouncer, InputEvent, InputKind};
pub use storage::{PersistedState, PhotoStore};
pub use wifi::{WifiManager, WifiStatus};
