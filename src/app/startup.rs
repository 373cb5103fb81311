use super::machine::AppStateMachine;
use super::runtime::PicamRuntime;
use super::system_info::SystemInfo;
use super::types::{AppScreen, DeviceInfo, StatusSnapshot, UiTiming};
use crate::camera;
use crate::capture::CapturePipeline;
use crate::config::{DisplayConfig, PicamConfig, Rotation};
use crate::display;
use crate::error::Result;
use crate::events::{EventBus, PicamEvent};
use crate::input::{self, DebounceTiming, InputDebouncer, InputTask, LineReader, ScriptedLines};
use crate::storage::{PersistedState, PhotoStore};
use crate::wifi::{create_wifi_manager, WifiMonitor};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How the runtime talks to hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Render into memory instead of the framebuffer
    pub headless: bool,
}

impl PicamRuntime {
    /// Build every component from configuration
    pub fn new(config: PicamConfig) -> Result<Self> {
        Self::with_options(config, RuntimeOptions::default())
    }

    pub fn with_options(config: PicamConfig, options: RuntimeOptions) -> Result<Self> {
        info!("Initializing picam components");
        let event_bus = Arc::new(EventBus::default());

        let state_dir = config.storage.state_path();
        let (state, created) = PersistedState::load(&state_dir);
        if created {
            info!("Device id {}", state.device_id);
        }

        // A missing photo root is a configuration error, checked before any hardware
        let store = PhotoStore::open(&config.storage, Some(&state.device_id))?;
        let timezone = store.timezone();

        let renderer = display::open_renderer(&config.display, options.headless)?;

        let preview_size = (config.display.width, config.display.height);
        let sensor = camera::open_sensor(&config.camera, preview_size)?;
        let pipeline = CapturePipeline::new(sensor, store, config.camera.jpeg_quality)
            .with_event_bus(Arc::clone(&event_bus));

        let reader = open_input(&config, &event_bus);
        let input = InputTask::new(
            InputDebouncer::new(reader, DebounceTiming::from(&config.input)),
            config.input.sample_interval(),
            Arc::clone(&event_bus),
        );

        let wifi = WifiMonitor::new(
            create_wifi_manager(&config.wifi),
            Duration::from_secs(config.wifi.poll_interval_seconds.max(1)),
        );
        let wifi_handle = wifi.handle();

        let mut status = StatusSnapshot::new(timezone.now());
        status.storage = pipeline.store().stats();
        status.system = SystemInfo::read();

        let now = Instant::now();
        let machine = AppStateMachine::new(
            &state,
            UiTiming::from_config(&config.display),
            device_info(&config, &state),
            status,
            preview_size,
            now,
        );

        info!("All components initialized successfully");

        Ok(Self {
            machine,
            renderer,
            pipeline,
            input: Some(input),
            wifi: Some(wifi),
            wifi_handle,
            timezone,
            state,
            state_dir,
            preview: None,
            latest_preview: None,
            preview_faulted: false,
            display_faulted: false,
            in_flight: None,
            last_screen: AppScreen::Launcher,
            last_storage_warning: false,
            last_slow_refresh: now,
            frames_presented: 0,
            fps_window_start: now,
            cancellation_token: CancellationToken::new(),
            event_bus,
            config,
        })
    }
}

/// Open the button pad. A missing pad degrades to no input rather than aborting.
fn open_input(config: &PicamConfig, event_bus: &Arc<EventBus>) -> Box<dyn LineReader> {
    match input::open_line_reader(&config.input, Arc::clone(event_bus)) {
        Ok(reader) => {
            info!("Input backend: {}", reader.name());
            reader
        }
        Err(e) => {
            warn!("Input unavailable ({}), continuing without buttons", e);
            let _ = event_bus.publish(PicamEvent::HardwareFault {
                component: "input".to_string(),
                details: e.to_string(),
            });
            Box::new(ScriptedLines::idle())
        }
    }
}

fn device_info(config: &PicamConfig, state: &PersistedState) -> DeviceInfo {
    let camera = &config.camera;
    DeviceInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        device_id: state.device_id.clone(),
        share_path: config.storage.root.clone(),
        camera_lines: vec![
            format!("Backend: {:?}", camera.backend),
            format!(
                "Still: {}x{}",
                camera.still_resolution.0, camera.still_resolution.1
            ),
            format!("JPEG quality: {}", camera.jpeg_quality),
            format!("Device: {}", camera.device),
        ],
        display_lines: display_lines(&config.display),
    }
}

fn display_lines(display: &DisplayConfig) -> Vec<String> {
    let seconds_or_off = |secs: u64| {
        if secs == 0 {
            "off".to_string()
        } else {
            format!("{}s", secs)
        }
    };
    let rotation = match display.rotation {
        None => "none",
        Some(Rotation::Rotate90) => "90",
        Some(Rotation::Rotate180) => "180",
        Some(Rotation::Rotate270) => "270",
    };
    vec![
        format!("Size: {}x{}", display.width, display.height),
        format!("FPS: {}", display.target_fps),
        format!("Sleep: {}", seconds_or_off(display.sleep_after_seconds)),
        format!("UI hide: {}", seconds_or_off(display.ui_timeout_seconds)),
        format!("Rotation: {}", rotation),
    ]
}
