use super::machine::AppStateMachine;
use super::system_info::SystemInfo;
use super::types::{AppCommand, AppScreen, ShutdownReason};
use crate::capture::{CapturePipeline, CaptureTicket, PreviewStream};
use crate::config::PicamConfig;
use crate::display::{FrameRenderer, RenderOutcome};
use crate::error::{PicamError, Result};
use crate::events::{EventBus, PicamEvent};
use crate::frame::FrameData;
use crate::input::{InputMessage, InputTask};
use crate::storage::{PersistedState, PhotoTimezone};
use crate::wifi::{WifiHandle, WifiMonitor};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const FPS_LOG_FRAMES: u64 = 200;
const SLOW_REFRESH: Duration = Duration::from_secs(10);
const INPUT_CHANNEL_CAPACITY: usize = 64;

type ShutdownSender = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

/// The cooperative UI loop and the components it drives
pub struct PicamRuntime {
    pub(super) config: PicamConfig,
    pub(super) event_bus: Arc<EventBus>,
    pub(super) machine: AppStateMachine,
    pub(super) renderer: FrameRenderer,
    pub(super) pipeline: CapturePipeline,
    pub(super) input: Option<InputTask>,
    pub(super) wifi: Option<WifiMonitor>,
    pub(super) wifi_handle: WifiHandle,
    pub(super) timezone: PhotoTimezone,
    pub(super) state: PersistedState,
    pub(super) state_dir: PathBuf,

    pub(super) preview: Option<PreviewStream>,
    pub(super) latest_preview: Option<FrameData>,
    pub(super) preview_faulted: bool,
    pub(super) display_faulted: bool,
    pub(super) in_flight: Option<CaptureTicket>,

    pub(super) last_screen: AppScreen,
    pub(super) last_storage_warning: bool,
    pub(super) last_slow_refresh: Instant,
    pub(super) frames_presented: u64,
    pub(super) fps_window_start: Instant,
    pub(super) cancellation_token: CancellationToken,
}

impl PicamRuntime {
    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.event_bus)
    }

    pub fn machine(&self) -> &AppStateMachine {
        &self.machine
    }

    pub fn config(&self) -> &PicamConfig {
        &self.config
    }

    /// Run the UI loop until a signal or a shutdown request, then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("picam is running");

        let (shutdown_sender, mut shutdown_receiver) = oneshot::channel();
        let shutdown_sender: ShutdownSender = Arc::new(Mutex::new(Some(shutdown_sender)));
        self.setup_signal_handlers(Arc::clone(&shutdown_sender));
        self.watch_shutdown_requests(self.event_bus.subscribe(), shutdown_sender);

        let (input_sender, mut input_receiver) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let input_task = self
            .input
            .take()
            .ok_or_else(|| PicamError::system("Input task already taken"))?
            .spawn(input_sender, self.cancellation_token.child_token());
        let wifi_task = self
            .wifi
            .take()
            .map(|monitor| monitor.spawn(self.cancellation_token.child_token()));

        if let Err(e) = self.renderer.set_backlight(true) {
            warn!("Failed to turn backlight on: {}", e);
        }

        let mut ticker = interval(self.renderer.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let reason = loop {
            tokio::select! {
                reason = &mut shutdown_receiver => {
                    break reason.unwrap_or_else(|_| {
                        ShutdownReason::Error("Shutdown channel closed unexpectedly".to_string())
                    });
                }
                _ = ticker.tick() => self.tick(&mut input_receiver, Instant::now()),
            }
        };

        info!("Shutdown initiated: {:?}", reason);
        let exit_code = self.shutdown(reason).await;

        if let Err(e) = input_task.await {
            warn!("Input task ended abnormally: {}", e);
        }
        if let Some(task) = wifi_task {
            if let Err(e) = task.await {
                warn!("WiFi task ended abnormally: {}", e);
            }
        }

        info!("picam shutdown complete");
        Ok(exit_code)
    }

    /// One loop iteration: input, capture results, timers, preview, render
    pub(super) fn tick(&mut self, input: &mut mpsc::Receiver<InputMessage>, now: Instant) {
        self.refresh_status(now);

        while let Ok(message) = input.try_recv() {
            match message {
                InputMessage::Event(event) => {
                    let _ = self.event_bus.publish(PicamEvent::InputReceived { event });
                    let commands = self.machine.handle_input(event, now);
                    self.execute(commands, now);
                }
                // Already published as a hardware fault by the input task
                InputMessage::Fault(fault) => debug!("Input line fault: {:?}", fault),
            }
        }

        self.poll_capture(now);

        let commands = self.machine.tick(now);
        self.execute(commands, now);

        self.poll_preview(now);
        self.render_frame(now);
    }

    pub(super) fn execute(&mut self, commands: Vec<AppCommand>, now: Instant) {
        let mut queue: VecDeque<AppCommand> = commands.into();

        while let Some(command) = queue.pop_front() {
            match command {
                AppCommand::StartPreview => match self.pipeline.start_preview() {
                    Ok(stream) => {
                        self.preview = Some(stream);
                        self.preview_faulted = false;
                    }
                    Err(e) => {
                        self.report_fault("camera", &e.to_string());
                        self.machine.preview_failed(&e, now);
                    }
                },
                AppCommand::StopPreview => {
                    self.preview = None;
                    self.latest_preview = None;
                }
                AppCommand::Capture(request) => {
                    let mut ticket = self.pipeline.submit(request);
                    match ticket.try_take() {
                        // Busy rejections resolve immediately
                        Some(result) => queue.extend(self.machine.capture_resolved(result, now)),
                        None => self.in_flight = Some(ticket),
                    }
                }
                AppCommand::ScanWifi => self.wifi_handle.request_scan(),
                AppCommand::PersistState => self.persist_state(),
                AppCommand::SetBacklight(on) => {
                    if let Err(e) = self.renderer.set_backlight(on) {
                        warn!("Failed to switch backlight: {}", e);
                    }
                }
            }
        }

        self.announce_changes();
    }

    fn poll_capture(&mut self, now: Instant) {
        let Some(result) = self.in_flight.as_mut().and_then(|ticket| ticket.try_take()) else {
            return;
        };
        self.in_flight = None;

        let commands = self.machine.capture_resolved(result, now);
        self.execute(commands, now);
    }

    fn poll_preview(&mut self, now: Instant) {
        let polled = match self.preview.as_mut() {
            Some(stream) => stream.poll_frame(),
            None => return,
        };

        match polled {
            Ok(Some(frame)) => {
                self.latest_preview = Some(frame);
                self.preview_faulted = false;
            }
            Ok(None) => {}
            Err(e) => {
                if !self.preview_faulted {
                    self.report_fault("camera", &e.to_string());
                    self.machine.preview_failed(&e, now);
                }
                self.preview_faulted = true;
            }
        }
    }

    fn render_frame(&mut self, now: Instant) {
        let scene = self.machine.render(self.latest_preview.as_ref(), now);

        match self.renderer.render(&scene) {
            Ok(RenderOutcome::Presented) => {
                self.display_faulted = false;
                self.frames_presented += 1;
                if self.frames_presented % FPS_LOG_FRAMES == 0 {
                    let elapsed = now.duration_since(self.fps_window_start);
                    let stats = self.renderer.stats();
                    debug!(
                        "Rendered {} frames in {:.1}s ({:.1} fps), {} dropped, worst compose {:?}",
                        FPS_LOG_FRAMES,
                        elapsed.as_secs_f64(),
                        FPS_LOG_FRAMES as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
                        stats.frames_dropped,
                        stats.worst_compose
                    );
                    self.fps_window_start = now;
                }
            }
            Ok(RenderOutcome::Dropped) => {}
            Err(e) => {
                if !self.display_faulted {
                    self.report_fault("display", &e.to_string());
                }
                self.display_faulted = true;
            }
        }
    }

    fn refresh_status(&mut self, now: Instant) {
        let slow_refresh = now.duration_since(self.last_slow_refresh) >= SLOW_REFRESH;
        let space_ok = slow_refresh && self.pipeline.store().check_free_space().is_ok();

        let status = self.machine.status_mut();
        status.clock = self.timezone.now();
        status.wifi = self.wifi_handle.status();
        status.scan = self.wifi_handle.scan_state();

        if slow_refresh {
            status.system = SystemInfo::read();
            status.storage = self.pipeline.store().stats();
            self.last_slow_refresh = now;
            self.machine.storage_checked(space_ok);
            self.announce_changes();
        }
    }

    pub(super) fn persist_state(&mut self) {
        self.machine.persist_into(&mut self.state);
        if let Err(e) = self.state.save(&self.state_dir) {
            warn!("Failed to save state: {}", e);
        }
    }

    fn announce_changes(&mut self) {
        let screen = self.machine.screen();
        if screen != self.last_screen {
            let _ = self.event_bus.publish(PicamEvent::ScreenChanged {
                from: self.last_screen,
                to: screen,
            });
            self.last_screen = screen;
        }

        let warning = self.machine.storage_warning();
        if warning != self.last_storage_warning {
            let _ = self
                .event_bus
                .publish(PicamEvent::StorageWarning { active: warning });
            self.last_storage_warning = warning;
        }
    }

    pub(super) fn report_fault(&self, component: &str, details: &str) {
        error!("{} fault: {}", component, details);
        let _ = self.event_bus.publish(PicamEvent::HardwareFault {
            component: component.to_string(),
            details: details.to_string(),
        });
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self, shutdown_sender: ShutdownSender) {
        // Handle SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let sender = Arc::clone(&shutdown_sender);
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::spawn(async move {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            if let Some(sender) = sender.lock().await.take() {
                                let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                            }
                        }
                    });
                }
                Err(e) => error!("Failed to register SIGTERM handler: {}", e),
            }
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = shutdown_sender.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }

    /// Stop the loop when any component publishes `ShutdownRequested`
    fn watch_shutdown_requests(
        &self,
        mut events: broadcast::Receiver<PicamEvent>,
        shutdown_sender: ShutdownSender,
    ) {
        let cancel = self.cancellation_token.child_token();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(PicamEvent::ShutdownRequested { reason }) => {
                        if let Some(sender) = shutdown_sender.lock().await.take() {
                            let _ = sender.send(ShutdownReason::UserRequest(reason));
                        }
                        break;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Shutdown watcher skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
