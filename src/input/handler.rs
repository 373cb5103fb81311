use super::debouncer::InputDebouncer;
use super::types::{InputMessage, LineFault};
use crate::events::{EventBus, PicamEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Drives an [`InputDebouncer`] on its own task and forwards events to the UI loop
pub struct InputTask {
    debouncer: InputDebouncer,
    sample_interval: Duration,
    event_bus: Arc<EventBus>,
    max_retries: u32,
    retry_delay: Duration,
}

impl InputTask {
    pub fn new(
        debouncer: InputDebouncer,
        sample_interval: Duration,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            debouncer,
            sample_interval,
            event_bus,
            max_retries: 10,
            retry_delay: Duration::from_millis(250),
        }
    }

    /// Spawn the sampling loop; it ends when `cancel` fires or the receiver is dropped
    pub fn spawn(
        mut self,
        sender: mpsc::Sender<InputMessage>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "Starting input sampling every {:?}",
                self.sample_interval
            );

            let mut ticker = interval(self.sample_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut retry_count = 0u32;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Input task cancelled");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                let events: Vec<_> = match self.debouncer.poll() {
                    Ok(events) => {
                        retry_count = 0;
                        events.collect()
                    }
                    Err(e) => {
                        retry_count += 1;
                        error!("Input read error: {}", e);
                        let _ = self.event_bus.publish(PicamEvent::HardwareFault {
                            component: "input".to_string(),
                            details: format!(
                                "Attempt {}/{}: {}",
                                retry_count, self.max_retries, e
                            ),
                        });

                        if retry_count >= self.max_retries {
                            error!(
                                "Input failed after {} attempts, giving up",
                                self.max_retries
                            );
                            break;
                        }

                        let delay = self.retry_delay * 2_u32.pow(retry_count.min(5));
                        warn!(
                            "Retrying input read in {:?} (attempt {}/{})",
                            delay, retry_count, self.max_retries
                        );
                        sleep(delay).await;
                        continue;
                    }
                };

                let faults = self.debouncer.drain_faults();
                for fault in &faults {
                    if let LineFault::Stuck(direction) = fault {
                        let _ = self.event_bus.publish(PicamEvent::HardwareFault {
                            component: "input".to_string(),
                            details: format!("{} line stuck asserted", direction),
                        });
                    }
                }

                let messages = events
                    .into_iter()
                    .map(InputMessage::Event)
                    .chain(faults.into_iter().map(InputMessage::Fault));

                for message in messages {
                    match sender.try_send(message) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(dropped)) => {
                            warn!("UI loop behind, dropping input {:?}", dropped);
                        }
                        Err(mpsc::error::TrySendError::Closed(_)) => {
                            debug!("Input receiver closed, stopping input task");
                            return;
                        }
                    }
                }
            }

            debug!("Input task exited");
        })
    }
}
