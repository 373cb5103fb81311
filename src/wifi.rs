use crate::config::WifiConfig;
use crate::error::WifiError;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Current association of the WiFi interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiStatus {
    pub ssid: Option<String>,
    pub ip_address: Option<String>,
}

impl WifiStatus {
    pub fn is_connected(&self) -> bool {
        self.ssid.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
    Done(Vec<String>),
    Failed(String),
}

/// Network status source for the settings screens
#[async_trait::async_trait]
pub trait WifiManager: Send + Sync {
    async fn status(&self) -> Result<WifiStatus, WifiError>;

    /// Visible network names, strongest first as reported by the driver
    async fn scan(&self) -> Result<Vec<String>, WifiError>;

    fn name(&self) -> &str;
}

/// Queries the system WiFi tools
pub struct CommandWifi {
    interface: String,
}

impl CommandWifi {
    pub fn new(config: &WifiConfig) -> Self {
        Self {
            interface: config.interface.clone(),
        }
    }
}

#[async_trait::async_trait]
impl WifiManager for CommandWifi {
    async fn status(&self) -> Result<WifiStatus, WifiError> {
        let ssid = run_command("iwgetid", &["-r"]).await.ok().and_then(non_empty);
        let ip_address = run_command("hostname", &["-I"])
            .await
            .ok()
            .and_then(|out| parse_first_address(&out));
        Ok(WifiStatus { ssid, ip_address })
    }

    async fn scan(&self) -> Result<Vec<String>, WifiError> {
        let output = run_command("iwlist", &[&self.interface, "scan"]).await?;
        Ok(parse_iwlist_ssids(&output))
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// Fixed answers, used when WiFi management is disabled and in tests
#[derive(Debug, Clone, Default)]
pub struct StaticWifi {
    status: WifiStatus,
    networks: Vec<String>,
}

impl StaticWifi {
    pub fn new(status: WifiStatus, networks: Vec<String>) -> Self {
        Self { status, networks }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl WifiManager for StaticWifi {
    async fn status(&self) -> Result<WifiStatus, WifiError> {
        Ok(self.status.clone())
    }

    async fn scan(&self) -> Result<Vec<String>, WifiError> {
        Ok(self.networks.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

pub fn create_wifi_manager(config: &WifiConfig) -> Arc<dyn WifiManager> {
    if config.enabled {
        Arc::new(CommandWifi::new(config))
    } else {
        info!("WiFi management disabled");
        Arc::new(StaticWifi::disconnected())
    }
}

#[derive(Debug, Default)]
struct WifiShared {
    status: WifiStatus,
    scan: ScanState,
}

/// Snapshot side of the WiFi monitor, read by the UI every frame
#[derive(Debug, Clone, Default)]
pub struct WifiHandle {
    shared: Arc<RwLock<WifiShared>>,
    scan_requested: Arc<Notify>,
}

impl WifiHandle {
    pub fn status(&self) -> WifiStatus {
        self.shared.read().status.clone()
    }

    pub fn scan_state(&self) -> ScanState {
        self.shared.read().scan.clone()
    }

    /// Ask the monitor for a scan; ignored while one is already running
    pub fn request_scan(&self) {
        {
            let mut shared = self.shared.write();
            if shared.scan == ScanState::Scanning {
                return;
            }
            shared.scan = ScanState::Scanning;
        }
        self.scan_requested.notify_one();
    }

    fn set_status(&self, status: WifiStatus) {
        self.shared.write().status = status;
    }

    fn set_scan(&self, scan: ScanState) {
        self.shared.write().scan = scan;
    }
}

/// Background task keeping a [`WifiHandle`] current
pub struct WifiMonitor {
    manager: Arc<dyn WifiManager>,
    poll_interval: Duration,
    handle: WifiHandle,
}

impl WifiMonitor {
    pub fn new(manager: Arc<dyn WifiManager>, poll_interval: Duration) -> Self {
        Self {
            manager,
            poll_interval,
            handle: WifiHandle::default(),
        }
    }

    pub fn handle(&self) -> WifiHandle {
        self.handle.clone()
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "WiFi monitor started ({} backend, every {:?})",
                self.manager.name(),
                self.poll_interval
            );
            let mut interval = tokio::time::interval(self.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => self.refresh_status().await,
                    _ = self.handle.scan_requested.notified() => self.run_scan().await,
                }
            }
            debug!("WiFi monitor stopped");
        })
    }

    async fn refresh_status(&self) {
        match self.manager.status().await {
            Ok(status) => {
                if status != self.handle.status() {
                    info!(
                        "WiFi: {} ({})",
                        status.ssid.as_deref().unwrap_or("not connected"),
                        status.ip_address.as_deref().unwrap_or("no address")
                    );
                }
                self.handle.set_status(status);
            }
            Err(e) => warn!("WiFi status query failed: {}", e),
        }
    }

    async fn run_scan(&self) {
        let state = match self.manager.scan().await {
            Ok(networks) => {
                debug!("WiFi scan found {} networks", networks.len());
                ScanState::Done(networks)
            }
            Err(e) => {
                warn!("WiFi scan failed: {}", e);
                ScanState::Failed(e.to_string())
            }
        };
        self.handle.set_scan(state);
    }
}

async fn run_command(program: &str, args: &[&str]) -> Result<String, WifiError> {
    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| WifiError::Command {
            command: program.to_string(),
            details: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(WifiError::Command {
            command: program.to_string(),
            details: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_first_address(output: &str) -> Option<String> {
    output.split_whitespace().next().map(str::to_string)
}

/// Pull unique, non-hidden ESSIDs out of `iwlist scan` output
pub fn parse_iwlist_ssids(output: &str) -> Vec<String> {
    let mut networks: Vec<String> = Vec::new();
    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix("ESSID:") else {
            continue;
        };
        let ssid = rest.trim().trim_matches('"');
        if !ssid.is_empty() && !networks.iter().any(|n| n == ssid) {
            networks.push(ssid.to_string());
        }
    }
    networks
}

#[cfg(test)]
mod tests {
    use super::*;

    const IWLIST_OUTPUT: &str = r#"wlan0     Scan completed :
          Cell 01 - Address: 11:22:33:44:55:66
                    Quality=60/70  Signal level=-50 dBm
                    ESSID:"HomeNet"
          Cell 02 - Address: 11:22:33:44:55:77
                    ESSID:""
          Cell 03 - Address: 11:22:33:44:55:88
                    ESSID:"Cafe Guest"
          Cell 04 - Address: 11:22:33:44:55:99
                    ESSID:"HomeNet"
"#;

    #[test]
    fn test_parse_iwlist_ssids() {
        assert_eq!(
            parse_iwlist_ssids(IWLIST_OUTPUT),
            vec!["HomeNet".to_string(), "Cafe Guest".to_string()]
        );
        assert!(parse_iwlist_ssids("wlan0     No scan results").is_empty());
    }

    #[test]
    fn test_parse_first_address() {
        assert_eq!(
            parse_first_address("192.168.1.20 fd00::1 \n"),
            Some("192.168.1.20".to_string())
        );
        assert_eq!(parse_first_address("  \n"), None);
    }

    #[tokio::test]
    async fn test_monitor_publishes_status_and_scan() {
        let manager = Arc::new(StaticWifi::new(
            WifiStatus {
                ssid: Some("HomeNet".to_string()),
                ip_address: Some("10.0.0.2".to_string()),
            },
            vec!["HomeNet".to_string(), "Other".to_string()],
        ));
        let monitor = WifiMonitor::new(manager, Duration::from_millis(10));
        let handle = monitor.handle();
        let cancel = CancellationToken::new();
        let task = monitor.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.status().is_connected());
        assert_eq!(handle.status().ip_address.as_deref(), Some("10.0.0.2"));

        handle.request_scan();
        assert_eq!(handle.scan_state(), ScanState::Scanning);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            handle.scan_state(),
            ScanState::Done(vec!["HomeNet".to_string(), "Other".to_string()])
        );

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_config_uses_static_backend() {
        let config = WifiConfig {
            enabled: false,
            ..crate::config::PicamConfig::default().wifi
        };
        let manager = create_wifi_manager(&config);
        assert_eq!(manager.name(), "static");
        assert!(!manager.status().await.unwrap().is_connected());
    }
}
