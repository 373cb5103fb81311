use std::fs;
use std::time::Duration;
use tracing::debug;

/// Uptime and memory figures for the About page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemInfo {
    pub uptime: Option<Duration>,
    pub mem_total_kb: Option<u64>,
    pub mem_available_kb: Option<u64>,
}

impl SystemInfo {
    pub fn read() -> Self {
        let uptime = fs::read_to_string("/proc/uptime")
            .ok()
            .and_then(|s| parse_uptime(&s));
        let (mem_total_kb, mem_available_kb) = fs::read_to_string("/proc/meminfo")
            .map(|s| parse_meminfo(&s))
            .unwrap_or((None, None));

        if uptime.is_none() {
            debug!("/proc/uptime not readable");
        }

        Self {
            uptime,
            mem_total_kb,
            mem_available_kb,
        }
    }

    pub fn uptime_label(&self) -> String {
        match self.uptime {
            Some(uptime) => {
                let minutes = uptime.as_secs() / 60;
                let (days, hours, minutes) = (minutes / 1440, minutes / 60 % 24, minutes % 60);
                if days > 0 {
                    format!("{}d {}h {}m", days, hours, minutes)
                } else {
                    format!("{}h {}m", hours, minutes)
                }
            }
            None => "unknown".to_string(),
        }
    }

    pub fn memory_label(&self) -> String {
        match (self.mem_total_kb, self.mem_available_kb) {
            (Some(total), Some(available)) if total > 0 => {
                let used = total.saturating_sub(available);
                format!("{}/{}MB ({}%)", used / 1024, total / 1024, used * 100 / total)
            }
            _ => "unknown".to_string(),
        }
    }
}

fn parse_uptime(contents: &str) -> Option<Duration> {
    let seconds: f64 = contents.split_whitespace().next()?.parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| Duration::from_secs_f64(seconds))
}

fn parse_meminfo(contents: &str) -> (Option<u64>, Option<u64>) {
    let field = |name: &str| {
        contents.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            rest.split_whitespace().next()?.parse::<u64>().ok()
        })
    };
    (field("MemTotal"), field("MemAvailable"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_files() {
        assert_eq!(
            parse_uptime("12345.67 40000.00\n"),
            Some(Duration::from_secs_f64(12345.67))
        );
        assert_eq!(parse_uptime(""), None);

        let meminfo = "MemTotal:         443844 kB\nMemFree:          120000 kB\nMemAvailable:     221922 kB\n";
        assert_eq!(parse_meminfo(meminfo), (Some(443844), Some(221922)));
    }

    #[test]
    fn test_labels() {
        let info = SystemInfo {
            uptime: Some(Duration::from_secs(2 * 86400 + 3 * 3600 + 5 * 60)),
            mem_total_kb: Some(409600),
            mem_available_kb: Some(204800),
        };
        assert_eq!(info.uptime_label(), "2d 3h 5m");
        assert_eq!(info.memory_label(), "200/400MB (50%)");
        assert_eq!(SystemInfo::default().memory_label(), "unknown");
    }
}
