use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;
use std::time::SystemTime;
use tracing::warn;

/// Timezone used to name photos and pick their date folder
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhotoTimezone {
    /// The device's local time
    Local,
    Named(Tz),
}

impl PhotoTimezone {
    /// Resolve the configured timezone, falling back to UTC on parse errors
    pub fn from_config(name: Option<&str>) -> Self {
        match name {
            None => PhotoTimezone::Local,
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => PhotoTimezone::Named(tz),
                Err(_) => {
                    warn!("Invalid photo timezone '{}', falling back to UTC", name);
                    PhotoTimezone::Named(chrono_tz::UTC)
                }
            },
        }
    }

    pub fn localize(&self, time: SystemTime) -> DateTime<FixedOffset> {
        let utc: DateTime<Utc> = time.into();
        match self {
            PhotoTimezone::Local => utc.with_timezone(&Local).fixed_offset(),
            PhotoTimezone::Named(tz) => utc.with_timezone(tz).fixed_offset(),
        }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        self.localize(SystemTime::now())
    }
}

/// `YYYY-MM-DD` folder under `by_date/`
pub fn date_folder_name(captured_at: &DateTime<FixedOffset>) -> String {
    captured_at.format("%Y-%m-%d").to_string()
}

/// `<prefix>_<YYYYMMDD>_<HHMMSS>_<mmm>`, without extension
pub fn photo_stem(prefix: &str, captured_at: &DateTime<FixedOffset>) -> String {
    format!("{}_{}", prefix, captured_at.format("%Y%m%d_%H%M%S_%3f"))
}

/// File name for the `attempt`-th candidate; attempts after the first get a `_n` suffix
pub fn photo_file_name(stem: &str, extension: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{}.{}", stem, extension)
    } else {
        format!("{}_{}.{}", stem, attempt, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    // 2024-03-09 23:59:59 UTC
    const LAST_SECOND: u64 = 1_710_028_799;

    #[test]
    fn test_date_folder_at_midnight_boundary() {
        let tz = PhotoTimezone::Named(chrono_tz::UTC);

        let before = tz.localize(UNIX_EPOCH + Duration::from_secs(LAST_SECOND));
        let after = tz.localize(UNIX_EPOCH + Duration::from_secs(LAST_SECOND + 1));

        assert_eq!(date_folder_name(&before), "2024-03-09");
        assert_eq!(date_folder_name(&after), "2024-03-10");
    }

    #[test]
    fn test_named_timezone_shifts_date() {
        // 23:59:59 UTC is already the next morning in Tokyo
        let tz = PhotoTimezone::from_config(Some("Asia/Tokyo"));
        let at = tz.localize(UNIX_EPOCH + Duration::from_secs(LAST_SECOND));
        assert_eq!(date_folder_name(&at), "2024-03-10");
    }

    #[test]
    fn test_invalid_timezone_falls_back_to_utc() {
        assert_eq!(
            PhotoTimezone::from_config(Some("Not/AZone")),
            PhotoTimezone::Named(chrono_tz::UTC)
        );
        assert_eq!(PhotoTimezone::from_config(None), PhotoTimezone::Local);
    }

    #[test]
    fn test_photo_names() {
        let tz = PhotoTimezone::Named(chrono_tz::UTC);
        let at = tz.localize(UNIX_EPOCH + Duration::from_millis(LAST_SECOND * 1000 + 42));
        let stem = photo_stem("photo", &at);

        assert_eq!(stem, "photo_20240309_235959_042");
        assert_eq!(photo_file_name(&stem, "jpg", 0), "photo_20240309_235959_042.jpg");
        assert_eq!(photo_file_name(&stem, "jpg", 2), "photo_20240309_235959_042_2.jpg");
    }
}
