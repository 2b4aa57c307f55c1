//! Wall-clock source used to name snapshots.

use chrono::{DateTime, Local};

/// Prefix shared by every snapshot directory name
pub const SNAPSHOT_PREFIX: &str = "backup_";

/// Timestamp layout embedded in snapshot names (second resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// The host's local wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

/// `backup_YYYYMMDD_HHMMSS` for the given instant
pub fn snapshot_name(at: DateTime<Local>) -> String {
    format!("{}{}", SNAPSHOT_PREFIX, at.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snapshot_name_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(snapshot_name(at), "backup_20240307_090502");
    }

    #[test]
    fn test_fixed_clock_does_not_advance() {
        let at = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), clock.now());
        assert_eq!(snapshot_name(clock.now()), "backup_20241231_235959");
    }

    #[test]
    fn test_system_clock_name_shape() {
        let name = snapshot_name(SystemClock.now());
        assert_eq!(name.len(), "backup_YYYYMMDD_HHMMSS".len());
        assert!(name.starts_with(SNAPSHOT_PREFIX));
    }
}
