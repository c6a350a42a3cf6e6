// SPDX-FileCopyrightText: 2026 Vigil Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local-time arithmetic for the notification window gate.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use vigil_config::model::HourWindow;
use vigil_core::DeviceRecord;

/// The offset of the first device that reports one, else 0.
pub fn user_offset(devices: &[DeviceRecord]) -> i32 {
    devices
        .iter()
        .find_map(|d| d.utc_offset_hours)
        .unwrap_or(0)
}

/// Hour of day at `offset` hours from UTC. Always in `0..24`.
pub fn local_hour(utc_hour: u32, offset: i32) -> u32 {
    (utc_hour as i32 + offset).rem_euclid(24) as u32
}

/// Calendar date at `offset` hours from UTC.
pub fn local_date(now: DateTime<Utc>, offset: i32) -> NaiveDate {
    (now + Duration::hours(i64::from(offset))).date_naive()
}

/// Whether `hour` falls in any inclusive window.
pub fn in_windows(hour: u32, windows: &[HourWindow]) -> bool {
    windows.iter().any(|w| (w.start..=w.end).contains(&hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn device(offset: Option<i32>) -> DeviceRecord {
        DeviceRecord {
            user_id: "u".into(),
            token: "t".into(),
            notifications_enabled: true,
            time_zone: None,
            utc_offset_hours: offset,
            badge_count: 0,
            platform: None,
            device_id: None,
            device_model: None,
            device_name: None,
            last_notified: None,
            last_updated: None,
        }
    }

    #[test]
    fn first_device_with_offset_wins() {
        let devices = vec![device(None), device(Some(3)), device(Some(-8))];
        assert_eq!(user_offset(&devices), 3);
        assert_eq!(user_offset(&[device(None)]), 0);
        assert_eq!(user_offset(&[]), 0);
    }

    #[test]
    fn local_hour_wraps_both_ways() {
        assert_eq!(local_hour(2, -5), 21);
        assert_eq!(local_hour(22, 5), 3);
        assert_eq!(local_hour(8, 0), 8);
        assert_eq!(local_hour(0, -12), 12);
        assert_eq!(local_hour(23, 14), 13);
    }

    #[test]
    fn local_date_crosses_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 2, 0, 0).unwrap();
        assert_eq!(local_date(now, -5), NaiveDate::from_ymd_opt(2026, 5, 9).unwrap());
        assert_eq!(local_date(now, 3), NaiveDate::from_ymd_opt(2026, 5, 10).unwrap());
    }

    #[test]
    fn windows_are_inclusive() {
        let windows = [HourWindow { start: 7, end: 9 }, HourWindow { start: 18, end: 20 }];
        let open: Vec<u32> = (0..24).filter(|h| in_windows(*h, &windows)).collect();
        assert_eq!(open, vec![7, 8, 9, 18, 19, 20]);
    }
}
