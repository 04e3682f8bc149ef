//! Wall-clock triggers evaluated in a fixed timezone.

use chrono::{DateTime, Days, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Fires at `minute` past each of `hours`, every day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronTrigger {
    hours: Vec<u32>,
    minute: u32,
}

impl CronTrigger {
    /// Once a day at `hour:minute`.
    pub fn daily(hour: u32, minute: u32) -> Self {
        Self::at_hours(&[hour], minute)
    }

    /// At `minute` past every listed hour. Out-of-range values are dropped.
    pub fn at_hours(hours: &[u32], minute: u32) -> Self {
        let mut hours: Vec<u32> = hours.iter().copied().filter(|h| *h < 24).collect();
        hours.sort_unstable();
        hours.dedup();
        Self {
            hours,
            minute: minute.min(59),
        }
    }

    /// `start`, `start + step`, ... up to `end` inclusive, like `9-15/2`.
    pub fn stepped(start: u32, end: u32, step: u32, minute: u32) -> Self {
        let hours: Vec<u32> = (start..=end).step_by(step.max(1) as usize).collect();
        Self::at_hours(&hours, minute)
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// First fire time strictly after `after`, computed on `tz` wall-clock time.
    pub fn next_fire_after(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        let local_date = after.with_timezone(&tz).date_naive();

        for offset in 0..3 {
            let date = local_date.checked_add_days(Days::new(offset))?;
            for hour in &self.hours {
                let Some(naive) = date.and_hms_opt(*hour, self.minute, 0) else {
                    continue;
                };
                // Wall-clock times skipped by a DST gap never fire
                let Some(local) = tz.from_local_datetime(&naive).earliest() else {
                    continue;
                };
                let fire = local.with_timezone(&Utc);
                if fire > after {
                    return Some(fire);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    const VN: Tz = chrono_tz::Asia::Ho_Chi_Minh;

    #[test]
    fn test_daily_fires_same_day_when_before() {
        let trigger = CronTrigger::daily(7, 0);
        // 05:00 local (UTC+7)
        let next = trigger.next_fire_after(utc(2024, 3, 1, 22, 0), VN).unwrap();
        assert_eq!(next, utc(2024, 3, 2, 0, 0));
    }

    #[test]
    fn test_daily_rolls_over_to_next_day() {
        let trigger = CronTrigger::daily(7, 0);
        // Exactly 07:00 local is not strictly after
        let next = trigger.next_fire_after(utc(2024, 3, 2, 0, 0), VN).unwrap();
        assert_eq!(next, utc(2024, 3, 3, 0, 0));
    }

    #[test]
    fn test_stepped_hours() {
        let trigger = CronTrigger::stepped(9, 15, 2, 30);
        assert_eq!(trigger.hours(), &[9, 11, 13, 15]);

        // 10:00 local -> 11:30 local
        let next = trigger.next_fire_after(utc(2024, 3, 1, 3, 0), VN).unwrap();
        assert_eq!(next, utc(2024, 3, 1, 4, 30));

        // 15:45 local -> 09:30 local next day
        let next = trigger.next_fire_after(utc(2024, 3, 1, 8, 45), VN).unwrap();
        assert_eq!(next, utc(2024, 3, 2, 2, 30));
    }

    #[test]
    fn test_empty_trigger_never_fires() {
        let trigger = CronTrigger::at_hours(&[25], 0);
        assert!(trigger.next_fire_after(utc(2024, 3, 1, 0, 0), VN).is_none());
    }

    #[test]
    fn test_dst_timezone() {
        let trigger = CronTrigger::daily(2, 30);
        let ny: Tz = chrono_tz::America::New_York;
        // 2024-03-10 02:30 does not exist in New York
        let next = trigger
            .next_fire_after(utc(2024, 3, 10, 5, 0), ny)
            .unwrap();
        assert_eq!(next, utc(2024, 3, 11, 6, 30));
    }
}
