use chrono::{DateTime, TimeDelta, Timelike, Utc};
use std::time::Duration;

use crate::error::Error;
use crate::Result;

use super::Clock;

/// Minute offsets within every hour at which the pipeline fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    minute_offsets: Vec<u32>,
}

impl Schedule {
    /// Build a schedule from minute offsets (0-59); duplicates are merged
    pub fn new(minute_offsets: &[u32]) -> Result<Self> {
        if minute_offsets.is_empty() {
            return Err(Error::InvalidSchedule("no minute offsets".to_string()));
        }
        if let Some(bad) = minute_offsets.iter().find(|m| **m >= 60) {
            return Err(Error::InvalidSchedule(format!(
                "minute offset {} out of range 0-59",
                bad
            )));
        }

        let mut minute_offsets = minute_offsets.to_vec();
        minute_offsets.sort_unstable();
        minute_offsets.dedup();

        Ok(Self { minute_offsets })
    }

    /// :00, :15, :30 and :45 every hour
    pub fn quarter_hourly() -> Self {
        Self {
            minute_offsets: vec![0, 15, 30, 45],
        }
    }

    pub fn minute_offsets(&self) -> &[u32] {
        &self.minute_offsets
    }

    /// First slot strictly after `now`
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.minute_offsets
            .iter()
            .map(|m| next_occurrence(*m, now))
            .min()
            .unwrap_or(now)
    }

    /// Minutes between consecutive slots when the offsets are evenly spaced
    pub fn cadence_minutes(&self) -> u32 {
        match self.minute_offsets.as_slice() {
            [first, second, ..] => second - first,
            _ => 60,
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::quarter_hourly()
    }
}

/// Next `:minute` mark strictly after `now`
fn next_occurrence(minute: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let into_hour = i64::from(now.minute()) * 60 + i64::from(now.second());
    let hour_start = now
        - TimeDelta::seconds(into_hour)
        - TimeDelta::nanoseconds(i64::from(now.nanosecond()));

    let slot = hour_start + TimeDelta::minutes(i64::from(minute));
    if slot > now {
        slot
    } else {
        slot + TimeDelta::hours(1)
    }
}

/// Source of scheduled slots
#[allow(async_fn_in_trait)]
pub trait Ticker {
    /// Wait for the next due slot and return it
    async fn tick(&mut self) -> DateTime<Utc>;
}

/// Poll-and-sleep ticker over a [`Clock`]
///
/// Every minute offset keeps its own next run. An offset whose run has
/// passed fires on the next poll, late and once, and is then rescheduled
/// from the time the caller comes back for the next slot. A caller that
/// overruns several offsets gets each of them once, oldest first.
pub struct ClockTicker<C> {
    clock: C,
    poll_interval: Duration,
    /// `(minute offset, next run)` per offset
    runs: Vec<(u32, DateTime<Utc>)>,
    /// Offset returned by the previous `tick`, rescheduled on the next one
    fired: Option<usize>,
}

impl<C: Clock> ClockTicker<C> {
    pub fn new(clock: C, schedule: Schedule, poll_interval: Duration) -> Self {
        let now = clock.now();
        let runs = schedule
            .minute_offsets()
            .iter()
            .map(|m| (*m, next_occurrence(*m, now)))
            .collect();
        Self {
            clock,
            poll_interval,
            runs,
            fired: None,
        }
    }

    /// Earliest pending run
    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.runs.iter().map(|(_, due)| *due).min()
    }

    fn overdue(&self, now: DateTime<Utc>) -> Option<usize> {
        self.runs
            .iter()
            .enumerate()
            .filter(|(_, (_, due))| *due <= now)
            .min_by_key(|(_, (_, due))| *due)
            .map(|(i, _)| i)
    }
}

impl<C: Clock> Ticker for ClockTicker<C> {
    async fn tick(&mut self) -> DateTime<Utc> {
        if let Some(i) = self.fired.take() {
            let now = self.clock.now();
            let (minute, due) = &mut self.runs[i];
            *due = next_occurrence(*minute, now);
        }

        loop {
            if let Some(i) = self.overdue(self.clock.now()) {
                self.fired = Some(i);
                return self.runs[i].1;
            }
            if self.runs.is_empty() {
                return self.clock.now();
            }
            self.clock.sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Clock whose sleep advances simulated time
    #[derive(Clone)]
    struct FakeClock {
        now: Rc<Cell<DateTime<Utc>>>,
    }

    impl FakeClock {
        fn at(h: u32, m: u32, s: u32) -> Self {
            Self {
                now: Rc::new(Cell::new(Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap())),
            }
        }

        fn advance(&self, delta: TimeDelta) {
            self.now.set(self.now.get() + delta);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            self.now.get()
        }

        async fn sleep(&self, duration: Duration) {
            self.advance(TimeDelta::from_std(duration).unwrap());
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_next_fire_after() {
        let schedule = Schedule::quarter_hourly();
        assert_eq!(schedule.next_fire_after(at(10, 7, 30)), at(10, 15, 0));
        assert_eq!(schedule.next_fire_after(at(10, 15, 0)), at(10, 30, 0));
        assert_eq!(schedule.next_fire_after(at(10, 46, 0)), at(11, 0, 0));
        assert_eq!(schedule.next_fire_after(at(23, 59, 59)), Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_schedule_validation() {
        assert!(Schedule::new(&[]).is_err());
        assert!(Schedule::new(&[0, 60]).unwrap_err().is_validation());

        let schedule = Schedule::new(&[45, 0, 15, 30, 15]).unwrap();
        assert_eq!(schedule.minute_offsets(), &[0, 15, 30, 45]);
        assert_eq!(schedule.cadence_minutes(), 15);
        assert_eq!(Schedule::new(&[5]).unwrap().cadence_minutes(), 60);
    }

    #[tokio::test]
    async fn test_fires_on_quarter_hours() {
        let clock = FakeClock::at(10, 7, 30);
        let mut ticker = ClockTicker::new(clock.clone(), Schedule::quarter_hourly(), Duration::from_secs(1));

        let mut fired = Vec::new();
        for _ in 0..5 {
            fired.push(ticker.tick().await);
            assert_eq!(clock.now(), *fired.last().unwrap());
        }

        assert_eq!(
            fired,
            vec![at(10, 15, 0), at(10, 30, 0), at(10, 45, 0), at(11, 0, 0), at(11, 15, 0)]
        );
    }

    #[tokio::test]
    async fn test_overrun_fires_missed_slot_late() {
        let clock = FakeClock::at(10, 14, 0);
        let mut ticker = ClockTicker::new(clock.clone(), Schedule::quarter_hourly(), Duration::from_secs(1));

        assert_eq!(ticker.tick().await, at(10, 15, 0));

        // the tick's own work runs past the :30 slot
        clock.advance(TimeDelta::minutes(20));

        assert_eq!(ticker.tick().await, at(10, 30, 0));
        assert_eq!(clock.now(), at(10, 35, 0));

        assert_eq!(ticker.tick().await, at(10, 45, 0));
        assert_eq!(clock.now(), at(10, 45, 0));
        assert_eq!(ticker.tick().await, at(11, 0, 0));
    }

    #[tokio::test]
    async fn test_long_overrun_fires_each_offset_once() {
        let clock = FakeClock::at(10, 14, 0);
        let mut ticker = ClockTicker::new(clock.clone(), Schedule::quarter_hourly(), Duration::from_secs(1));

        assert_eq!(ticker.tick().await, at(10, 15, 0));

        // runs through :30, :45, :00 and back past :15
        clock.advance(TimeDelta::minutes(62));

        let mut late = Vec::new();
        for _ in 0..3 {
            late.push(ticker.tick().await);
        }
        assert_eq!(late, vec![at(10, 30, 0), at(10, 45, 0), at(11, 0, 0)]);
        assert_eq!(clock.now(), at(11, 17, 0));

        // :15 was rescheduled from 11:17 when it was collected
        assert_eq!(ticker.tick().await, at(11, 30, 0));
    }
}
