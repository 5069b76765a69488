use crate::error::Error;
use crate::Result;
use std::fmt;
use std::str::FromStr;

/// Candle bucket duration accepted by the futures candle endpoint
///
/// Labels are case-sensitive: `1m` is one minute, `1M` is one (30-day) month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
    OneWeek,
    OneMonth,
}

impl Granularity {
    pub const ALL: [Granularity; 10] = [
        Granularity::OneMinute,
        Granularity::ThreeMinutes,
        Granularity::FiveMinutes,
        Granularity::FifteenMinutes,
        Granularity::ThirtyMinutes,
        Granularity::OneHour,
        Granularity::FourHours,
        Granularity::OneDay,
        Granularity::OneWeek,
        Granularity::OneMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::OneMinute => "1m",
            Granularity::ThreeMinutes => "3m",
            Granularity::FiveMinutes => "5m",
            Granularity::FifteenMinutes => "15m",
            Granularity::ThirtyMinutes => "30m",
            Granularity::OneHour => "1H",
            Granularity::FourHours => "4H",
            Granularity::OneDay => "1D",
            Granularity::OneWeek => "1W",
            Granularity::OneMonth => "1M",
        }
    }

    pub fn seconds(&self) -> i64 {
        match self {
            Granularity::OneMinute => 60,
            Granularity::ThreeMinutes => 180,
            Granularity::FiveMinutes => 300,
            Granularity::FifteenMinutes => 900,
            Granularity::ThirtyMinutes => 1800,
            Granularity::OneHour => 3600,
            Granularity::FourHours => 14400,
            Granularity::OneDay => 86400,
            Granularity::OneWeek => 604800,
            Granularity::OneMonth => 2592000,
        }
    }

    /// Request window ending at `end_ms` that covers `count` candles
    ///
    /// Returns `(start_ms, end_ms)` with `end - start == count * seconds * 1000`.
    /// Fails with a data error when the window does not fit in epoch milliseconds.
    pub fn time_window(&self, end_ms: i64, count: u32) -> Result<(i64, i64)> {
        i64::from(count)
            .checked_mul(self.seconds() * 1000)
            .and_then(|span_ms| end_ms.checked_sub(span_ms))
            .map(|start_ms| (start_ms, end_ms))
            .ok_or_else(|| {
                Error::Data(format!(
                    "{} candles of {} before {} overflow the time range",
                    count, self, end_ms
                ))
            })
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Granularity::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == value)
            .ok_or_else(|| Error::InvalidGranularity(value.to_string()))
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
