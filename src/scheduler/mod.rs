// Wall-clock scheduling of the trading pipeline
pub mod clock;
pub mod schedule;

pub use clock::{Clock, SystemClock};
pub use schedule::{ClockTicker, Schedule, Ticker};

use chrono::{DateTime, Utc};

/// Work run once per scheduled slot
#[allow(async_fn_in_trait)]
pub trait ScheduledJob {
    async fn run(&mut self, slot: DateTime<Utc>);
}

/// Run `job` on every slot the ticker yields, forever
pub async fn run_forever<T: Ticker, J: ScheduledJob>(ticker: &mut T, job: &mut J) {
    loop {
        let slot = ticker.tick().await;
        job.run(slot).await;
    }
}

/// Run `job` on the next `count` slots
pub async fn run_slots<T: Ticker, J: ScheduledJob>(ticker: &mut T, job: &mut J, count: usize) {
    for _ in 0..count {
        let slot = ticker.tick().await;
        job.run(slot).await;
    }
}
