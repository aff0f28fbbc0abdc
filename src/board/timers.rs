use std::time::Duration;

use tokio::{
    select,
    time::{interval_at, Instant, Interval, MissedTickBehavior},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    /// Reclassify already fetched data against a fresh instant.
    ClockTick,
    /// Run the whole fetch pipeline again.
    Poll,
}

/// The periodic timers of one view. They live exactly as long as this value,
/// so dropping it with the view task releases them.
#[derive(Debug)]
pub struct ViewTimers {
    clock: Interval,
    poll: Option<Interval>,
    poll_period: Duration,
}

fn periodic(period: Duration) -> Interval {
    // The first tick is one period away; the view loads on activation anyway.
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

impl ViewTimers {
    pub fn start(clock_tick: Duration, poll_period: Duration, auto_refresh: bool) -> ViewTimers {
        ViewTimers {
            clock: periodic(clock_tick),
            poll: auto_refresh.then(|| periodic(poll_period)),
            poll_period,
        }
    }

    pub fn auto_refresh(&self) -> bool {
        self.poll.is_some()
    }

    pub fn set_auto_refresh(&mut self, enabled: bool) {
        match (enabled, self.poll.is_some()) {
            (true, false) => self.poll = Some(periodic(self.poll_period)),
            (false, true) => self.poll = None,
            _ => {}
        }
    }

    /// Waits for the next timer to fire. Cancel safe.
    pub async fn next(&mut self) -> TimerEvent {
        let ViewTimers { clock, poll, .. } = self;

        let poll = async {
            match poll {
                Some(poll) => {
                    poll.tick().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        select! {
            _ = clock.tick() => TimerEvent::ClockTick,
            _ = poll => TimerEvent::Poll,
        }
    }
}
