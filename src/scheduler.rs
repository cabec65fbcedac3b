//! Once-a-day refresh at a fixed local hour.
//!
//! The scheduler is a two-state machine. In `Idle` it computes the next
//! occurrence of the target hour and arms a one-shot timer for it; when the
//! timer fires it moves to `Running`, refreshes the cache, and goes back to
//! `Idle`, re-arming from the wall clock. At startup, if today's target hour
//! has already passed, it refreshes once before arming (startup catch-up).
//!
//! Waits are taken in naps of at most [`MAX_NAP`], re-reading the wall clock
//! after each, so a machine that was suspended or had its clock changed still
//! fires close to the intended local time.

use crate::cache::FreshnessCache;
use crate::clock::Clock;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, TimeZone};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Longest single sleep before the wall clock is consulted again.
pub const MAX_NAP: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next fire time.
    Idle { next_fire: DateTime<Local> },
    /// A refresh is in progress.
    Running,
}

/// Events emitted by the scheduler for whoever is listening (the shell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// A refresh finished.
    Refreshed { articles: usize, catch_up: bool },
    /// The timer was armed for `next_fire`, `delay` from now.
    Armed { next_fire: DateTime<Local>, delay: Duration },
}

fn target_time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Map a local wall-clock time to an instant. Times inside a DST gap move
/// forward to the first representable quarter hour.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    (0..=8)
        .map(|step| naive + ChronoDuration::minutes(15 * step))
        .find_map(|t| tz.from_local_datetime(&t).earliest())
}

/// The first occurrence of `hour:00` strictly after `now`, in `now`'s zone.
///
/// If the target hour has already been reached today, this is tomorrow's.
pub fn next_fire_at<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let at = target_time(hour);
    let mut date = now.date_naive();
    for _ in 0..3 {
        if let Some(candidate) = resolve_local(&tz, date.and_time(at)) {
            if candidate > *now {
                return candidate;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    now.clone() + ChronoDuration::days(1)
}

/// Time to wait from `now` until the next fire.
pub fn delay_until_next<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> Duration {
    (next_fire_at(now, hour) - now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Whether today's target hour has already been reached.
pub fn is_past_target<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> bool {
    now.naive_local().time() >= target_time(hour)
}

pub struct DailyScheduler {
    cache: Arc<FreshnessCache>,
    clock: Arc<dyn Clock>,
    hour: u32,
    state: watch::Sender<SchedulerState>,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl DailyScheduler {
    pub fn new(cache: Arc<FreshnessCache>, clock: Arc<dyn Clock>, hour: u32) -> Self {
        let next_fire = next_fire_at(&clock.now(), hour);
        let (state, _) = watch::channel(SchedulerState::Idle { next_fire });
        Self {
            cache,
            clock,
            hour,
            state,
            event_tx: None,
        }
    }

    /// Set the event sender for shell notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Watch the scheduler's state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    async fn fire(&self, catch_up: bool) {
        self.state.send_replace(SchedulerState::Running);
        let articles = self.cache.get_or_refresh().await;
        info!(count = articles.len(), catch_up, "Scheduled refresh finished");
        self.send_event(SchedulerEvent::Refreshed {
            articles: articles.len(),
            catch_up,
        });
    }

    fn arm(&self) -> DateTime<Local> {
        let now = self.clock.now();
        let next_fire = next_fire_at(&now, self.hour);
        let delay = (next_fire - now).to_std().unwrap_or(Duration::ZERO);
        self.state.send_replace(SchedulerState::Idle { next_fire });
        info!(next_fire = %next_fire.to_rfc3339(), delay_secs = delay.as_secs(), "Daily refresh armed");
        self.send_event(SchedulerEvent::Armed { next_fire, delay });
        next_fire
    }

    /// Sleep until `next_fire` by the wall clock. Returns `false` on shutdown.
    async fn wait_until(&self, next_fire: DateTime<Local>, shutdown: &mut watch::Receiver<bool>) -> bool {
        loop {
            let remaining = (next_fire - self.clock.now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            if remaining.is_zero() {
                return true;
            }
            let nap = remaining.min(MAX_NAP);
            debug!(nap_secs = nap.as_secs(), remaining_secs = remaining.as_secs(), "Scheduler napping");

            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        return false;
                    }
                }
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }

    /// Run until the shutdown channel turns `true` (or its sender drops).
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(hour = self.hour, "Daily scheduler started");

        if is_past_target(&self.clock.now(), self.hour) {
            info!("Target hour already passed today; running startup catch-up");
            self.fire(true).await;
        }

        loop {
            let next_fire = self.arm();
            if !self.wait_until(next_fire, &mut shutdown).await {
                info!("Scheduler received shutdown signal");
                break;
            }
            self.fire(false).await;
        }

        info!("Scheduler stopped");
    }
}
