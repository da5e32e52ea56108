use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use upkeep_core::RunTrigger;

use crate::error::AlarmError;
use crate::schedule::CronSchedule;

use super::MaintenanceCronService;

/// Result of [`MaintenanceCronService::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    /// The timer was already armed; nothing changed.
    AlreadyRunning,
}

/// The armed periodic timer.
pub(crate) struct TimerHandle {
    pub(crate) schedule: CronSchedule,
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl MaintenanceCronService {
    /// Arm the periodic timer. Calling it while armed is a no-op.
    ///
    /// A malformed cron expression is returned as an error and leaves the
    /// service stopped. Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<StartOutcome, AlarmError> {
        let mut timer = self.timer.lock().expect("timer lock poisoned");
        if timer.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            debug!("maintenance schedule already armed");
            return Ok(StartOutcome::AlreadyRunning);
        }

        let schedule =
            CronSchedule::with_timezone(&self.config.schedule, self.accumulator.timezone())?;
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(Self::run_timer(
            Arc::downgrade(self),
            schedule.clone(),
            Arc::clone(&shutdown),
        ));

        info!(
            schedule = %schedule.expression(),
            timezone = %schedule.timezone().name(),
            next_run_at = ?schedule.next_after(self.clock.now()),
            "maintenance schedule armed"
        );
        *timer = Some(TimerHandle {
            schedule,
            shutdown,
            handle,
        });
        Ok(StartOutcome::Started)
    }

    /// Disarm the timer and wait for any in-flight pass to finish.
    ///
    /// The running pass completes the machines it already started and then
    /// returns; its result is recorded before this call returns. Returns
    /// whether a timer was armed. Safe to call repeatedly.
    pub async fn stop(&self) -> bool {
        self.stop_generation.fetch_add(1, Ordering::SeqCst);
        let timer = self.timer.lock().expect("timer lock poisoned").take();
        if let Some(t) = &timer {
            t.shutdown.notify_one();
        }

        // Acquiring the run-lock means no pass is in flight.
        drop(self.run_lock.lock().await);

        let was_armed = timer.is_some();
        if let Some(t) = timer {
            if let Err(e) = t.handle.await {
                warn!(error = %e, "maintenance timer task ended abnormally");
            }
        }

        info!(was_armed, "maintenance schedule stopped");
        was_armed
    }

    /// Schedule currently driving the timer, if armed.
    pub(super) fn armed_schedule(&self) -> Option<CronSchedule> {
        self.timer
            .lock()
            .expect("timer lock poisoned")
            .as_ref()
            .filter(|t| !t.handle.is_finished())
            .map(|t| t.schedule.clone())
    }

    /// Sleep until each fire time and run a scheduled pass.
    ///
    /// Holds only a weak reference between fires so dropping the service
    /// ends the loop.
    async fn run_timer(service: Weak<Self>, schedule: CronSchedule, shutdown: Arc<Notify>) {
        let mut last_fire: Option<DateTime<Utc>> = None;

        loop {
            let (wait, generation) = {
                let Some(svc) = service.upgrade() else { break };
                let generation = svc.stop_generation.load(Ordering::SeqCst);
                let now = svc.clock.now();
                // Never fire twice for the same slot, even if the clock lags.
                let reference = last_fire.map_or(now, |fired| fired.max(now));
                let Some(next) = schedule.next_after(reference) else {
                    warn!(schedule = %schedule.expression(), "cron schedule has no further fire times");
                    break;
                };
                last_fire = Some(next);
                ((next - now).to_std().unwrap_or_default(), generation)
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.notified() => break,
            }

            let Some(svc) = service.upgrade() else { break };
            if svc.stop_generation.load(Ordering::SeqCst) != generation {
                break;
            }
            let outcome = svc.execute(RunTrigger::Scheduled).await;
            debug!(outcome = outcome.label(), "scheduled maintenance pass returned");
        }

        debug!("maintenance timer exited");
    }
}
