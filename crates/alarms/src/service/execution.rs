use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use upkeep_core::{Machine, RunError, RunOutcome, RunResult, RunTrigger};

use crate::accumulator::Accumulation;

use super::MaintenanceCronService;

/// Reason attached to [`RunOutcome::Skipped`].
const ALREADY_RUNNING: &str = "a maintenance pass is already running";

/// Placeholder machine id for failures that are not tied to one machine.
const ALL_MACHINES: &str = "*";

/// Raises the running flag for as long as it lives, including when the
/// pass future is dropped by its caller.
struct RunningFlag<'a>(&'a AtomicBool);

impl<'a> RunningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What one worker did for one machine.
#[derive(Debug, Default)]
struct MachineReport {
    alarms_evaluated: usize,
    alarms_triggered: usize,
    errors: Vec<RunError>,
    notification_failures: Vec<RunError>,
    skipped: Vec<RunError>,
}

impl MachineReport {
    fn merge_into(self, result: &mut RunResult) {
        result.machines_processed += 1;
        result.alarms_evaluated += self.alarms_evaluated;
        result.alarms_triggered += self.alarms_triggered;
        result.errors.extend(self.errors);
        result.notification_failures.extend(self.notification_failures);
        result.skipped.extend(self.skipped);
    }
}

impl MaintenanceCronService {
    /// Run one pass now on behalf of an operator.
    pub async fn trigger(&self) -> RunOutcome {
        self.execute(RunTrigger::Manual).await
    }

    /// Run one pass unless another one holds the run-lock.
    ///
    /// Never waits for a running pass: a held lock yields
    /// [`RunOutcome::Skipped`] immediately.
    pub async fn execute(&self, trigger: RunTrigger) -> RunOutcome {
        let Ok(_guard) = self.run_lock.try_lock() else {
            info!(?trigger, "maintenance pass skipped: already running");
            self.stats
                .write()
                .expect("run stats lock poisoned")
                .record_skip();
            return RunOutcome::Skipped {
                reason: ALREADY_RUNNING.to_string(),
            };
        };

        let _running = RunningFlag::raise(&self.running);
        // Only stop requests made after this point cut the pass short.
        let generation = self.stop_generation.load(Ordering::SeqCst);

        let started = Instant::now();
        let now = self.clock.now();
        let mut result = RunResult::begin(trigger, now);
        info!(run_id = %result.run_id, ?trigger, "maintenance pass started");

        let deadline = self.config.pass_deadline;
        if tokio::time::timeout(deadline, self.run_pass(&mut result, now, generation))
            .await
            .is_err()
        {
            result.deadline_exceeded = true;
            error!(
                run_id = %result.run_id,
                deadline_secs = deadline.as_secs_f64(),
                machines_processed = result.machines_processed,
                "maintenance pass exceeded its deadline, abandoning remaining machines"
            );
        }

        result.finish(self.clock.now(), started.elapsed().as_millis() as u64);
        self.stats
            .write()
            .expect("run stats lock poisoned")
            .record_run(&result);

        let outcome = RunOutcome::from_result(result);
        if let Some(r) = outcome.result() {
            info!(
                run_id = %r.run_id,
                outcome = outcome.label(),
                machines_processed = r.machines_processed,
                alarms_evaluated = r.alarms_evaluated,
                alarms_triggered = r.alarms_triggered,
                errors = r.errors.len(),
                notification_failures = r.notification_failures.len(),
                skipped = r.skipped.len(),
                stopped_early = r.stopped_early,
                duration_ms = r.duration_ms,
                "maintenance pass finished"
            );
        }
        outcome
    }

    /// Walk every machine, folding per-machine reports into `result` as
    /// they complete so a deadline keeps whatever already finished.
    async fn run_pass(&self, result: &mut RunResult, now: DateTime<Utc>, generation: u64) {
        let machines = match self.repository.list_active_machines_with_active_alarms().await {
            Ok(machines) => machines,
            Err(e) => {
                warn!(run_id = %result.run_id, error = %e, "failed to list machines");
                result
                    .errors
                    .push(RunError::machine(ALL_MACHINES, e.to_string()));
                return;
            }
        };

        // One worker per machine: drop duplicates a repository might return.
        let mut seen = HashSet::new();
        let machines: Vec<Machine> = machines
            .into_iter()
            .filter(|m| seen.insert(m.id.clone()))
            .collect();
        let total = machines.len();
        debug!(run_id = %result.run_id, machines = total, "machines loaded");

        let mut reports = stream::iter(machines)
            .take_while(|_| {
                futures::future::ready(self.stop_generation.load(Ordering::SeqCst) == generation)
            })
            .map(|machine| self.process_machine(machine, now))
            .buffer_unordered(self.config.max_concurrent_machines.max(1));

        while let Some(report) = reports.next().await {
            report.merge_into(result);
        }

        if result.machines_processed < total {
            result.stopped_early = true;
            info!(
                run_id = %result.run_id,
                processed = result.machines_processed,
                remaining = total - result.machines_processed,
                "stop requested, remaining machines left for the next pass"
            );
        }
    }

    /// Accumulate, persist, evaluate and dispatch every active alarm of one
    /// machine. Evaluation sees the alarm as the repository stored it, not the
    /// listing snapshot. A repository or audit failure ends this machine's
    /// work and leaves the failed alarm's stored state as it was.
    async fn process_machine(&self, machine: Machine, now: DateTime<Utc>) -> MachineReport {
        let mut report = MachineReport::default();

        if let Err(e) = machine.usage_schedule.validate() {
            warn!(machine_id = %machine.id, error = %e, "skipping machine with invalid usage schedule");
            report.skipped.push(RunError::machine(&machine.id, e.to_string()));
            return report;
        }

        for alarm in machine.active_alarms() {
            if let Err(e) = alarm.validate() {
                warn!(machine_id = %machine.id, alarm_id = %alarm.id, error = %e, "skipping invalid alarm");
                report
                    .skipped
                    .push(RunError::alarm(&machine.id, &alarm.id, e.to_string()));
                continue;
            }

            let mut alarm = alarm.clone();
            let accumulation = self
                .accumulator
                .accumulate(&machine.usage_schedule, &alarm, now);
            if let Accumulation::Advanced {
                additional_hours,
                checkpoint,
            } = accumulation
            {
                alarm = match self
                    .repository
                    .update_alarm_accumulation(
                        &machine.id,
                        &alarm.id,
                        additional_hours,
                        alarm.last_accumulation_checkpoint,
                        checkpoint,
                    )
                    .await
                {
                    Ok(stored) => stored,
                    Err(e) => {
                        warn!(machine_id = %machine.id, alarm_id = %alarm.id, error = %e, "failed to store accumulation");
                        report
                            .errors
                            .push(RunError::alarm(&machine.id, &alarm.id, e.to_string()));
                        return report;
                    }
                };
                debug!(
                    machine_id = %machine.id,
                    alarm_id = %alarm.id,
                    additional_hours,
                    accumulated_hours = alarm.accumulated_hours,
                    "usage accumulated"
                );
            }

            report.alarms_evaluated += 1;
            let evaluation = self.evaluator.evaluate(&alarm);
            if !evaluation.crossed {
                debug!(machine_id = %machine.id, alarm_id = %alarm.id, status = ?evaluation.status, "alarm not due");
                continue;
            }

            match self.dispatcher.dispatch(&machine, &alarm, now).await {
                Ok(dispatched) => {
                    report.alarms_triggered += 1;
                    if let Some(message) = dispatched.notification_error {
                        report
                            .notification_failures
                            .push(RunError::alarm(&machine.id, &alarm.id, message));
                    }
                }
                Err(e) => {
                    warn!(machine_id = %machine.id, alarm_id = %alarm.id, error = %e, "failed to dispatch alarm");
                    report
                        .errors
                        .push(RunError::alarm(&machine.id, &alarm.id, e.to_string()));
                    return report;
                }
            }
        }

        report
    }
}
