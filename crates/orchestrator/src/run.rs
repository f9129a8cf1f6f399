use futures::stream::{FuturesUnordered, StreamExt};
use order_batch_ratelimit::{DispatchGate, Pace, Pacer};
use order_batch_types::{
    DraftOrder, ItemOutcome, RunOutcome, RunReport, RunStatus, SubmissionMode, SubmissionPolicy,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::executor::{Attempt, SubmissionExecutor};
use crate::progress::ProgressPublisher;

/// Everything a single run needs, fixed when the run starts
pub struct RunPlan {
    /// Valid orders captured at start, in store order
    pub snapshot: Vec<DraftOrder>,
    pub policy: SubmissionPolicy,
    /// Fan-out bound for parallel mode
    pub max_in_flight: u32,
}

/// Drive one run to a terminal status.
///
/// All progress mutation happens here, on the calling task. The terminal
/// status is applied to the publisher but not published; the caller does
/// that once the outcomes are stored.
pub async fn execute(
    plan: RunPlan,
    executor: &SubmissionExecutor,
    cancel: &CancellationToken,
    publisher: &mut ProgressPublisher,
) -> RunReport {
    let mut ledger = RunLedger::new(plan.snapshot.len(), publisher);

    let status = match plan.policy.mode {
        SubmissionMode::Sequential => {
            run_sequential(&plan.snapshot, &plan.policy, executor, cancel, &mut ledger).await
        }
        SubmissionMode::Parallel => {
            run_parallel(
                &plan.snapshot,
                &plan.policy,
                plan.max_in_flight,
                executor,
                cancel,
                &mut ledger,
            )
            .await
        }
    };

    ledger.into_report(plan.snapshot, status)
}

async fn run_sequential(
    snapshot: &[DraftOrder],
    policy: &SubmissionPolicy,
    executor: &SubmissionExecutor,
    cancel: &CancellationToken,
    ledger: &mut RunLedger<'_>,
) -> RunStatus {
    let pacer = policy.pacing_delay().map(Pacer::new);
    let last = snapshot.len().saturating_sub(1);

    for (index, order) in snapshot.iter().enumerate() {
        if cancel.is_cancelled() {
            debug!(next = index, "Cancellation observed between items");
            return RunStatus::Cancelled;
        }

        let attempt = executor.attempt(index, order.clone()).await;
        let cancelled = cancel.is_cancelled();
        ledger.record(attempt);

        if cancelled {
            return RunStatus::Cancelled;
        }
        if policy.should_abort(ledger.failed()) {
            info!(failed = ledger.failed(), "Failure threshold exceeded, aborting run");
            return RunStatus::Aborted;
        }

        if index < last {
            if let Some(pacer) = &pacer {
                if pacer.wait(cancel).await == Pace::Cancelled {
                    debug!(next = index + 1, "Cancellation observed during delay");
                    return RunStatus::Cancelled;
                }
            }
        }
    }

    RunStatus::Completed
}

async fn run_parallel(
    snapshot: &[DraftOrder],
    policy: &SubmissionPolicy,
    max_in_flight: u32,
    executor: &SubmissionExecutor,
    cancel: &CancellationToken,
    ledger: &mut RunLedger<'_>,
) -> RunStatus {
    let gate = DispatchGate::new(max_in_flight);
    let mut pending = snapshot.iter().enumerate().peekable();
    let mut in_flight = FuturesUnordered::new();
    let mut cancelled = cancel.is_cancelled();
    let mut aborted = false;

    loop {
        while !cancelled && !aborted && pending.peek().is_some() {
            let Ok(permit) = gate.try_admit() else {
                break;
            };
            let Some((index, order)) = pending.next() else {
                break;
            };

            let executor = executor.clone();
            let order = order.clone();
            in_flight.push(async move {
                let _permit = permit;
                executor.attempt(index, order).await
            });
        }

        if in_flight.is_empty() {
            break;
        }

        tokio::select! {
            biased;

            _ = cancel.cancelled(), if !cancelled => {
                cancelled = true;
                gate.close();
                debug!(in_flight = in_flight.len(), "Cancellation observed, draining in-flight submissions");
            }

            Some(attempt) = in_flight.next() => {
                // Cancellation requested before this outcome counts
                if !cancelled && cancel.is_cancelled() {
                    cancelled = true;
                    gate.close();
                }

                ledger.record(attempt);

                if !cancelled && !aborted && policy.should_abort(ledger.failed()) {
                    aborted = true;
                    gate.close();
                    info!(
                        failed = ledger.failed(),
                        in_flight = in_flight.len(),
                        "Failure threshold exceeded, draining in-flight submissions"
                    );
                }
            }

            else => break,
        }
    }

    if cancelled {
        RunStatus::Cancelled
    } else if aborted {
        RunStatus::Aborted
    } else {
        RunStatus::Completed
    }
}

/// Per-item results of a run, indexed by snapshot position
struct RunLedger<'a> {
    publisher: &'a mut ProgressPublisher,
    slots: Vec<Option<Attempt>>,
    failed: u32,
}

impl<'a> RunLedger<'a> {
    fn new(size: usize, publisher: &'a mut ProgressPublisher) -> Self {
        Self {
            publisher,
            slots: vec![None; size],
            failed: 0,
        }
    }

    fn record(&mut self, attempt: Attempt) {
        self.publisher.record(&attempt);
        if !attempt.is_success() {
            self.failed += 1;
        }

        let index = attempt.index;
        self.slots[index] = Some(attempt);
    }

    fn failed(&self) -> u32 {
        self.failed
    }

    fn into_report(self, snapshot: Vec<DraftOrder>, status: RunStatus) -> RunReport {
        self.publisher.finish(status);

        let outcomes = snapshot
            .into_iter()
            .zip(self.slots)
            .map(|(order, slot)| match slot {
                Some(attempt) => ItemOutcome {
                    order_id: order.id,
                    revision: order.revision,
                    symbol: order.fields.symbol,
                    outcome: attempt.outcome(),
                    receipt: attempt.result.ok(),
                },
                None => ItemOutcome {
                    order_id: order.id,
                    revision: order.revision,
                    symbol: order.fields.symbol,
                    outcome: RunOutcome::NotAttempted,
                    receipt: None,
                },
            })
            .collect();

        RunReport {
            progress: self.publisher.progress().clone(),
            outcomes,
        }
    }
}
