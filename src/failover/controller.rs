//! The polling loop that keeps interface bindings in line with local health.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::address::{AddressError, AddressManager, AddressSet, AnycastAddress, Change, InterfaceBackend};
use crate::config::schema::DaemonConfig;
use crate::failover::state::{ControllerState, LoopState, StatusSnapshot};
use crate::failover::{CycleOutcome, FailoverError};
use crate::health::{run_probe, HealthProbe, HealthState};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Timing and policy knobs for the controller.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
    pub interval: Duration,
    pub probe_timeout: Duration,
    pub retry: RetryPolicy,
    pub grace_period: Duration,
    pub withdraw_on_exit: bool,
}

impl ControllerSettings {
    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            interval: config.probe.interval(),
            probe_timeout: config.probe.timeout(),
            retry: RetryPolicy::from(&config.retry),
            grace_period: config.shutdown.grace_period(),
            withdraw_on_exit: config.shutdown.withdraw_on_exit,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&DaemonConfig::default())
    }
}

/// How the final convergence before exit went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Interface left in a consistent state.
    Clean,
    /// Could not confirm the final state within the grace period.
    Unconfirmed,
}

/// Shutdown as seen from inside a convergence.
///
/// Backoff sleeps end early once it fires, so a retry sequence never holds the
/// process past the point the supervisor asked it to stop.
struct StopSignal<'a> {
    receiver: Option<&'a mut broadcast::Receiver<()>>,
    fired: bool,
}

impl<'a> StopSignal<'a> {
    fn none() -> Self {
        Self {
            receiver: None,
            fired: false,
        }
    }

    fn new(receiver: &'a mut broadcast::Receiver<()>) -> Self {
        Self {
            receiver: Some(receiver),
            fired: false,
        }
    }

    /// Sleep for `delay`. Returns false if shutdown arrived first.
    async fn backoff(&mut self, delay: Duration) -> bool {
        if self.fired {
            return false;
        }
        let interrupted = match self.receiver.as_deref_mut() {
            Some(receiver) => tokio::select! {
                biased;
                _ = receiver.recv() => true,
                _ = time::sleep(delay) => false,
            },
            None => {
                time::sleep(delay).await;
                false
            }
        };
        if interrupted {
            self.fired = true;
        }
        !interrupted
    }
}

#[derive(Debug, Default)]
struct ApplyReport {
    applied: usize,
    unchanged: usize,
    deferred: usize,
}

/// Drives the Address Set toward whatever the health probe reports.
pub struct FailoverController<P, B> {
    probe: P,
    manager: AddressManager<B>,
    addresses: AddressSet,
    settings: ControllerSettings,
    state: LoopState,
}

impl<P: HealthProbe, B: InterfaceBackend> FailoverController<P, B> {
    pub fn new(probe: P, backend: B, addresses: AddressSet, settings: ControllerSettings) -> Self {
        Self {
            probe,
            manager: AddressManager::new(backend),
            addresses,
            settings,
            state: LoopState::new(),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state.state
    }

    /// Health the interface last fully reflected.
    pub fn health(&self) -> HealthState {
        self.state.last_converged
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.state.snapshot()
    }

    pub fn manager(&self) -> &AddressManager<B> {
        &self.manager
    }

    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }

    /// Run the probe once under the configured deadline.
    pub async fn probe(&mut self) -> HealthState {
        let result = run_probe(&self.probe, self.settings.probe_timeout).await;
        let observed = HealthState::from_probe(result.success);
        debug!(
            observed = %observed,
            elapsed_ms = result.elapsed.as_millis() as u64,
            detail = result.detail.as_deref().unwrap_or(""),
            "Probe complete"
        );
        self.state.last_probe = Some(result);
        observed
    }

    /// One full cycle: probe, then converge.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, FailoverError> {
        let observed = self.probe().await;
        self.converge_toward(observed).await
    }

    /// Converge toward `observed`, giving an unfinished earlier target one
    /// extra cycle first.
    pub async fn converge_toward(&mut self, observed: HealthState) -> Result<CycleOutcome, FailoverError> {
        let mut stop = StopSignal::none();
        self.converge_toward_with(observed, &mut stop).await
    }

    /// Apply `target` to every address in the set.
    pub async fn converge(&mut self, target: HealthState) -> Result<CycleOutcome, FailoverError> {
        let mut stop = StopSignal::none();
        self.converge_with(target, &mut stop).await
    }

    async fn converge_toward_with(
        &mut self,
        observed: HealthState,
        stop: &mut StopSignal<'_>,
    ) -> Result<CycleOutcome, FailoverError> {
        self.state.cycles += 1;

        let target = match self.state.state.pending() {
            Some(pending) if pending == observed => observed,
            Some(HealthState::Healthy) => {
                // Never keep announcing for a service that just failed.
                warn!(
                    pending = %HealthState::Healthy,
                    observed = %observed,
                    "Abandoning unfinished attach, withdrawing instead"
                );
                observed
            }
            Some(pending) if !self.state.resumed_pending => {
                info!(
                    pending = %pending,
                    observed = %observed,
                    "Finishing pending convergence before acting on new probe result"
                );
                self.state.resumed_pending = true;
                pending
            }
            Some(pending) => {
                warn!(
                    pending = %pending,
                    observed = %observed,
                    "Pending convergence still unfinished, moving to new target"
                );
                observed
            }
            None => observed,
        };

        self.converge_with(target, stop).await
    }

    async fn converge_with(
        &mut self,
        target: HealthState,
        stop: &mut StopSignal<'_>,
    ) -> Result<CycleOutcome, FailoverError> {
        let current = self.state.state;
        if current != ControllerState::Converged(target) {
            if current != ControllerState::Converging(target) {
                self.state.resumed_pending = false;
            }
            self.state.state = ControllerState::Converging(target);
            debug!(target = %target, "Converging anycast addresses");
        }

        let report = self.apply(target, stop).await?;

        if report.deferred > 0 {
            self.state.state = ControllerState::Converging(target);
            warn!(
                target = %target,
                deferred = report.deferred,
                "Convergence incomplete, resuming next cycle"
            );
            return Ok(CycleOutcome::Deferred(target));
        }

        let previous = self.state.last_converged;
        self.state.state = ControllerState::Converged(target);
        self.state.last_converged = target;
        self.state.resumed_pending = false;
        metrics::record_health(target);

        if previous.can_transition_to(target) {
            self.state.transitions += 1;
            info!(
                from = %previous,
                to = %target,
                applied = report.applied,
                unchanged = report.unchanged,
                interface = self.addresses.interface(),
                "Health state transition"
            );
            Ok(CycleOutcome::Converged(target))
        } else {
            if report.applied > 0 {
                info!(
                    state = %target,
                    repaired = report.applied,
                    "Repaired drifted anycast bindings"
                );
            }
            Ok(CycleOutcome::Unchanged(target))
        }
    }

    /// Run until shutdown or a fatal error, then leave the interface consistent.
    pub async fn run(
        mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<ShutdownOutcome, FailoverError> {
        let cidrs: Vec<String> = self.addresses.iter().map(AnycastAddress::cidr).collect();
        info!(
            interface = self.addresses.interface(),
            addresses = ?cidrs,
            probe = %self.probe.describe(),
            interval_ms = self.settings.interval.as_millis() as u64,
            timeout_ms = self.settings.probe_timeout.as_millis() as u64,
            "Failover controller starting"
        );

        let mut ticker = time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let observed = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Shutdown signal received during probe");
                    break;
                }
                observed = self.probe() => observed,
            };

            // A mutation in flight always completes; only the backoff between
            // retries gives way to shutdown.
            let mut stop = StopSignal::new(&mut shutdown);
            let result = self.converge_toward_with(observed, &mut stop).await;
            let stopping = stop.fired;
            result?;
            if stopping {
                info!("Shutdown signal received during convergence");
                break;
            }
        }

        Ok(self.shutdown_converge().await)
    }

    /// Final convergence after a shutdown request, bounded by the grace period.
    ///
    /// Withdraws the whole set when `withdraw_on_exit` is set, since nothing
    /// validates health once the process is gone. Otherwise restores the last
    /// converged state.
    pub async fn shutdown_converge(&mut self) -> ShutdownOutcome {
        let target = if self.settings.withdraw_on_exit {
            HealthState::Unhealthy
        } else {
            match self.state.last_converged {
                HealthState::Healthy => HealthState::Healthy,
                _ => HealthState::Unhealthy,
            }
        };

        info!(
            target = %target,
            grace_ms = self.settings.grace_period.as_millis() as u64,
            "Converging before exit"
        );

        let mut stop = StopSignal::none();
        let outcome = match time::timeout(self.settings.grace_period, self.apply(target, &mut stop)).await {
            Ok(Ok(report)) if report.deferred == 0 => {
                self.state.state = ControllerState::Converged(target);
                info!(state = %target, applied = report.applied, "Interface consistent, exiting");
                ShutdownOutcome::Clean
            }
            Ok(Ok(report)) => {
                warn!(deferred = report.deferred, "Could not finish final convergence");
                ShutdownOutcome::Unconfirmed
            }
            Ok(Err(e)) => {
                error!(error = %e, "Final convergence failed");
                ShutdownOutcome::Unconfirmed
            }
            Err(_) => {
                warn!("Grace period elapsed before final convergence was confirmed");
                ShutdownOutcome::Unconfirmed
            }
        };

        match serde_json::to_string(&self.snapshot()) {
            Ok(json) => debug!(snapshot = %json, "Final controller state"),
            Err(e) => debug!(error = %e, "Could not serialize final controller state"),
        }
        outcome
    }

    async fn apply(&self, target: HealthState, stop: &mut StopSignal<'_>) -> Result<ApplyReport, FailoverError> {
        let mut report = ApplyReport::default();

        for address in self.addresses.iter() {
            match self.mutate(address, target, stop).await {
                Ok(Change::Applied) => report.applied += 1,
                Ok(Change::NoOp) => report.unchanged += 1,
                Err(e) if e.is_fatal() => {
                    metrics::record_convergence_failure(e.kind());
                    error!(
                        address = %address,
                        interface = address.interface(),
                        reason = %e,
                        "Non-retryable address failure, refusing to continue with partial anycast state"
                    );
                    return Err(FailoverError::Fatal {
                        address: address.cidr(),
                        interface: address.interface().to_string(),
                        source: e,
                    });
                }
                Err(e) => {
                    metrics::record_convergence_failure(e.kind());
                    warn!(
                        address = %address,
                        interface = address.interface(),
                        reason = %e,
                        "Retries exhausted, deferring address to next cycle"
                    );
                    report.deferred += 1;
                }
            }
        }

        let bound = match target {
            HealthState::Healthy => report.applied + report.unchanged,
            _ => report.deferred,
        };
        metrics::record_bound(bound);

        Ok(report)
    }

    async fn mutate(
        &self,
        address: &AnycastAddress,
        target: HealthState,
        stop: &mut StopSignal<'_>,
    ) -> Result<Change, AddressError> {
        let retry = self.settings.retry;
        let mut attempt = 1;

        loop {
            let result = match target {
                HealthState::Healthy => self.manager.attach(address).await,
                HealthState::Unhealthy | HealthState::Unknown => self.manager.detach(address).await,
            };

            match result {
                Err(AddressError::Transient(reason)) if retry.should_retry(attempt) => {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        address = %address,
                        attempt,
                        max_attempts = retry.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Transient address failure, retrying"
                    );
                    if !stop.backoff(delay).await {
                        debug!(address = %address, attempt, "Retry abandoned for shutdown");
                        return Err(AddressError::Transient(reason));
                    }
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
