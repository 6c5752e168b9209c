//! Periodic weather polling with category change detection.
//!
//! A [`WeatherPoller`] owns one [`PollerState`]. Each tick fetches the
//! current conditions, parses them into a new [`WeatherRecord`] and, when the
//! category differs from the last one seen, invokes every subscribed
//! [`ChangeNotifier`]. At most one fetch is outstanding at a time; a tick that
//! arrives while a fetch is running is dropped.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use parking_lot::{Mutex, RwLock};
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    config::PollerConfig,
    error::WeatherError,
    model::WeatherRecord,
    notifier::ChangeNotifier,
    parser,
    provider::{OpenWeatherSource, WeatherSource},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerStatus {
    /// Not started, or stopped.
    Idle,
    /// Waiting for the next tick.
    Scheduled,
    /// A fetch is outstanding.
    Fetching,
    /// The last fetch failed; the next tick retries.
    Failed,
}

/// Result of a single [`WeatherPoller::check_weather`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The category differs from the previous one and notifiers were invoked.
    Changed { previous: String, current: String },
    Unchanged,
    /// Another fetch was already outstanding; nothing was done.
    Skipped,
}

/// What the poller remembers between ticks. Lives only in memory.
#[derive(Debug, Clone, Default)]
pub struct PollerState {
    last_category: String,
    current: Option<Arc<WeatherRecord>>,
}

impl PollerState {
    /// Empty until the first successful fetch.
    pub fn last_category(&self) -> &str {
        &self.last_category
    }

    pub fn current(&self) -> Option<&Arc<WeatherRecord>> {
        self.current.as_ref()
    }

    /// Replace the snapshot. Returns the previous category if it changed.
    fn apply(&mut self, record: Arc<WeatherRecord>) -> Option<String> {
        let changed = record.category() != self.last_category;
        let previous = changed
            .then(|| std::mem::replace(&mut self.last_category, record.category().to_string()));

        self.current = Some(record);
        previous
    }
}

struct Shared {
    config: PollerConfig,
    source: Arc<dyn WeatherSource>,
    state: RwLock<PollerState>,
    status: Mutex<PollerStatus>,
    in_flight: AtomicBool,
    /// Set while a schedule started by [`WeatherPoller::start`] is running.
    armed: AtomicBool,
    notifiers: RwLock<Vec<Arc<dyn ChangeNotifier>>>,
}

/// Cloneable handle to a poller; clones share state.
#[derive(Clone)]
pub struct WeatherPoller {
    shared: Arc<Shared>,
}

impl fmt::Debug for WeatherPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherPoller")
            .field("refresh_minutes", &self.shared.config.refresh_minutes)
            .field("source", &self.shared.source)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl WeatherPoller {
    /// Create a poller over an arbitrary source. The config is validated first.
    pub fn new(config: PollerConfig, source: Arc<dyn WeatherSource>) -> Self {
        let (config, _) = config.validate();
        Self::with_validated(config, source)
    }

    /// Validate the config and poll OpenWeatherMap with it.
    pub fn from_config(config: PollerConfig) -> Result<Self, WeatherError> {
        let (config, _) = config.validate();
        let source = OpenWeatherSource::new(&config)?;
        Ok(Self::with_validated(config, Arc::new(source)))
    }

    fn with_validated(config: PollerConfig, source: Arc<dyn WeatherSource>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                source,
                state: RwLock::new(PollerState::default()),
                status: Mutex::new(PollerStatus::Idle),
                in_flight: AtomicBool::new(false),
                armed: AtomicBool::new(false),
                notifiers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Register an observer. Observers run in registration order.
    pub fn subscribe(&self, notifier: impl ChangeNotifier + 'static) {
        self.shared.notifiers.write().push(Arc::new(notifier));
    }

    /// The effective config, after corrections.
    pub fn config(&self) -> &PollerConfig {
        &self.shared.config
    }

    pub fn status(&self) -> PollerStatus {
        *self.shared.status.lock()
    }

    /// The latest snapshot, or `None` before the first successful fetch.
    pub fn current(&self) -> Option<Arc<WeatherRecord>> {
        self.shared.state.read().current.clone()
    }

    pub fn last_category(&self) -> String {
        self.shared.state.read().last_category.clone()
    }

    /// Copy of the current state; the snapshot itself is shared, not cloned.
    pub fn state(&self) -> PollerState {
        self.shared.state.read().clone()
    }

    /// Arm the schedule and return immediately.
    ///
    /// The first check runs right away, then once per refresh interval until
    /// the returned handle is stopped or dropped.
    pub fn start(&self) -> PollerHandle {
        let period = self.shared.config.refresh_interval().max(Duration::from_millis(1));
        let poller = self.clone();

        self.shared.armed.store(true, Ordering::Release);
        self.set_status(PollerStatus::Scheduled);
        info!(interval_secs = period.as_secs(), "Starting weather poller");

        let task = tokio::spawn(async move {
            let origin = Instant::now();
            let mut ticker = time::interval_at(origin, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                // Failures are logged by check_weather; the next tick retries.
                let _ = poller.check_weather().await;
                // Ticks that fell due during the fetch are dropped, not replayed.
                ticker.reset_at(next_aligned_tick(origin, period, Instant::now()));
            }
        });

        PollerHandle { poller: self.clone(), task: Some(task) }
    }

    /// Fetch, parse and run change detection once.
    ///
    /// On failure the snapshot and last category are left untouched.
    pub async fn check_weather(&self) -> Result<CheckOutcome, WeatherError> {
        let Some(_guard) = FetchGuard::acquire(&self.shared) else {
            debug!("Weather fetch already in progress, dropping tick");
            return Ok(CheckOutcome::Skipped);
        };

        match self.fetch_record().await {
            Ok(record) => {
                let outcome = self.commit(record);
                self.set_status(self.resting_status());
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "Weather check failed, retrying on next tick");
                self.set_status(PollerStatus::Failed);
                Err(e)
            }
        }
    }

    async fn fetch_record(&self) -> Result<WeatherRecord, WeatherError> {
        let timeout = self.shared.config.fetch_timeout();

        let body = time::timeout(timeout, self.shared.source.fetch_current())
            .await
            .map_err(|_| {
                WeatherError::TransportFailure(format!(
                    "fetch timed out after {}s",
                    timeout.as_secs()
                ))
            })??;

        parser::parse(&body)
    }

    fn commit(&self, record: WeatherRecord) -> CheckOutcome {
        let record = Arc::new(record);
        let current = record.category().to_string();
        let previous = self.shared.state.write().apply(record);

        let Some(previous) = previous else {
            debug!(category = %current, "Weather unchanged");
            return CheckOutcome::Unchanged;
        };

        info!(from = %previous, to = %current, "Weather category changed");

        let notifiers = self.shared.notifiers.read().clone();
        for notifier in &notifiers {
            notifier.on_weather_changed(&current);
        }

        CheckOutcome::Changed { previous, current }
    }

    /// Status between fetches: Scheduled only while a timer is armed.
    fn resting_status(&self) -> PollerStatus {
        if self.shared.armed.load(Ordering::Acquire) {
            PollerStatus::Scheduled
        } else {
            PollerStatus::Idle
        }
    }

    fn disarm(&self) {
        self.shared.armed.store(false, Ordering::Release);
        self.set_status(PollerStatus::Idle);
    }

    fn set_status(&self, status: PollerStatus) {
        *self.shared.status.lock() = status;
    }
}

/// First multiple of `period` after `origin` that is strictly later than `now`.
fn next_aligned_tick(origin: Instant, period: Duration, now: Instant) -> Instant {
    let elapsed = now.saturating_duration_since(origin).as_nanos();
    let into_period = u64::try_from(elapsed % period.as_nanos()).unwrap_or(0);
    now + (period - Duration::from_nanos(into_period))
}

/// Marks a fetch as outstanding for as long as it lives.
///
/// If the fetch is cancelled before finishing, the status it replaced is
/// restored.
struct FetchGuard<'a> {
    shared: &'a Shared,
    previous: PollerStatus,
}

impl<'a> FetchGuard<'a> {
    fn acquire(shared: &'a Shared) -> Option<Self> {
        shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        let previous = std::mem::replace(&mut *shared.status.lock(), PollerStatus::Fetching);
        Some(Self { shared, previous })
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut status = self.shared.status.lock();
        if *status == PollerStatus::Fetching {
            *status = self.previous;
        }
        drop(status);

        self.shared.in_flight.store(false, Ordering::Release);
    }
}

/// Keeps the scheduled task alive. Dropping it stops polling.
#[derive(Debug)]
pub struct PollerHandle {
    poller: WeatherPoller,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn poller(&self) -> &WeatherPoller {
        &self.poller
    }

    /// Cancel the timer and any outstanding fetch, then wait for the task to end.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            self.poller.disarm();
            info!("Weather poller stopped");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.poller.disarm();
        }
    }
}
