//! Test helpers and builder patterns for orchestrator tests
//!
//! The fakes here share one `EventLog`, so a test can assert the exact
//! interleaving of render calls, waits and saves.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use render_orchestrator::{
    CancellationFlag, CarouselPersistence, ClientError, OrchestratorConfig, PersistenceError, RawResult, RenderJobOrchestrator,
    RenderServiceClient, Sleeper,
};
use shared::{CarouselRun, SlideSpec};

use super::fixtures::TestFixtures;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    RenderStarted { ordinal: u32 },
    RenderFinished { ordinal: u32 },
    Slept(Duration),
    Saved { entries: usize },
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Ordinals in the order render calls started
    pub fn render_order(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::RenderStarted { ordinal } => Some(ordinal),
                _ => None,
            })
            .collect()
    }

    /// Every wait requested through the sleeper
    pub fn sleeps(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Slept(duration) => Some(duration),
                _ => None,
            })
            .collect()
    }

    /// Total simulated time waited between consecutive render starts
    pub fn waits_between_renders(&self) -> Vec<Duration> {
        let mut waits = Vec::new();
        let mut pending: Option<Duration> = None;
        for event in self.events() {
            match event {
                Event::RenderStarted { .. } => {
                    if let Some(wait) = pending.take() {
                        waits.push(wait);
                    }
                    pending = Some(Duration::ZERO);
                }
                Event::Slept(duration) => {
                    if let Some(wait) = pending.as_mut() {
                        *wait += duration;
                    }
                }
                _ => {}
            }
        }
        waits
    }
}

/// Render service fake answering from a per-slide script.
///
/// Slides without a script, or whose script is used up, render successfully.
pub struct ScriptedRenderer {
    log: EventLog,
    scripts: Mutex<HashMap<u32, VecDeque<Result<RawResult, ClientError>>>>,
    calls: Mutex<HashMap<u32, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Duration,
    cancel_after: Option<(usize, CancellationFlag)>,
}

/// Decrements the in-flight count even when the call is dropped by a timeout
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedRenderer {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            latency: Duration::ZERO,
            cancel_after: None,
        }
    }

    /// Raise `flag` once `calls` render calls have started
    pub fn with_cancel_after(mut self, calls: usize, flag: CancellationFlag) -> Self {
        self.cancel_after = Some((calls, flag));
        self
    }

    /// Simulated render time, spent on the tokio clock
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn script(&self, ordinal: u32, responses: Vec<Result<RawResult, ClientError>>) {
        self.scripts.lock().unwrap().insert(ordinal, responses.into());
    }

    pub fn calls_for(&self, ordinal: u32) -> usize {
        self.calls.lock().unwrap().get(&ordinal).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderServiceClient for ScriptedRenderer {
    async fn render(&self, spec: &SlideSpec) -> Result<RawResult, ClientError> {
        let ordinal = spec.payload["tag"].as_u64().map(|tag| tag as u32).unwrap_or(spec.ordinal);
        self.log.push(Event::RenderStarted { ordinal });
        *self.calls.lock().unwrap().entry(ordinal).or_insert(0) += 1;
        if let Some((calls, flag)) = &self.cancel_after {
            if self.total_calls() >= *calls {
                flag.cancel();
            }
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }

        let response = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&ordinal)
            .and_then(|script| script.pop_front())
            .unwrap_or_else(|| Ok(TestFixtures::rendered(ordinal)));

        self.log.push(Event::RenderFinished { ordinal });
        response
    }
}

/// Records waits into the event log without spending real time
pub struct LoggingSleeper {
    log: EventLog,
}

impl LoggingSleeper {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Sleeper for LoggingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.log.push(Event::Slept(duration));
        tokio::task::yield_now().await;
    }
}

/// Persistence fake that keeps every saved run
pub struct RecordingPersistence {
    log: EventLog,
    saved: Mutex<Vec<CarouselRun>>,
    fail_with: Option<String>,
}

impl RecordingPersistence {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            saved: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    pub fn failing(log: EventLog, message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(log)
        }
    }

    pub fn saved(&self) -> Vec<CarouselRun> {
        self.saved.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl CarouselPersistence for RecordingPersistence {
    async fn save(&self, run: &CarouselRun) -> Result<(), PersistenceError> {
        self.saved.lock().unwrap().push(run.clone());
        self.log.push(Event::Saved {
            entries: run.entries.len(),
        });
        match &self.fail_with {
            Some(message) => Err(PersistenceError::Rejected {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

pub type TestOrchestrator =
    RenderJobOrchestrator<Arc<ScriptedRenderer>, Arc<RecordingPersistence>, LoggingSleeper>;

/// An orchestrator wired to fakes, plus handles to inspect them
pub struct TestHarness {
    pub orchestrator: TestOrchestrator,
    pub renderer: Arc<ScriptedRenderer>,
    pub persistence: Arc<RecordingPersistence>,
    pub log: EventLog,
}

/// Builder pattern for creating test orchestrators with sensible defaults
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    log: EventLog,
    latency: Duration,
    persistence_failure: Option<String>,
    scripts: Vec<(u32, Vec<Result<RawResult, ClientError>>)>,
    cancel_after: Option<(usize, CancellationFlag)>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: TestFixtures::config(),
            log: EventLog::new(),
            latency: Duration::ZERO,
            persistence_failure: None,
            scripts: Vec::new(),
            cancel_after: None,
        }
    }

    pub fn with_config<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut OrchestratorConfig),
    {
        setup(&mut self.config);
        self
    }

    pub fn with_script(mut self, ordinal: u32, responses: Vec<Result<RawResult, ClientError>>) -> Self {
        self.scripts.push((ordinal, responses));
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_cancel_after(mut self, calls: usize, flag: &CancellationFlag) -> Self {
        self.cancel_after = Some((calls, flag.clone()));
        self
    }

    pub fn with_failing_persistence(mut self, message: &str) -> Self {
        self.persistence_failure = Some(message.to_string());
        self
    }

    pub fn build(self) -> TestHarness {
        let mut renderer = ScriptedRenderer::new(self.log.clone()).with_latency(self.latency);
        if let Some((calls, flag)) = self.cancel_after {
            renderer = renderer.with_cancel_after(calls, flag);
        }
        let renderer = Arc::new(renderer);
        for (ordinal, responses) in self.scripts {
            renderer.script(ordinal, responses);
        }

        let persistence = Arc::new(match self.persistence_failure {
            Some(message) => RecordingPersistence::failing(self.log.clone(), &message),
            None => RecordingPersistence::new(self.log.clone()),
        });

        let orchestrator = RenderJobOrchestrator::new(
            &self.config,
            Arc::clone(&renderer),
            Arc::clone(&persistence),
            Arc::new(LoggingSleeper::new(self.log.clone())),
        )
        .expect("valid test configuration");

        TestHarness {
            orchestrator,
            renderer,
            persistence,
            log: self.log,
        }
    }
}
