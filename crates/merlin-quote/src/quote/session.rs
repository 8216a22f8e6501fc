//! Per-session fingerprint cache controller.
//!
//! Each session remembers the most recently observed fingerprint, at most one committed
//! record and at most one in-flight calculation per fingerprint. A request for a fingerprint
//! that is already being calculated waits on that calculation instead of starting another;
//! a result whose fingerprint is no longer the latest is dropped and its callers receive
//! [`QuoteError::Superseded`].

use super::domain::FacilityInput;
use super::engine::QuoteEngine;
use super::error::QuoteError;
use super::fingerprint::Fingerprint;
use super::pricing::PricingProvider;
use super::validator::QuoteRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

type Outcome = Option<Result<Arc<QuoteRecord>, QuoteError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    InFlight,
    Rejected,
}

struct InFlight {
    id: u64,
    receiver: watch::Receiver<Outcome>,
}

impl InFlight {
    /// False once the calculating caller dropped its sender without settling.
    fn is_live(&self) -> bool {
        self.receiver.has_changed().is_ok()
    }
}

struct SessionState {
    latest: Option<Fingerprint>,
    committed: Option<(Fingerprint, Arc<QuoteRecord>)>,
    in_flight: HashMap<Fingerprint, InFlight>,
    phase: SessionPhase,
}

enum Next {
    Cached(Arc<QuoteRecord>),
    Await(watch::Receiver<Outcome>),
    Compute(u64, watch::Sender<Outcome>),
}

pub struct QuoteSession<P> {
    engine: Arc<QuoteEngine<P>>,
    state: Mutex<SessionState>,
    flights: AtomicU64,
    calculations: AtomicUsize,
}

impl<P> QuoteSession<P>
where
    P: PricingProvider + 'static,
{
    pub fn new(engine: Arc<QuoteEngine<P>>) -> Self {
        Self {
            engine,
            state: Mutex::new(SessionState {
                latest: None,
                committed: None,
                in_flight: HashMap::new(),
                phase: SessionPhase::Idle,
            }),
            flights: AtomicU64::new(0),
            calculations: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // State updates are single assignments, so a poisoned guard is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Normalize, fingerprint and either serve, join or start the calculation.
    pub async fn submit(
        &self,
        industry: &str,
        input: &FacilityInput,
    ) -> Result<Arc<QuoteRecord>, QuoteError> {
        let canonical = self.engine.normalize(industry, input)?;
        let fingerprint = Fingerprint::of(&canonical);
        debug!(fingerprint = %fingerprint.short(), industry, "fingerprinting");

        loop {
            let next = {
                let mut state = self.lock();
                state.latest = Some(fingerprint.clone());
                self.plan(&mut state, &fingerprint)
            };

            match next {
                Next::Cached(record) => {
                    debug!(fingerprint = %fingerprint.short(), "cached");
                    return Ok(record);
                }
                Next::Await(mut receiver) => {
                    debug!(fingerprint = %fingerprint.short(), "joining in-flight calculation");
                    let outcome = receiver
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|outcome| (*outcome).clone());
                    if let Some(outcome) = outcome {
                        return outcome;
                    }
                    // The calculating caller went away before settling; take over.
                }
                Next::Compute(id, sender) => {
                    debug!(fingerprint = %fingerprint.short(), "in flight");
                    self.calculations.fetch_add(1, Ordering::SeqCst);
                    let result = self.engine.quote(&canonical, &fingerprint).await.map(Arc::new);
                    let settled = self.settle(id, &fingerprint, result);
                    sender.send_replace(Some(settled.clone()));
                    return settled;
                }
            }
        }
    }

    fn plan(&self, state: &mut SessionState, fingerprint: &Fingerprint) -> Next {
        if let Some((committed, record)) = &state.committed {
            if committed == fingerprint {
                return Next::Cached(Arc::clone(record));
            }
        }

        state.in_flight.retain(|_, flight| flight.is_live());
        if let Some(flight) = state.in_flight.get(fingerprint) {
            return Next::Await(flight.receiver.clone());
        }

        let id = self.flights.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = watch::channel(None);
        state
            .in_flight
            .insert(fingerprint.clone(), InFlight { id, receiver });
        state.phase = SessionPhase::InFlight;
        Next::Compute(id, sender)
    }

    fn settle(
        &self,
        id: u64,
        fingerprint: &Fingerprint,
        result: Result<Arc<QuoteRecord>, QuoteError>,
    ) -> Result<Arc<QuoteRecord>, QuoteError> {
        let mut state = self.lock();
        let owned = state
            .in_flight
            .get(fingerprint)
            .is_some_and(|flight| flight.id == id);
        if owned {
            state.in_flight.remove(fingerprint);
        }

        if !owned || state.latest.as_ref() != Some(fingerprint) {
            warn!(
                fingerprint = %fingerprint.short(),
                "dropping result for superseded input"
            );
            return Err(QuoteError::Superseded {
                fingerprint: fingerprint.to_string(),
            });
        }

        match result {
            Ok(record) => {
                state.committed = Some((fingerprint.clone(), Arc::clone(&record)));
                state.phase = SessionPhase::Idle;
                debug!(fingerprint = %fingerprint.short(), quote_id = %record.quote_id, "committed");
                Ok(record)
            }
            Err(QuoteError::Validation(failure)) => {
                state.committed = None;
                state.phase = SessionPhase::Rejected;
                warn!(
                    fingerprint = %fingerprint.short(),
                    violations = failure.violations.len(),
                    "quote rejected"
                );
                Err(QuoteError::Validation(failure))
            }
            Err(other) => {
                state.phase = SessionPhase::Idle;
                Err(other)
            }
        }
    }

    /// The committed record, if it belongs to the most recently submitted input.
    pub fn current(&self) -> Option<Arc<QuoteRecord>> {
        let state = self.lock();
        match (&state.committed, &state.latest) {
            (Some((committed, record)), Some(latest)) if committed == latest => {
                Some(Arc::clone(record))
            }
            _ => None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    /// Number of calculations this session actually ran (cache hits and joins excluded).
    pub fn calculations(&self) -> usize {
        self.calculations.load(Ordering::SeqCst)
    }
}

/// Bounds on the session store: sessions idle longer than `idle_timeout` are dropped, and
/// opening a session beyond `capacity` evicts the least recently used one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub capacity: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

struct SessionSlot<P> {
    session: Arc<QuoteSession<P>>,
    last_used: Instant,
}

/// Isolated sessions keyed by an opaque session id, sharing one engine.
pub struct QuoteSessions<P> {
    engine: Arc<QuoteEngine<P>>,
    limits: SessionLimits,
    sessions: Mutex<HashMap<String, SessionSlot<P>>>,
}

impl<P> QuoteSessions<P>
where
    P: PricingProvider + 'static,
{
    pub fn new(engine: Arc<QuoteEngine<P>>) -> Self {
        Self::with_limits(engine, SessionLimits::default())
    }

    pub fn with_limits(engine: Arc<QuoteEngine<P>>, limits: SessionLimits) -> Self {
        Self {
            engine,
            limits: SessionLimits {
                capacity: limits.capacity.max(1),
                ..limits
            },
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<QuoteEngine<P>> {
        &self.engine
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, SessionSlot<P>>> {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let idle_timeout = self.limits.idle_timeout;
        let before = sessions.len();
        sessions.retain(|_, slot| slot.last_used.elapsed() < idle_timeout);
        if sessions.len() < before {
            debug!(expired = before - sessions.len(), "idle quote sessions dropped");
        }
        sessions
    }

    /// Session for `id`, created on first use.
    pub fn session(&self, id: &str) -> Arc<QuoteSession<P>> {
        let mut sessions = self.sessions();
        let now = Instant::now();

        if let Some(slot) = sessions.get_mut(id) {
            slot.last_used = now;
            return Arc::clone(&slot.session);
        }

        while sessions.len() >= self.limits.capacity {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            info!(session = %oldest, "quote session evicted");
        }

        info!(session = id, "quote session opened");
        let session = Arc::new(QuoteSession::new(Arc::clone(&self.engine)));
        sessions.insert(
            id.to_string(),
            SessionSlot {
                session: Arc::clone(&session),
                last_used: now,
            },
        );
        session
    }

    pub fn get(&self, id: &str) -> Option<Arc<QuoteSession<P>>> {
        let mut sessions = self.sessions();
        let slot = sessions.get_mut(id)?;
        slot.last_used = Instant::now();
        Some(Arc::clone(&slot.session))
    }

    pub fn remove(&self, id: &str) -> Option<Arc<QuoteSession<P>>> {
        let removed = self.sessions().remove(id).map(|slot| slot.session);
        if removed.is_some() {
            info!(session = id, "quote session closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }
}
