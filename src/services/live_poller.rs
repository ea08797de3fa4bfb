use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::AppError;

use super::{
    live_chart_service::{LiveCandle, LiveChartService},
    market_data::ChartInterval,
    market_hours::{MarketClock, MarketSession},
};

/// Anything that can produce the newest bar for a symbol.
pub trait CandleSource: Send + Sync + 'static {
    fn fetch_latest(&self, symbol: &str) -> impl Future<Output = Result<LiveCandle, AppError>> + Send;
}

impl CandleSource for LiveChartService {
    fn fetch_latest(&self, symbol: &str) -> impl Future<Output = Result<LiveCandle, AppError>> + Send {
        self.latest(symbol, ChartInterval::OneMin)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PollUpdate {
    #[serde(flatten)]
    pub live: LiveCandle,
    pub session: MarketSession,
    pub next_poll_secs: u64,
}

/// What the poller hands to its callback: `{"type":"update"|"error","data":...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PollEvent {
    Update(PollUpdate),
    Error(String),
}

pub type PollCallback = Arc<dyn Fn(PollEvent) + Send + Sync>;

struct Schedule {
    clock: MarketClock,
    fixed: Option<Duration>,
}

impl Schedule {
    // re-evaluated every tick so a session change takes effect on the next wait
    fn next(&self) -> (MarketSession, Duration) {
        let session = self.clock.session_at(Utc::now());
        (session, self.fixed.unwrap_or_else(|| session.poll_interval()))
    }
}

/// One timer task per symbol. Starting a symbol that is already polled
/// replaces its timer.
pub struct LivePoller<S: CandleSource> {
    source: Arc<S>,
    schedule: Arc<Schedule>,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl<S: CandleSource> LivePoller<S> {
    pub fn new(source: Arc<S>, clock: MarketClock) -> Self {
        Self {
            source,
            schedule: Arc::new(Schedule { clock, fixed: None }),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Polls on a fixed period instead of following market hours.
    pub fn with_fixed_interval(source: Arc<S>, clock: MarketClock, every: Duration) -> Self {
        Self {
            source,
            schedule: Arc::new(Schedule { clock, fixed: Some(every) }),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn start(&self, symbol: &str, callback: PollCallback) {
        let sym = symbol.trim().to_uppercase();

        let source = self.source.clone();
        let schedule = self.schedule.clone();
        let task_sym = sym.clone();

        let mut tasks = self.tasks();
        if let Some(old) = tasks.remove(&sym) {
            old.abort();
        }

        let handle = tokio::spawn(async move {
            loop {
                let (session, wait) = schedule.next();

                let event = match source.fetch_latest(&task_sym).await {
                    Ok(live) => PollEvent::Update(PollUpdate {
                        live,
                        session,
                        next_poll_secs: wait.as_secs(),
                    }),
                    Err(e) => {
                        tracing::warn!("live poll for {task_sym} failed: {e}");
                        PollEvent::Error(e.to_string())
                    }
                };
                callback(event);

                tokio::time::sleep(wait).await;
            }
        });

        tasks.insert(sym, handle);
    }

    pub fn stop(&self, symbol: &str) -> bool {
        let sym = symbol.trim().to_uppercase();
        match self.tasks().remove(&sym) {
            Some(h) => {
                h.abort();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&self) {
        for (_, h) in self.tasks().drain() {
            h.abort();
        }
    }

    pub fn is_polling(&self, symbol: &str) -> bool {
        let sym = symbol.trim().to_uppercase();
        self.tasks().get(&sym).map(|h| !h.is_finished()).unwrap_or(false)
    }

    pub fn active_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.tasks().keys().cloned().collect();
        out.sort();
        out
    }
}

impl<S: CandleSource> Drop for LivePoller<S> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

struct Feed {
    tx: broadcast::Sender<PollEvent>,
    // held while publishing so a joining subscriber sees each event once
    last: Arc<Mutex<Option<PollEvent>>>,
}

/// A stream subscription: the newest event already published for the
/// symbol, then everything after it.
pub struct Subscription {
    pub last: Option<PollEvent>,
    pub rx: broadcast::Receiver<PollEvent>,
}

fn lock_last(last: &Mutex<Option<PollEvent>>) -> MutexGuard<'_, Option<PollEvent>> {
    last.lock().unwrap_or_else(|p| p.into_inner())
}

/// Fans one poller per symbol out to any number of stream subscribers.
#[derive(Clone)]
pub struct LiveChartHub {
    poller: Arc<LivePoller<LiveChartService>>,
    feeds: Arc<Mutex<HashMap<String, Feed>>>,
}

impl LiveChartHub {
    pub fn new(service: LiveChartService) -> Self {
        let clock = *service.clock();
        Self {
            poller: Arc::new(LivePoller::new(Arc::new(service), clock)),
            feeds: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn feeds(&self) -> MutexGuard<'_, HashMap<String, Feed>> {
        self.feeds.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Caller must pass an already normalized symbol.
    pub fn subscribe(&self, symbol: &str) -> Subscription {
        let mut feeds = self.feeds();

        if let Some(feed) = feeds.get(symbol) {
            if self.poller.is_polling(symbol) {
                let last = lock_last(&feed.last);
                return Subscription {
                    rx: feed.tx.subscribe(),
                    last: last.clone(),
                };
            }
        }

        let (tx, rx) = broadcast::channel::<PollEvent>(32);
        let last: Arc<Mutex<Option<PollEvent>>> = Arc::new(Mutex::new(None));

        let sender = tx.clone();
        let slot = last.clone();
        self.poller.start(
            symbol,
            Arc::new(move |evt| {
                let mut latest = lock_last(&slot);
                *latest = Some(evt.clone());
                // no receivers is fine, prune stops the timer later
                let _ = sender.send(evt);
            }),
        );

        feeds.insert(symbol.to_string(), Feed { tx, last });
        Subscription { last: None, rx }
    }

    /// Stops pollers nobody listens to. Returns the symbols stopped.
    pub fn prune(&self) -> Vec<String> {
        let mut feeds = self.feeds();
        let idle: Vec<String> = feeds
            .iter()
            .filter(|(_, f)| f.tx.receiver_count() == 0)
            .map(|(s, _)| s.clone())
            .collect();

        for s in &idle {
            feeds.remove(s);
            self.poller.stop(s);
        }
        idle
    }

    pub fn active_symbols(&self) -> Vec<String> {
        self.poller.active_symbols()
    }
}
