//! Change-notification multiplexer
//!
//! Tracks, per state category, how many local observers are interested and
//! keeps the transport subscription alive exactly while that count is
//! above zero. Incoming raw signals are translated to the category's enum
//! and forwarded to every observer in registration order.
//!
//! Subscription policy is call-then-count: the external subscribe happens
//! before the first observer is committed, so the observer count always
//! reflects confirmed transport state. Registration and deregistration are
//! serialized by an async mutex; the observer lists themselves sit behind a
//! separate short-lived lock that signal dispatch never holds across a
//! transport call, so delivery cannot deadlock against registration.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::activity::Activity;
use crate::devicemode::{DeviceMode, PsmState};
use crate::display::DisplayState;
use crate::error::StateError;
use devstate_transport::{protocol, SignalEvent, Transport, Value};

/// One observable device-state dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Display,
    DeviceMode,
    PowerSave,
    Activity,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Display,
        Category::DeviceMode,
        Category::PowerSave,
        Category::Activity,
    ];

    /// Signal member announcing changes for this category.
    pub fn signal(self) -> &'static str {
        match self {
            Category::Display => protocol::DISPLAY_SIG,
            Category::DeviceMode => protocol::RADIO_STATES_SIG,
            Category::PowerSave => protocol::PSM_STATE_SIG,
            Category::Activity => protocol::INACTIVITY_SIG,
        }
    }

    /// Method for a one-shot fetch of this category's current value.
    pub fn query_method(self) -> &'static str {
        match self {
            Category::Display => protocol::DISPLAY_STATUS_GET,
            Category::DeviceMode => protocol::RADIO_STATES_GET,
            Category::PowerSave => protocol::PSM_STATE_GET,
            Category::Activity => protocol::INACTIVITY_STATUS_GET,
        }
    }

    pub fn from_signal(signal: &str) -> Option<Self> {
        Category::ALL.iter().copied().find(|c| c.signal() == signal)
    }

    fn index(self) -> usize {
        match self {
            Category::Display => 0,
            Category::DeviceMode => 1,
            Category::PowerSave => 2,
            Category::Activity => 3,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Display => "display",
            Category::DeviceMode => "mode",
            Category::PowerSave => "psm",
            Category::Activity => "activity",
        };
        f.write_str(name)
    }
}

/// A translated state-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Display(DisplayState),
    DeviceMode(DeviceMode),
    PowerSave(PsmState),
    Activity(Activity),
}

impl StateChange {
    /// Translate a raw signal or reply payload into the category's enum.
    ///
    /// Unmapped raw values become the category's Unknown variant; they are
    /// never dropped.
    pub fn translate(category: Category, raw: &Value) -> Self {
        match category {
            Category::Display => StateChange::Display(match raw {
                Value::Text(s) => DisplayState::from_mce(s),
                _ => DisplayState::Unknown,
            }),
            Category::DeviceMode => StateChange::DeviceMode(match raw {
                Value::U32(bits) => DeviceMode::from_radio_states(*bits),
                _ => DeviceMode::Unknown,
            }),
            Category::PowerSave => StateChange::PowerSave(match raw {
                Value::Bool(on) => PsmState::from_flag(*on),
                _ => PsmState::Unknown,
            }),
            Category::Activity => StateChange::Activity(match raw {
                Value::Bool(inactive) => Activity::from_inactivity(*inactive),
                _ => Activity::Unknown,
            }),
        }
    }

    /// The category's Unknown variant, used when a fetch fails outright.
    pub fn unknown(category: Category) -> Self {
        match category {
            Category::Display => StateChange::Display(DisplayState::Unknown),
            Category::DeviceMode => StateChange::DeviceMode(DeviceMode::Unknown),
            Category::PowerSave => StateChange::PowerSave(PsmState::Unknown),
            Category::Activity => StateChange::Activity(Activity::Unknown),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            StateChange::Display(_) => Category::Display,
            StateChange::DeviceMode(_) => Category::DeviceMode,
            StateChange::PowerSave(_) => Category::PowerSave,
            StateChange::Activity(_) => Category::Activity,
        }
    }
}

impl std::fmt::Display for StateChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateChange::Display(s) => write!(f, "{s}"),
            StateChange::DeviceMode(m) => write!(f, "{m}"),
            StateChange::PowerSave(p) => write!(f, "{p}"),
            StateChange::Activity(a) => write!(f, "{a}"),
        }
    }
}

/// Handle for one registered observer.
///
/// Receives the translated change stream for its category until it is
/// passed back to [`StateMonitor::deregister`].
#[derive(Debug)]
pub struct Observer {
    id: u64,
    category: Category,
    rx: mpsc::UnboundedReceiver<StateChange>,
}

impl Observer {
    pub fn category(&self) -> Category {
        self.category
    }

    /// Wait for the next change notification.
    ///
    /// Returns `None` once the monitor has shut down.
    pub async fn recv(&mut self) -> Option<StateChange> {
        self.rx.recv().await
    }

    /// Non-blocking poll for a pending notification.
    pub fn try_recv(&mut self) -> Option<StateChange> {
        self.rx.try_recv().ok()
    }
}

type ObserverSender = mpsc::UnboundedSender<StateChange>;

#[derive(Default)]
struct Inner {
    next_id: u64,
    // Registration order per category; delivery follows this order.
    slots: [Vec<(u64, ObserverSender)>; 4],
}

pub struct StateMonitor {
    transport: Arc<dyn Transport>,
    // Serializes (de)registrations so the count transition and the
    // matching transport call form one logical step.
    reg_lock: tokio::sync::Mutex<()>,
    inner: Mutex<Inner>,
}

impl StateMonitor {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            reg_lock: tokio::sync::Mutex::new(()),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Register interest in a category.
    ///
    /// The first observer of a category triggers exactly one transport
    /// subscribe before being committed; if that call fails nothing is
    /// registered and the error is returned.
    pub async fn register(&self, category: Category) -> Result<Observer, StateError> {
        let _guard = self.reg_lock.lock().await;

        let first = self.inner.lock().slots[category.index()].is_empty();
        if first {
            self.transport.subscribe(category.signal()).await?;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.slots[category.index()].push((id, tx));
            id
        };
        debug!(%category, id, "observer registered");
        Ok(Observer { id, category, rx })
    }

    /// Drop a registration.
    ///
    /// The last observer of a category triggers exactly one transport
    /// unsubscribe. The observer is removed locally even if that call
    /// fails.
    pub async fn deregister(&self, observer: Observer) -> Result<(), StateError> {
        let _guard = self.reg_lock.lock().await;

        let last = {
            let mut inner = self.inner.lock();
            let slot = &mut inner.slots[observer.category.index()];
            let before = slot.len();
            slot.retain(|(id, _)| *id != observer.id);
            if slot.len() == before {
                return Err(StateError::InvalidArgument(format!(
                    "observer {} is not registered for {}",
                    observer.id, observer.category
                )));
            }
            slot.is_empty()
        };
        debug!(category = %observer.category, id = observer.id, "observer deregistered");

        if last {
            self.transport.unsubscribe(observer.category.signal()).await?;
        }
        Ok(())
    }

    /// Number of currently registered observers for a category.
    ///
    /// The category is subscribed on the transport iff this is above zero.
    pub fn observer_count(&self, category: Category) -> usize {
        self.inner.lock().slots[category.index()].len()
    }

    /// Translate and forward a raw notification to this category's
    /// observers, in registration order.
    ///
    /// With zero observers this delivers to nobody and makes no external
    /// call. Runs on whatever task the transport delivers on and never
    /// takes the registration lock.
    pub fn handle_notification(&self, category: Category, raw: &Value) {
        let change = StateChange::translate(category, raw);
        let senders: Vec<ObserverSender> = {
            let inner = self.inner.lock();
            inner.slots[category.index()]
                .iter()
                .map(|(_, tx)| tx.clone())
                .collect()
        };
        for tx in senders {
            // A closed receiver just means the observer is being torn
            // down concurrently.
            let _ = tx.send(change);
        }
    }

    /// Route a transport signal event to the right category.
    pub fn handle_signal(&self, event: &SignalEvent) {
        match Category::from_signal(&event.signal) {
            Some(category) => self.handle_notification(category, &event.value),
            None => debug!(signal = %event.signal, "ignoring unrelated signal"),
        }
    }

    /// One-shot fetch of a category's current value, independent of
    /// subscription state.
    ///
    /// A failed fetch or malformed reply yields the category's Unknown
    /// variant and leaves observer bookkeeping untouched.
    pub async fn query(&self, category: Category) -> StateChange {
        match self.transport.request(category.query_method(), &[]).await {
            Ok(value) => StateChange::translate(category, &value),
            Err(e) => {
                debug!(%category, "query failed: {e}");
                StateChange::unknown(category)
            }
        }
    }

    /// Spawn a task that feeds the transport's signal stream into
    /// [`handle_signal`](Self::handle_signal).
    pub fn spawn_dispatcher(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let monitor = Arc::clone(self);
        let mut events = monitor.transport.signal_events();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => monitor.handle_signal(&event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("signal stream lagged, dropped {n} events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Drop all observers and release every active transport subscription,
    /// leaving every category at count zero.
    pub async fn shutdown(&self) -> Result<(), StateError> {
        let _guard = self.reg_lock.lock().await;

        let active: Vec<Category> = {
            let mut inner = self.inner.lock();
            Category::ALL
                .iter()
                .copied()
                .filter(|c| {
                    let slot = &mut inner.slots[c.index()];
                    let was_active = !slot.is_empty();
                    slot.clear();
                    was_active
                })
                .collect()
        };

        // Attempt every release even if one fails; a single dead
        // unsubscribe must not strand the other categories' matches.
        let mut first_err = None;
        for category in active {
            if let Err(e) = self.transport.unsubscribe(category.signal()).await {
                warn!(%category, "unsubscribe failed during shutdown: {e}");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
