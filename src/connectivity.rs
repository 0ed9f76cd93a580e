/// Backend connectivity
///
/// An explicit state machine for backend reachability. State only changes
/// through probe results; subscribers hear about transitions, not about
/// every probe.
use crate::api::Backend;
use log::{debug, info};
use std::time::{Duration, Instant};

/// Default health-check period
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No probe has completed yet
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectionState {
    /// Status-bar text
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Unknown => "⚪ Verificando...",
            ConnectionState::Connected => "🟢 Conectado",
            ConnectionState::Disconnected => "🔴 Desconectado",
        }
    }
}

type Subscriber = Box<dyn FnMut(ConnectionState)>;

pub struct Connectivity {
    state: ConnectionState,
    subscribers: Vec<Subscriber>,
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity {
    pub fn new() -> Self {
        Self { state: ConnectionState::Unknown, subscribers: Vec::new() }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Register a callback invoked on every state transition
    pub fn subscribe(&mut self, subscriber: impl FnMut(ConnectionState) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Probe the backend's status endpoint and apply the outcome.
    pub fn probe<B: Backend + ?Sized>(&mut self, backend: &B) -> ConnectionState {
        let next = match backend.status() {
            Ok(_) => ConnectionState::Connected,
            Err(e) => {
                debug!("status probe failed: {}", e);
                ConnectionState::Disconnected
            }
        };
        self.apply(next)
    }

    fn apply(&mut self, next: ConnectionState) -> ConnectionState {
        if next != self.state {
            info!("backend connectivity: {:?} -> {:?}", self.state, next);
            self.state = next;
            for subscriber in &mut self.subscribers {
                subscriber(next);
            }
        }
        self.state
    }
}

/// Decides when the next periodic probe is due
#[derive(Debug, Clone)]
pub struct HealthCheck {
    interval: Duration,
    last_probe: Option<Instant>,
}

impl HealthCheck {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_probe: None }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_probe {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last_probe = Some(now);
    }

    /// Time left until the next probe is due
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_probe {
            None => Duration::ZERO,
            Some(last) => self.interval.saturating_sub(now.duration_since(last)),
        }
    }
}
