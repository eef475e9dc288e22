//! Session registry: at most one live session per subscription id.
//!
//! The registry is owned by the [`EventClient`](crate::stream::EventClient)
//! that created it, not by a process-wide singleton. All mutations go through
//! one mutex so concurrent opens for the same id serialize; a superseded
//! session is torn down before its replacement is allowed to connect.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::stream::event::Event;
use crate::stream::session::SessionState;

/// Caller-chosen key identifying one logical streaming subscription.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubscriptionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubscriptionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) struct SessionEntry {
    /// Distinguishes this session from earlier ones under the same id, so a
    /// finished worker never removes its replacement's entry.
    pub epoch: u64,
    pub task: JoinHandle<()>,
    pub events: mpsc::Sender<Event>,
    pub state: watch::Receiver<SessionState>,
    /// Released once any superseded session for the same id has fully wound
    /// down; the worker does not touch the network before it.
    pub go: Option<oneshot::Sender<()>>,
}

#[derive(Default)]
pub(crate) struct Registry {
    sessions: Mutex<HashMap<SubscriptionId, SessionEntry>>,
    epochs: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_epoch(&self) -> u64 {
        self.epochs.fetch_add(1, Ordering::Relaxed)
    }

    /// Installs a session for `id`, superseding any live one, then releases
    /// the new worker's start gate. When a session was superseded, the gate
    /// opens only after its aborted worker has fully finished, so two
    /// transports for one id never overlap.
    pub fn install(&self, id: SubscriptionId, mut entry: SessionEntry) {
        let go = entry.go.take();
        let superseded = {
            let mut sessions = self.sessions.lock().expect("registry mutex poisoned");
            sessions.insert(id.clone(), entry)
        };
        match superseded {
            Some(old) => {
                debug!(event = "session_superseded", id = %id, epoch = old.epoch);
                let old_task = teardown(old);
                if let Some(go) = go {
                    tokio::spawn(async move {
                        let _ = old_task.await;
                        let _ = go.send(());
                    });
                }
            }
            None => {
                if let Some(go) = go {
                    let _ = go.send(());
                }
            }
        }
    }

    /// Cancels the session for `id` and removes it. Removal happens even if
    /// the worker already finished on its own.
    pub fn close(&self, id: &SubscriptionId) -> Option<()> {
        let entry = {
            let mut sessions = self.sessions.lock().expect("registry mutex poisoned");
            sessions.remove(id)?
        };
        debug!(event = "session_closed", id = %id, epoch = entry.epoch);
        let _ = teardown(entry);
        Some(())
    }

    /// Like [`close`](Self::close), but only if the installed session is
    /// still the one created at `epoch`. Used by subscription drops so a
    /// stale handle cannot cancel its replacement.
    pub fn close_if_current(&self, id: &SubscriptionId, epoch: u64) {
        let entry = {
            let mut sessions = self.sessions.lock().expect("registry mutex poisoned");
            match sessions.get(id) {
                Some(current) if current.epoch == epoch => sessions.remove(id),
                _ => None,
            }
        };
        if let Some(entry) = entry {
            debug!(event = "session_dropped", id = %id, epoch);
            let _ = teardown(entry);
        }
    }

    /// Removes the entry a finished worker left behind, unless the id has
    /// been reused by a newer session.
    pub fn remove_if_current(&self, id: &SubscriptionId, epoch: u64) {
        let mut sessions = self.sessions.lock().expect("registry mutex poisoned");
        if sessions.get(id).is_some_and(|entry| entry.epoch == epoch) {
            sessions.remove(id);
            debug!(event = "session_finished", id = %id, epoch);
        }
    }

    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.sessions
            .lock()
            .expect("registry mutex poisoned")
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().expect("registry mutex poisoned").len()
    }
}

fn teardown(entry: SessionEntry) -> JoinHandle<()> {
    entry.task.abort();
    let events = entry.events;
    match tokio::runtime::Handle::try_current() {
        // The cancellation notice queues behind whatever the subscriber has
        // not drained yet; `send` waits for a slot instead of dropping it.
        Ok(handle) => {
            handle.spawn(async move {
                let _ = events.send(Event::Cancelled).await;
            });
        }
        // Outside a runtime the receiving half is gone too.
        Err(_) => {
            let _ = events.try_send(Event::Cancelled);
        }
    }
    entry.task
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use tokio::sync::{mpsc, oneshot};

    use super::{Registry, SessionEntry, SubscriptionId};
    use crate::stream::event::Event;
    use crate::stream::session::Lifecycle;

    fn entry(registry: &Registry) -> (SessionEntry, mpsc::Receiver<Event>) {
        let (events_tx, events_rx) = mpsc::channel(4);
        let (go_tx, go_rx) = oneshot::channel();
        let (_lifecycle, state) = Lifecycle::new();
        let task = tokio::spawn(async move {
            let _go = go_rx;
            std::future::pending::<()>().await;
        });
        (
            SessionEntry {
                epoch: registry.next_epoch(),
                task,
                events: events_tx,
                state,
                go: Some(go_tx),
            },
            events_rx,
        )
    }

    #[tokio::test]
    async fn install_supersedes_previous_session() {
        let registry = Registry::new();
        let id = SubscriptionId::from("vacuum");

        let (first, mut first_events) = entry(&registry);
        let first_epoch = first.epoch;
        registry.install(id.clone(), first);

        let (second, _second_events) = entry(&registry);
        let second_epoch = second.epoch;
        registry.install(id.clone(), second);

        assert_eq!(registry.len(), 1);
        assert_ne!(first_epoch, second_epoch);
        assert_eq!(first_events.recv().await, Some(Event::Cancelled));
    }

    struct FlagOnDrop(Arc<AtomicBool>);

    impl Drop for FlagOnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn gate_opens_only_after_superseded_worker_finished() {
        let registry = Registry::new();
        let id = SubscriptionId::from("vacuum");

        let finished = Arc::new(AtomicBool::new(false));
        let (events_tx, _first_events) = mpsc::channel(4);
        let (go_tx, go_rx) = oneshot::channel();
        let (_lifecycle, state) = Lifecycle::new();
        let flag = finished.clone();
        let task = tokio::spawn(async move {
            let _finished = FlagOnDrop(flag);
            let _go = go_rx;
            std::future::pending::<()>().await;
        });
        registry.install(
            id.clone(),
            SessionEntry {
                epoch: registry.next_epoch(),
                task,
                events: events_tx,
                state,
                go: Some(go_tx),
            },
        );
        // Let the first worker start before it gets superseded.
        tokio::task::yield_now().await;

        let (events_tx, _second_events) = mpsc::channel(4);
        let (go_tx, go_rx) = oneshot::channel();
        let (_lifecycle, state) = Lifecycle::new();
        let task = tokio::spawn(std::future::pending::<()>());
        registry.install(
            id.clone(),
            SessionEntry {
                epoch: registry.next_epoch(),
                task,
                events: events_tx,
                state,
                go: Some(go_tx),
            },
        );

        go_rx.await.expect("start gate released");
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancellation_survives_a_full_channel() {
        let registry = Registry::new();
        let id = SubscriptionId::from("vacuum");

        let (first, mut first_events) = entry(&registry);
        let sender = first.events.clone();
        while sender.try_send(Event::Ping).is_ok() {}
        registry.install(id.clone(), first);

        let (second, _second_events) = entry(&registry);
        registry.install(id.clone(), second);

        // The cancellation arrives behind the undrained backlog.
        loop {
            match first_events.recv().await {
                Some(Event::Cancelled) => break,
                Some(_) => continue,
                None => panic!("cancellation was dropped"),
            }
        }
    }

    #[tokio::test]
    async fn close_removes_entry_and_cancels() {
        let registry = Registry::new();
        let id = SubscriptionId::from("vacuum");
        let (session, mut events) = entry(&registry);
        registry.install(id.clone(), session);

        assert!(registry.close(&id).is_some());
        assert!(!registry.contains(&id));
        assert_eq!(events.recv().await, Some(Event::Cancelled));
    }

    #[tokio::test]
    async fn close_unknown_id_reports_not_found() {
        let registry = Registry::new();
        assert!(registry.close(&SubscriptionId::from("missing")).is_none());
    }

    #[tokio::test]
    async fn stale_drop_does_not_cancel_replacement() {
        let registry = Registry::new();
        let id = SubscriptionId::from("vacuum");

        let (first, _first_events) = entry(&registry);
        let first_epoch = first.epoch;
        registry.install(id.clone(), first);

        let (second, mut second_events) = entry(&registry);
        registry.install(id.clone(), second);

        registry.close_if_current(&id, first_epoch);
        assert!(registry.contains(&id));
        assert!(second_events.try_recv().is_err());
    }

    #[tokio::test]
    async fn finished_worker_removal_respects_epoch() {
        let registry = Registry::new();
        let id = SubscriptionId::from("vacuum");

        let (first, _first_events) = entry(&registry);
        let first_epoch = first.epoch;
        registry.install(id.clone(), first);

        let (second, _second_events) = entry(&registry);
        registry.install(id.clone(), second);

        // The aborted first worker's cleanup must not evict the second.
        registry.remove_if_current(&id, first_epoch);
        assert!(registry.contains(&id));
    }
}
