//! Real-time monitoring of the platform services.
//!
//! Each monitor subscribes to the D-Bus signals of one service, translates
//! them into [`IndicatorEvent`]s and pushes those onto the single event
//! queue. [`platform`] goes the other way and executes effects.

use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::api::indicator::Message;
use crate::core::events::IndicatorEvent;

pub(crate) mod modem;
pub(crate) mod network;
pub(crate) mod notifications;
pub(crate) mod platform;
pub(crate) mod rfkill;
pub(crate) mod wifi;

/// Sending half of the event queue.
pub(crate) type EventSender = UnboundedSender<Message>;

/// Pushes an event onto the queue. A closed queue means the indicator is
/// shutting down, so the event is dropped.
pub(crate) fn send(tx: &EventSender, event: IndicatorEvent) {
    if tx.send(Message::Event(event)).is_err() {
        debug!("Event queue closed, dropping event");
    }
}

/// Per-object watcher tasks, aborted when removed or dropped.
#[derive(Debug)]
pub(crate) struct Watchers<K: Eq + Hash> {
    tasks: HashMap<K, JoinHandle<()>>,
}

impl<K: Eq + Hash> Watchers<K> {
    pub(crate) fn new() -> Self {
        Self {
            tasks: HashMap::new(),
        }
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.tasks.contains_key(key)
    }

    pub(crate) fn insert(&mut self, key: K, task: JoinHandle<()>) {
        if let Some(old) = self.tasks.insert(key, task) {
            old.abort();
        }
    }

    /// Aborts the watcher of `key`. Returns whether one existed.
    pub(crate) fn remove(&mut self, key: &K) -> bool {
        match self.tasks.remove(key) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl<K: Eq + Hash> Drop for Watchers<K> {
    fn drop(&mut self) {
        for task in self.tasks.values() {
            task.abort();
        }
    }
}
