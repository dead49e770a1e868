// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Event payloads produced by provers and verifiers, and the hub they are published on.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};

use crate::{CellState, Position};

/// Outcome of a shot as claimed by a prover.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Hash)]
#[repr(u8)]
pub enum FireResult {
    Miss = 0,
    Hit = 1,
}

impl FireResult {
    /// Cell state the claim corresponds to on the board.
    pub fn cell_state(self) -> CellState {
        match self {
            FireResult::Hit => CellState::Hit,
            FireResult::Miss => CellState::Missed,
        }
    }
}

impl From<FireResult> for u8 {
    fn from(value: FireResult) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for FireResult {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FireResult::Miss),
            1 => Ok(FireResult::Hit),
            other => Err(other),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct FireOutcome {
    pub target: Position,
    pub fire_result: FireResult,
    /// Opaque proof blob.
    pub proof: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationResult {
    pub target: Position,
    pub is_valid: bool,
}

type Callback<T> = Box<dyn FnMut(T) -> bool + Send>;

struct Registry<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
}

/// Publish/subscribe registry for one event stream.
///
/// Clones share the same set of subscribers. A callback that returns `false` is dropped from the
/// registry, as is any callback whose [SubscriptionHandle] is dropped.
pub struct EventHub<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
            })),
        }
    }
}

impl<T> EventHub<T> {
    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }
}

impl<T> std::fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

fn lock<T>(registry: &Mutex<Registry<T>>) -> MutexGuard<'_, Registry<T>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Clone + 'static> EventHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        callback: impl FnMut(T) -> bool + Send + 'static,
    ) -> SubscriptionHandle<T> {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.push((id, Box::new(callback)));
        SubscriptionHandle {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Delivers `event` to every live subscriber and returns how many accepted it.
    pub fn publish(&self, event: T) -> usize {
        let mut registry = lock(&self.registry);
        let mut delivered = 0;
        registry.callbacks.retain_mut(|(_, callback)| {
            let accepted = callback(event.clone());
            delivered += accepted as usize;
            accepted
        });
        delivered
    }
}

/// Keeps a callback registered on an [EventHub]. Dropping it unsubscribes.
pub struct SubscriptionHandle<T> {
    id: u64,
    registry: Weak<Mutex<Registry<T>>>,
}

impl<T> SubscriptionHandle<T> {
    pub fn unsubscribe(self) {}
}

impl<T> std::fmt::Debug for SubscriptionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .finish()
    }
}

impl<T> Drop for SubscriptionHandle<T> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry)
                .callbacks
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn fire_result_wire_values() {
        assert_eq!(u8::from(FireResult::Hit), 1);
        assert_eq!(u8::from(FireResult::Miss), 0);
        assert_eq!(FireResult::try_from(1), Ok(FireResult::Hit));
        assert_eq!(FireResult::try_from(0), Ok(FireResult::Miss));
        assert_eq!(FireResult::try_from(2), Err(2));
        assert_eq!(FireResult::Hit.cell_state(), CellState::Hit);
        assert_eq!(FireResult::Miss.cell_state(), CellState::Missed);
    }

    #[test]
    fn publish_reaches_every_subscriber() {
        let hub = EventHub::new();
        let (tx, rx) = mpsc::channel();
        let tx2 = tx.clone();
        let _a = hub.subscribe(move |v: u32| tx.send(("a", v)).is_ok());
        let _b = hub.subscribe(move |v: u32| tx2.send(("b", v)).is_ok());

        assert_eq!(hub.publish(7), 2);
        let mut got: Vec<_> = rx.try_iter().collect();
        got.sort();
        assert_eq!(got, vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn dropping_handle_unsubscribes() {
        let hub = EventHub::new();
        let (tx, rx) = mpsc::channel();
        let handle = hub.subscribe(move |v: u32| tx.send(v).is_ok());
        assert_eq!(hub.subscriber_count(), 1);

        handle.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(1), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn rejecting_callback_is_pruned() {
        let hub = EventHub::new();
        let (tx, rx) = mpsc::channel::<u32>();
        drop(rx);
        let _handle = hub.subscribe(move |v: u32| tx.send(v).is_ok());

        assert_eq!(hub.publish(1), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn handle_outliving_hub_is_harmless() {
        let hub = EventHub::<u32>::new();
        let handle = hub.subscribe(|_| true);
        drop(hub);
        drop(handle);
    }

    #[test]
    fn debug_reports_subscribers_for_any_payload() {
        struct Opaque;
        let hub = EventHub::<Opaque>::default();
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(format!("{:?}", hub), "EventHub { subscribers: 0 }");
    }
}
