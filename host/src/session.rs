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

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    time::Duration,
};

use salvo_core::{EventHub, FireOutcome, SubscriptionHandle, ValidationResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Outcome(FireOutcome),
    Validity(ValidationResult),
}

/// The outcome and validity subscriptions of one session, held as a unit.
///
/// Both streams feed a single inbox read on the coordinator's thread. Dropping the guard
/// unsubscribes from both hubs and discards anything still queued.
#[derive(Debug)]
pub struct SessionSubscription {
    _outcomes: SubscriptionHandle<FireOutcome>,
    _validity: SubscriptionHandle<ValidationResult>,
    inbox: Receiver<SessionEvent>,
}

impl SessionSubscription {
    pub fn open(
        outcomes: &EventHub<FireOutcome>,
        validity: &EventHub<ValidationResult>,
    ) -> Self {
        let (tx, inbox) = mpsc::channel();
        let outcome_tx = tx.clone();
        let outcomes =
            outcomes.subscribe(move |outcome| outcome_tx.send(SessionEvent::Outcome(outcome)).is_ok());
        let validity =
            validity.subscribe(move |result| tx.send(SessionEvent::Validity(result)).is_ok());
        Self {
            _outcomes: outcomes,
            _validity: validity,
            inbox,
        }
    }

    pub fn try_next(&self) -> Option<SessionEvent> {
        self.inbox.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        match self.inbox.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo_core::{FireResult, Position};

    use super::*;

    #[test]
    fn both_streams_share_one_inbox() {
        let outcomes = EventHub::new();
        let validity = EventHub::new();
        let session = SessionSubscription::open(&outcomes, &validity);

        let outcome = FireOutcome {
            target: Position::new(1, 2),
            fire_result: FireResult::Miss,
            proof: vec![1, 2, 3],
        };
        let result = ValidationResult {
            target: Position::new(1, 2),
            is_valid: true,
        };
        assert_eq!(outcomes.publish(outcome.clone()), 1);
        assert_eq!(validity.publish(result.clone()), 1);

        assert_eq!(session.try_next(), Some(SessionEvent::Outcome(outcome)));
        assert_eq!(session.try_next(), Some(SessionEvent::Validity(result)));
        assert_eq!(session.try_next(), None);
        assert_eq!(session.next_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn drop_releases_both_subscriptions() {
        let outcomes = EventHub::<FireOutcome>::new();
        let validity = EventHub::<ValidationResult>::new();
        let session = SessionSubscription::open(&outcomes, &validity);
        assert_eq!(outcomes.subscriber_count(), 1);
        assert_eq!(validity.subscriber_count(), 1);

        drop(session);
        assert_eq!(outcomes.subscriber_count(), 0);
        assert_eq!(validity.subscriber_count(), 0);
    }
}
