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

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Append-only sink for messages shown to the player.
pub trait ActivityLog {
    fn add_message(&self, text: &str);
}

/// An [ActivityLog] kept in memory. Clones share the same messages.
#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Messages appended after the first `start`.
    pub fn messages_since(&self, start: usize) -> Vec<String> {
        self.lock().iter().skip(start).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl ActivityLog for MessageLog {
    fn add_message(&self, text: &str) {
        tracing::info!("{}", text);
        self.lock().push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_messages() {
        let log = MessageLog::new();
        let view = log.clone();
        assert!(view.is_empty());

        log.add_message("one");
        log.add_message("two");
        assert_eq!(view.messages(), vec!["one", "two"]);
        assert_eq!(view.messages_since(1), vec!["two"]);
        assert!(view.messages_since(5).is_empty());
        assert_eq!(view.len(), 2);
    }
}
