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

use std::sync::{Arc, Mutex, PoisonError};

/// Where a session goes when its ships are not all deployed.
pub const SETUP_ROUTE: &str = "/setup";

pub trait Navigator {
    fn navigate_to(&self, route: &str);
}

/// A [Navigator] that remembers every redirect. Clones share the same history.
#[derive(Clone, Debug, Default)]
pub struct RouteRecorder {
    routes: Arc<Mutex<Vec<String>>>,
}

impl RouteRecorder {
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RouteRecorder {
    fn navigate_to(&self, route: &str) {
        tracing::info!("redirecting to {}", route);
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}
