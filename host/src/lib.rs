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

pub mod config;
pub mod coordinator;
pub mod error;
pub mod log;
pub mod navigator;
pub mod session;

pub use config::FireConfig;
pub use coordinator::{Backends, CycleState, FireCoordinator};
pub use error::CoordinatorError;
pub use log::{ActivityLog, MessageLog};
pub use navigator::{Navigator, RouteRecorder, SETUP_ROUTE};
