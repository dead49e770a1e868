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

use salvo_core::Position;
use salvo_proofs::VerifierError;
use thiserror::Error;

/// Failures detected while driving a fire cycle.
///
/// Apart from [CoordinatorError::SessionNotReady] and [CoordinatorError::SessionClosed], which
/// `initialize` returns, these are turned into activity log lines where they are detected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("not all ships are deployed; returning to setup")]
    SessionNotReady,

    #[error("fire session was already shut down")]
    SessionClosed,

    #[error("{0}: cell was already fired upon")]
    CellAlreadyFired(Position),

    #[error("{0}: cell is not on the board")]
    OffBoard(Position),

    #[error("{0}: result failed to be locally verified")]
    LocalConsistencyFailure(Position),

    #[error("{0}: on-chain verification needs a contract address; proof not verified")]
    BackendConfig(Position),

    #[error("{target}: could not reach the verifier: {source}")]
    Backend {
        target: Position,
        source: VerifierError,
    },
}
