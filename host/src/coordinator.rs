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

//! Drives fire actions from the player's click to a verified, logged board state.
//!
//! A fire cycle for one cell moves through
//! `Fired -> Consistent | Inconsistent -> Verifying -> Finalized`.
//! Proving and verifying complete on other threads; their events are queued on the session inbox
//! and handled one at a time by [FireCoordinator::pump] on the caller's thread. In-flight state is
//! keyed by cell position because events for different cells may arrive in any order.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use salvo_core::{EventHub, FireOutcome, GameBoard, Position, Ship, ValidationResult};
use salvo_proofs::{
    AttestationKey, Ledger, LocalVerifier, OnChainVerifier, Prover, SoftwareProver,
    VerifierBackend, VerifyMethod, VerifyRequest,
};

use crate::{
    config::FireConfig,
    error::CoordinatorError,
    log::ActivityLog,
    navigator::{Navigator, SETUP_ROUTE},
    session::{SessionEvent, SessionSubscription},
};

/// Progress of the fire cycle of one cell. Cells never fired have no state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CycleState {
    /// The board accepted the shot and a proof was requested.
    Fired,
    /// The claimed outcome matches the board. A cell stays here only when no backend could be
    /// asked to verify it.
    Consistent,
    /// The claimed outcome contradicts the board. Terminal; the cell is never finalized.
    Inconsistent,
    Verifying(VerifyMethod),
    Finalized { valid: bool },
}

impl CycleState {
    /// Whether no further event can move this cell on.
    pub fn is_settled(&self) -> bool {
        !matches!(self, CycleState::Fired | CycleState::Verifying(_))
    }
}

/// The prover and both verifier backends, plus the validity stream they share.
pub struct Backends {
    pub prover: Box<dyn Prover>,
    pub local: Box<dyn VerifierBackend>,
    pub on_chain: Box<dyn VerifierBackend>,
    pub validity: EventHub<ValidationResult>,
}

impl Backends {
    /// Spawns the in-process prover and verifiers, all using `key`.
    pub fn software(key: AttestationKey, ledger: Arc<dyn Ledger>) -> std::io::Result<Self> {
        let validity = EventHub::new();
        Ok(Self {
            prover: Box::new(SoftwareProver::spawn(key)?),
            local: Box::new(LocalVerifier::spawn(key, validity.clone())?),
            on_chain: Box::new(OnChainVerifier::spawn(ledger, validity.clone())?),
            validity,
        })
    }

    fn verifier(&self, method: VerifyMethod) -> &dyn VerifierBackend {
        match method {
            VerifyMethod::Local => self.local.as_ref(),
            VerifyMethod::OnChain => self.on_chain.as_ref(),
        }
    }
}

pub struct FireCoordinator {
    config: FireConfig,
    board: GameBoard,
    backends: Backends,
    log: Box<dyn ActivityLog>,
    navigator: Box<dyn Navigator>,
    session: Option<SessionSubscription>,
    closed: bool,
    cycles: HashMap<Position, CycleState>,
    turn: u32,
}

impl FireCoordinator {
    pub fn new(
        config: FireConfig,
        board: GameBoard,
        backends: Backends,
        log: impl ActivityLog + 'static,
        navigator: impl Navigator + 'static,
    ) -> Self {
        let turn = board.turn();
        Self {
            config,
            board,
            backends,
            log: Box::new(log),
            navigator: Box::new(navigator),
            session: None,
            closed: false,
            cycles: HashMap::new(),
            turn,
        }
    }

    /// Starts the session: commits the fleet to the prover and subscribes to the outcome and
    /// validity streams.
    ///
    /// If the ships are not all deployed this redirects to setup and does nothing else. A
    /// coordinator that has been shut down cannot be started again.
    pub fn initialize(&mut self) -> Result<(), CoordinatorError> {
        if self.closed {
            tracing::warn!("refusing to reopen a closed fire session");
            return Err(CoordinatorError::SessionClosed);
        }
        if !self.board.is_all_deployed() {
            self.log.add_message(&CoordinatorError::SessionNotReady.to_string());
            self.navigator.navigate_to(SETUP_ROUTE);
            return Err(CoordinatorError::SessionNotReady);
        }
        if self.session.is_some() {
            tracing::debug!("session already initialized");
            return Ok(());
        }

        self.turn = self.board.turn();
        tracing::debug!(
            "loaded board with {} ships at turn {}",
            self.board.ships().len(),
            self.turn
        );

        self.backends.prover.commit_ships(self.board.ships());
        self.session = Some(SessionSubscription::open(
            &self.backends.prover.outcomes(),
            &self.backends.validity,
        ));
        tracing::info!(
            "fire session started with {} verification",
            self.config.verify_method
        );
        Ok(())
    }

    /// Fires at `pos` and asks the prover for a proof of the outcome.
    ///
    /// Returns false, with no other effect, if there is no session or the board rejects the shot.
    /// The rest of the cycle runs as events are pumped.
    pub fn request_fire(&mut self, pos: Position) -> bool {
        if self.session.is_none() {
            tracing::warn!("ignoring shot at {} outside of a session", pos);
            return false;
        }
        if !self.board.fire(pos) {
            let reason = match pos.in_bounds() {
                true => CoordinatorError::CellAlreadyFired(pos),
                false => CoordinatorError::OffBoard(pos),
            };
            tracing::debug!("{}", reason);
            return false;
        }

        self.cycles.insert(pos, CycleState::Fired);
        self.log.add_message(&format!("{pos}: generating proof..."));
        self.backends.prover.fire(pos);
        self.turn = self.board.turn();
        true
    }

    /// Handles every event already queued, without waiting. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.session.as_ref().and_then(|s| s.try_next()) {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for an event, then handles everything queued.
    pub fn pump_for(&mut self, timeout: Duration) -> usize {
        let Some(event) = self.session.as_ref().and_then(|s| s.next_timeout(timeout)) else {
            return 0;
        };
        self.dispatch(event);
        1 + self.pump()
    }

    /// Pumps events until the cycle at `pos` settles or `timeout` passes.
    pub fn settle(&mut self, pos: Position, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_settled(pos) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline || self.session.is_none() {
                return false;
            }
            self.pump_for(deadline - now);
        }
    }

    /// Releases both subscriptions. Events published afterwards are dropped.
    pub fn shutdown(&mut self) {
        self.closed = true;
        if self.session.take().is_some() {
            tracing::info!("fire session closed");
        }
    }

    fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Outcome(outcome) => self.on_outcome(outcome),
            SessionEvent::Validity(result) => self.on_validity(result),
        }
    }

    fn on_outcome(&mut self, outcome: FireOutcome) {
        let target = outcome.target;
        match self.cycles.get(&target) {
            Some(CycleState::Fired) => {}
            state => {
                tracing::warn!("dropping outcome for {} in state {:?}", target, state);
                return;
            }
        }
        self.log.add_message(&format!("{target}: proof generated"));

        if !self.board.verify(target, outcome.fire_result.cell_state()) {
            self.cycles.insert(target, CycleState::Inconsistent);
            self.log
                .add_message(&CoordinatorError::LocalConsistencyFailure(target).to_string());
            return;
        }
        self.cycles.insert(target, CycleState::Consistent);

        let method = self.config.verify_method;
        let contract_address = match method {
            VerifyMethod::Local => None,
            VerifyMethod::OnChain => match self.config.contract_address() {
                Some(address) => Some(address.to_string()),
                None => {
                    self.log
                        .add_message(&CoordinatorError::BackendConfig(target).to_string());
                    return;
                }
            },
        };

        let message = match contract_address.as_deref() {
            Some(address) => {
                format!("{target}: verifying the proof by smart contract at '{address}'...")
            }
            None => format!("{target}: verifying the proof locally..."),
        };
        self.log.add_message(&message);
        self.cycles.insert(target, CycleState::Verifying(method));

        let request = VerifyRequest {
            proof: outcome.proof,
            fire_result: outcome.fire_result,
            target,
            contract_address,
        };
        let backend = self.backends.verifier(method);
        tracing::debug!("dispatching {} to the {} verifier", target, backend.method());
        if let Err(source) = backend.verify(request) {
            self.log
                .add_message(&CoordinatorError::Backend { target, source }.to_string());
        }
    }

    fn on_validity(&mut self, result: ValidationResult) {
        let target = result.target;
        match self.cycles.get(&target) {
            Some(CycleState::Verifying(_)) => {}
            state => {
                tracing::warn!("dropping validity for {} in state {:?}", target, state);
                return;
            }
        }

        self.board.validate(target, result.is_valid);
        self.cycles.insert(
            target,
            CycleState::Finalized {
                valid: result.is_valid,
            },
        );
        self.log.add_message(&format!(
            "{target}: proof verification result is '{}'",
            result.is_valid
        ));
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn cycle_state(&self, pos: Position) -> Option<CycleState> {
        self.cycles.get(&pos).copied()
    }

    pub fn is_settled(&self, pos: Position) -> bool {
        self.cycle_state(pos).is_some_and(|state| state.is_settled())
    }

    pub fn board(&self) -> &GameBoard {
        &self.board
    }

    pub fn ship_by_cell(&self, pos: Position) -> Option<&Ship> {
        self.board.ship_by_cell(pos)
    }

    /// Turn counter as of the last accepted shot.
    pub fn turn(&self) -> u32 {
        self.turn
    }
}

impl Drop for FireCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
