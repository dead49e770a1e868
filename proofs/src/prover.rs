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
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use risc0_zkvm::sha::Digest;
use salvo_core::{EventHub, FireOutcome, FireResult, Fleet, Position, Ship};

use crate::attestation::{AttestationKey, FireProof};

/// Produces proofs of fire outcomes against a committed ship layout.
///
/// Both calls return immediately. Outcomes are delivered on the [EventHub] returned by
/// [Prover::outcomes].
pub trait Prover {
    /// Commits to the ship layout that later shots are proven against.
    fn commit_ships(&self, ships: &[Ship]);

    fn fire(&self, target: Position);

    fn outcomes(&self) -> EventHub<FireOutcome>;
}

enum Command {
    Commit(Vec<Ship>),
    Fire(Position),
}

/// A [Prover] running on a background worker thread.
///
/// Commands are handled in the order they are issued, so a shot is always proven against the
/// most recent commitment.
pub struct SoftwareProver {
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    outcomes: EventHub<FireOutcome>,
}

impl SoftwareProver {
    pub fn spawn(key: AttestationKey) -> std::io::Result<Self> {
        Self::with_latency(key, Duration::ZERO)
    }

    /// Like [SoftwareProver::spawn], with a fixed delay added to every proof.
    pub fn with_latency(key: AttestationKey, latency: Duration) -> std::io::Result<Self> {
        let (commands, rx) = mpsc::channel();
        let outcomes = EventHub::new();
        let worker_outcomes = outcomes.clone();
        let worker = thread::Builder::new()
            .name("salvo-prover".to_string())
            .spawn(move || run(rx, key, worker_outcomes, latency))?;
        Ok(Self {
            commands: Some(commands),
            worker: Some(worker),
            outcomes,
        })
    }

    fn send(&self, command: Command) {
        let sent = self
            .commands
            .as_ref()
            .is_some_and(|commands| commands.send(command).is_ok());
        if !sent {
            tracing::warn!("prover worker has stopped; command dropped");
        }
    }
}

impl Prover for SoftwareProver {
    fn commit_ships(&self, ships: &[Ship]) {
        self.send(Command::Commit(ships.to_vec()));
    }

    fn fire(&self, target: Position) {
        self.send(Command::Fire(target));
    }

    fn outcomes(&self) -> EventHub<FireOutcome> {
        self.outcomes.clone()
    }
}

impl Drop for SoftwareProver {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop.
        drop(self.commands.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("prover worker panicked");
            }
        }
    }
}

fn run(
    commands: Receiver<Command>,
    key: AttestationKey,
    outcomes: EventHub<FireOutcome>,
    latency: Duration,
) {
    let mut committed: Option<(Fleet, Digest)> = None;

    for command in commands {
        match command {
            Command::Commit(ships) => {
                let fleet = Fleet::new(ships, rand::random());
                let commitment = fleet.commit();
                tracing::info!("committed to fleet of {} ships: {}", fleet.ships.len(), commitment);
                committed = Some((fleet, commitment));
            }
            Command::Fire(target) => {
                let Some((fleet, commitment)) = committed.as_ref() else {
                    tracing::warn!("shot at {} before any fleet commitment; no proof produced", target);
                    continue;
                };
                if !latency.is_zero() {
                    thread::sleep(latency);
                }

                let fire_result = match fleet.occupied(target) {
                    true => FireResult::Hit,
                    false => FireResult::Miss,
                };
                let proof = match FireProof::seal(&key, *commitment, target, fire_result)
                    .and_then(|proof| proof.encode())
                {
                    Ok(proof) => proof,
                    Err(err) => {
                        tracing::error!("failed to prove shot at {}: {}", target, err);
                        continue;
                    }
                };

                tracing::debug!("proved {:?} at {}", fire_result, target);
                let delivered = outcomes.publish(FireOutcome {
                    target,
                    fire_result,
                    proof,
                });
                if delivered == 0 {
                    tracing::debug!("no subscriber for outcome at {}", target);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use salvo_core::{Direction, ShipClass};

    use super::*;
    use crate::attestation::check_proof;

    #[test]
    fn fire_after_commit_publishes_outcome() -> anyhow::Result<()> {
        let key = AttestationKey::random();
        let prover = SoftwareProver::spawn(key)?;
        let (tx, rx) = mpsc::channel();
        let _sub = prover.outcomes().subscribe(move |o| tx.send(o).is_ok());

        prover.commit_ships(&[Ship::new(ShipClass::Destroyer, (2, 3), Direction::Horizontal)]);
        prover.fire(Position::new(3, 3));
        prover.fire(Position::new(0, 0));

        let hit = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(hit.target, Position::new(3, 3));
        assert_eq!(hit.fire_result, FireResult::Hit);
        check_proof(&key, &hit.proof, hit.target, hit.fire_result)?;

        let miss = rx.recv_timeout(Duration::from_secs(5))?;
        assert_eq!(miss.target, Position::new(0, 0));
        assert_eq!(miss.fire_result, FireResult::Miss);
        Ok(())
    }

    #[test]
    fn fire_without_commit_is_dropped() -> anyhow::Result<()> {
        let prover = SoftwareProver::spawn(AttestationKey::random())?;
        let (tx, rx) = mpsc::channel();
        let _sub = prover.outcomes().subscribe(move |o| tx.send(o).is_ok());

        prover.fire(Position::new(0, 0));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        Ok(())
    }
}
