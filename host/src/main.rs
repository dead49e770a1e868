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

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use inquire::{Select, Text};
use regex::Regex;
use salvo_core::{Fleet, GameBoard, Position, ShipClass};
use salvo_host::{
    config::VERIFY_METHOD_VAR, Backends, FireConfig, FireCoordinator, MessageLog, RouteRecorder,
};
use salvo_proofs::{AttestationKey, InMemoryLedger, VerifyMethod};

const LEDGER_LATENCY: Duration = Duration::from_millis(300);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    // Initialize tracing. In order to view logs, run `RUST_LOG=info cargo run`
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let mut config = FireConfig::from_env()?;
    if std::env::var_os(VERIFY_METHOD_VAR).is_none() {
        config.verify_method = Select::new(
            "How should proofs be verified?",
            vec![VerifyMethod::Local, VerifyMethod::OnChain],
        )
        .prompt()?;
    }

    // Prover and verifiers share one attestation key; the ledger hosts the verifier contract.
    let key = AttestationKey::random();
    let ledger = Arc::new(InMemoryLedger::new(LEDGER_LATENCY));
    if config.verify_method == VerifyMethod::OnChain && config.contract_address().is_none() {
        let deployed = ledger.deploy_verifier(key);
        let address = Text::new("Verifier contract address:")
            .with_default(&deployed)
            .prompt()?;
        config.contract_address = Some(address);
    }

    let fleet: Fleet = rand::random();
    let board = GameBoard::from_fleet(&fleet).context("random fleet should fit on the board")?;
    let backends = Backends::software(key, ledger)?;
    let log = MessageLog::new();
    let mut coordinator =
        FireCoordinator::new(config, board, backends, log.clone(), RouteRecorder::default());
    coordinator.initialize()?;

    let coord_regex = Regex::new(r"^([0-9]),\s*([0-9])$")?;
    let mut printed = 0;
    let mut sunk: Vec<ShipClass> = Vec::new();
    while coordinator.board().remaining_ships().next().is_some() {
        let shot = prompt_for_point(&coord_regex)?;
        if !coordinator.request_fire(shot) {
            println!("{} was already fired upon, pick another cell", shot);
            continue;
        }
        if !coordinator.settle(shot, SETTLE_TIMEOUT) {
            println!("Still waiting on a verdict for {}", shot);
        }

        for line in log.messages_since(printed) {
            println!("{}", line);
        }
        printed = log.len();

        for class in ShipClass::list() {
            if sunk.contains(class) {
                continue;
            }
            let board = coordinator.board();
            if board
                .ships()
                .iter()
                .any(|ship| board.is_destroyed_ship_class(ship, class.label()))
            {
                println!("You sunk the {}!", class);
                sunk.push(*class);
            }
        }
    }

    println!("All ships destroyed after {} shots!", coordinator.turn());
    coordinator.shutdown();
    Ok(())
}

fn prompt_for_point(coord_regex: &Regex) -> anyhow::Result<Position> {
    loop {
        let input = Text::new(
            "Enter coordinates (x,y) for a point on the 10x10 grid (0-9 for each value):",
        )
        .prompt()?;

        // The regex only admits single digits, so both parses succeed.
        if let Some(captures) = coord_regex.captures(input.trim()) {
            if let (Some(x), Some(y)) = (captures.get(1), captures.get(2)) {
                if let (Ok(x), Ok(y)) = (x.as_str().parse(), y.as_str().parse()) {
                    return Ok(Position { x, y });
                }
            }
        }

        println!(
            "Invalid coordinates! Please enter values as 'x,y' where both x and y are between 0-9."
        );
    }
}
