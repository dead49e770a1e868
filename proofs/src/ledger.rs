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

//! Ledger seam used by the on-chain verifier.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        PoisonError, RwLock,
    },
    thread,
    time::Duration,
};

use risc0_zkvm::sha::Sha256;
use salvo_core::{FireResult, Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attestation::{check_proof, AttestationKey};

/// Arguments of a verifier contract call.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct VerifyCall {
    pub proof: Vec<u8>,
    pub fire_result: u8,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no contract deployed at '{0}'")]
    UnknownContract(String),

    #[error("ledger unreachable")]
    Unreachable,
}

/// A ledger hosting proof verifier contracts.
pub trait Ledger: Send + Sync {
    /// Calls the verifier contract at `contract` and returns its verdict.
    fn call_verify(&self, contract: &str, call: &VerifyCall) -> Result<bool, LedgerError>;
}

/// A [Ledger] kept in process memory, with a fixed latency per call.
#[derive(Debug)]
pub struct InMemoryLedger {
    contracts: RwLock<HashMap<String, AttestationKey>>,
    latency: Duration,
    online: AtomicBool,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl InMemoryLedger {
    pub fn new(latency: Duration) -> Self {
        Self {
            contracts: RwLock::new(HashMap::new()),
            latency,
            online: AtomicBool::new(true),
        }
    }

    /// Deploys a verifier contract that accepts proofs sealed with `key`, returning its address.
    pub fn deploy_verifier(&self, key: AttestationKey) -> String {
        let mut contracts = self.contracts.write().unwrap_or_else(PoisonError::into_inner);
        let mut seed = (contracts.len() as u64).to_le_bytes().to_vec();
        seed.extend_from_slice(&rand::random::<[u8; 16]>());
        let digest = *risc0_zkvm::sha::Impl::hash_bytes(&seed);
        let address = format!("0x{}", hex::encode(&digest.as_bytes()[..20]));
        tracing::info!("deployed verifier contract at {}", address);
        contracts.insert(address.clone(), key);
        address
    }

    /// Takes the ledger offline; calls fail with [LedgerError::Unreachable] until it is back.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Ledger for InMemoryLedger {
    fn call_verify(&self, contract: &str, call: &VerifyCall) -> Result<bool, LedgerError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(LedgerError::Unreachable);
        }

        let contracts = self.contracts.read().unwrap_or_else(PoisonError::into_inner);
        let key = contracts
            .get(contract)
            .ok_or_else(|| LedgerError::UnknownContract(contract.to_string()))?;

        // The contract answers false for anything it cannot verify.
        let Ok(fire_result) = FireResult::try_from(call.fire_result) else {
            return Ok(false);
        };
        let target = Position::new(call.x, call.y);
        Ok(check_proof(key, &call.proof, target, fire_result).is_ok())
    }
}
