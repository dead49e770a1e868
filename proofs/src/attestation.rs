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

//! Proof blob carried by a [salvo_core::FireOutcome].
//!
//! A [FireProof] binds a shot and its claimed result to the prover's fleet commitment with a
//! seal keyed by an [AttestationKey] shared between prover and verifiers.

use risc0_zkvm::sha::{Digest, Sha256};
use salvo_core::{FireResult, Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttestationKey([u8; 32]);

impl AttestationKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl std::fmt::Debug for AttestationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AttestationKey(..)")
    }
}

#[derive(Debug, Error)]
pub enum ProofError {
    #[error("malformed proof: {0}")]
    Malformed(#[from] bincode::Error),

    #[error("proof is for {proved}, not {expected}")]
    TargetMismatch { proved: Position, expected: Position },

    #[error("proof claims {proved:?}, not {expected:?}")]
    ResultMismatch {
        proved: FireResult,
        expected: FireResult,
    },

    #[error("proof seal does not match")]
    BadSeal,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct FireProof {
    pub commitment: Digest,
    pub target: Position,
    pub fire_result: FireResult,
    pub seal: Digest,
}

fn seal_digest(
    key: &AttestationKey,
    commitment: &Digest,
    target: Position,
    fire_result: FireResult,
) -> Result<Digest, ProofError> {
    let bytes = bincode::serialize(&(key.0, commitment, target, fire_result))?;
    Ok(*risc0_zkvm::sha::Impl::hash_bytes(&bytes))
}

impl FireProof {
    pub fn seal(
        key: &AttestationKey,
        commitment: Digest,
        target: Position,
        fire_result: FireResult,
    ) -> Result<Self, ProofError> {
        let seal = seal_digest(key, &commitment, target, fire_result)?;
        Ok(Self {
            commitment,
            target,
            fire_result,
            seal,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProofError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProofError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Checks that the proof covers `target` and `fire_result` and that its seal was made with
    /// `key`.
    pub fn check(
        &self,
        key: &AttestationKey,
        target: Position,
        fire_result: FireResult,
    ) -> Result<(), ProofError> {
        if self.target != target {
            return Err(ProofError::TargetMismatch {
                proved: self.target,
                expected: target,
            });
        }
        if self.fire_result != fire_result {
            return Err(ProofError::ResultMismatch {
                proved: self.fire_result,
                expected: fire_result,
            });
        }
        if seal_digest(key, &self.commitment, self.target, self.fire_result)? != self.seal {
            return Err(ProofError::BadSeal);
        }
        Ok(())
    }
}

/// Decodes `proof` and checks it in one step.
pub fn check_proof(
    key: &AttestationKey,
    proof: &[u8],
    target: Position,
    fire_result: FireResult,
) -> Result<(), ProofError> {
    FireProof::decode(proof)?.check(key, target, fire_result)
}
