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

//! Proof generation and the verifier backends that check fire outcomes.

pub mod attestation;
pub mod ledger;
pub mod prover;
pub mod verifier;

pub use attestation::{check_proof, AttestationKey, FireProof, ProofError};
pub use ledger::{InMemoryLedger, Ledger, LedgerError, VerifyCall};
pub use prover::{Prover, SoftwareProver};
pub use verifier::{
    LocalVerifier, OnChainVerifier, UnknownVerifyMethod, VerifierBackend, VerifierError,
    VerifyMethod, VerifyRequest,
};
