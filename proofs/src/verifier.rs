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
    fmt::Display,
    str::FromStr,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
};

use salvo_core::{EventHub, FireResult, Position, ValidationResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    attestation::{check_proof, AttestationKey},
    ledger::{Ledger, VerifyCall},
};

/// Which verifier backend checks proofs.
#[derive(Copy, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, Hash)]
pub enum VerifyMethod {
    #[default]
    Local,
    OnChain,
}

impl Display for VerifyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyMethod::Local => f.write_str("Local"),
            VerifyMethod::OnChain => f.write_str("OnChain"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown verify method '{0}', expected 'Local' or 'OnChain'")]
pub struct UnknownVerifyMethod(pub String);

impl FromStr for VerifyMethod {
    type Err = UnknownVerifyMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Local" | "JavaScript" => Ok(VerifyMethod::Local),
            "OnChain" | "Web3" => Ok(VerifyMethod::OnChain),
            other => Err(UnknownVerifyMethod(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifyRequest {
    pub proof: Vec<u8>,
    pub fire_result: FireResult,
    pub target: Position,
    /// Address of the verifier contract. Only used by [VerifyMethod::OnChain].
    pub contract_address: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifierError {
    #[error("on-chain verification needs a contract address")]
    MissingContractAddress,

    #[error("{0} verifier has stopped")]
    Stopped(VerifyMethod),
}

/// A backend that checks proofs asynchronously.
///
/// [VerifierBackend::verify] only queues the request. The verdict is published as a
/// [ValidationResult] on the hub the backend was built with; a backend that cannot reach its
/// verifier publishes nothing.
pub trait VerifierBackend {
    fn method(&self) -> VerifyMethod;

    fn verify(&self, request: VerifyRequest) -> Result<(), VerifierError>;
}

/// Worker thread consuming verify requests from a queue.
struct Worker {
    requests: Option<Sender<VerifyRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(
        name: &str,
        run: impl FnOnce(Receiver<VerifyRequest>) + Send + 'static,
    ) -> std::io::Result<Self> {
        let (requests, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(rx))?;
        Ok(Self {
            requests: Some(requests),
            handle: Some(handle),
        })
    }

    fn send(&self, method: VerifyMethod, request: VerifyRequest) -> Result<(), VerifierError> {
        self.requests
            .as_ref()
            .ok_or(VerifierError::Stopped(method))?
            .send(request)
            .map_err(|_| VerifierError::Stopped(method))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        drop(self.requests.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("verifier worker panicked");
            }
        }
    }
}

fn publish(validity: &EventHub<ValidationResult>, target: Position, is_valid: bool) {
    if validity.publish(ValidationResult { target, is_valid }) == 0 {
        tracing::debug!("no subscriber for validity at {}", target);
    }
}

/// Checks proofs in process.
pub struct LocalVerifier {
    worker: Worker,
}

impl LocalVerifier {
    pub fn spawn(
        key: AttestationKey,
        validity: EventHub<ValidationResult>,
    ) -> std::io::Result<Self> {
        let worker = Worker::spawn("salvo-verify-local", move |requests| {
            for request in requests {
                let is_valid =
                    match check_proof(&key, &request.proof, request.target, request.fire_result) {
                        Ok(()) => true,
                        Err(err) => {
                            tracing::info!("proof at {} rejected: {}", request.target, err);
                            false
                        }
                    };
                publish(&validity, request.target, is_valid);
            }
        })?;
        Ok(Self { worker })
    }
}

impl VerifierBackend for LocalVerifier {
    fn method(&self) -> VerifyMethod {
        VerifyMethod::Local
    }

    fn verify(&self, request: VerifyRequest) -> Result<(), VerifierError> {
        self.worker.send(VerifyMethod::Local, request)
    }
}

/// Checks proofs by calling a verifier contract on a [Ledger].
pub struct OnChainVerifier {
    worker: Worker,
}

impl OnChainVerifier {
    pub fn spawn(
        ledger: Arc<dyn Ledger>,
        validity: EventHub<ValidationResult>,
    ) -> std::io::Result<Self> {
        let worker = Worker::spawn("salvo-verify-onchain", move |requests| {
            for request in requests {
                let Some(contract) = request.contract_address.as_deref() else {
                    tracing::warn!("dropping on-chain request for {} without contract", request.target);
                    continue;
                };
                let call = VerifyCall {
                    proof: request.proof.clone(),
                    fire_result: request.fire_result.into(),
                    x: request.target.x,
                    y: request.target.y,
                };
                match ledger.call_verify(contract, &call) {
                    Ok(is_valid) => publish(&validity, request.target, is_valid),
                    Err(err) => {
                        tracing::warn!(
                            "verifier call for {} at {} failed: {}",
                            request.target,
                            contract,
                            err
                        );
                    }
                }
            }
        })?;
        Ok(Self { worker })
    }
}

impl VerifierBackend for OnChainVerifier {
    fn method(&self) -> VerifyMethod {
        VerifyMethod::OnChain
    }

    fn verify(&self, request: VerifyRequest) -> Result<(), VerifierError> {
        if request
            .contract_address
            .as_deref()
            .map_or(true, str::is_empty)
        {
            return Err(VerifierError::MissingContractAddress);
        }
        self.worker.send(VerifyMethod::OnChain, request)
    }
}
