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

use salvo_proofs::{UnknownVerifyMethod, VerifyMethod};
use thiserror::Error;

pub const VERIFY_METHOD_VAR: &str = "SALVO_VERIFY_METHOD";
pub const CONTRACT_ADDRESS_VAR: &str = "SALVO_CONTRACT_ADDRESS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SALVO_VERIFY_METHOD: {0}")]
    VerifyMethod(#[from] UnknownVerifyMethod),
}

/// How fire outcomes get verified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FireConfig {
    pub verify_method: VerifyMethod,
    /// Verifier contract address, required when `verify_method` is [VerifyMethod::OnChain].
    pub contract_address: Option<String>,
}

impl FireConfig {
    pub fn local() -> Self {
        Self::default()
    }

    pub fn on_chain(contract_address: impl Into<String>) -> Self {
        Self {
            verify_method: VerifyMethod::OnChain,
            contract_address: Some(contract_address.into()),
        }
    }

    /// Reads `SALVO_VERIFY_METHOD` and `SALVO_CONTRACT_ADDRESS` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name: &str| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let verify_method = match lookup(VERIFY_METHOD_VAR) {
            Some(method) if !method.trim().is_empty() => method.trim().parse()?,
            _ => VerifyMethod::default(),
        };
        let contract_address = lookup(CONTRACT_ADDRESS_VAR)
            .map(|address| address.trim().to_string())
            .filter(|address| !address.is_empty());
        Ok(Self {
            verify_method,
            contract_address,
        })
    }

    /// The contract address, if one is set and non-empty.
    pub fn contract_address(&self) -> Option<&str> {
        self.contract_address
            .as_deref()
            .filter(|address| !address.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_to_local() {
        let config = FireConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, FireConfig::local());
        assert_eq!(config.contract_address(), None);
    }

    #[test]
    fn reads_on_chain_settings() {
        let config = FireConfig::from_lookup(lookup(&[
            (VERIFY_METHOD_VAR, "OnChain"),
            (CONTRACT_ADDRESS_VAR, " 0xabc "),
        ]))
        .unwrap();
        assert_eq!(config, FireConfig::on_chain("0xabc"));
    }

    #[test]
    fn empty_address_is_unset() {
        let config =
            FireConfig::from_lookup(lookup(&[(VERIFY_METHOD_VAR, "Web3"), (CONTRACT_ADDRESS_VAR, "")]))
                .unwrap();
        assert_eq!(config.verify_method, VerifyMethod::OnChain);
        assert_eq!(config.contract_address, None);

        let config = FireConfig {
            verify_method: VerifyMethod::OnChain,
            contract_address: Some(String::new()),
        };
        assert_eq!(config.contract_address(), None);
    }

    #[test]
    fn rejects_unknown_method() {
        assert_eq!(
            FireConfig::from_lookup(lookup(&[(VERIFY_METHOD_VAR, "Carrier pigeon")])),
            Err(ConfigError::VerifyMethod(UnknownVerifyMethod(
                "Carrier pigeon".to_string()
            )))
        );
    }
}
