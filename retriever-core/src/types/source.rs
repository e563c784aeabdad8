//! Source code records returned by the explorer API.

use serde::{Deserialize, Serialize};

use crate::constants::PROXY_FLAG;

// ═══════════════════════════════════════════════════════════════════════════════
// RESPONSE ENVELOPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Envelope of every `getsourcecode` response.
///
/// `result` is either an array of records or, on failure, a plain string
/// describing the problem (e.g. "Invalid API Key").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EtherscanResponse {
    /// "1" on success, "0" on failure
    #[serde(default)]
    pub status: String,
    /// "OK" or "NOTOK"
    #[serde(default)]
    pub message: String,
    /// Records or an error message
    #[serde(default)]
    pub result: serde_json::Value,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE RECORD
// ═══════════════════════════════════════════════════════════════════════════════

/// Verified contract source code and compiler metadata.
///
/// Serialized with the retriever's own field names (`sourceCode`,
/// `contractName`, ...). The explorer sends PascalCase names
/// (`SourceCode`, `ContractName`, ...), which are accepted as aliases.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCode {
    /// Flattened source, or a JSON blob for multi-file contracts
    #[serde(rename = "sourceCode", alias = "SourceCode", default)]
    pub source_code: String,
    /// Contract ABI as a JSON string
    #[serde(rename = "ABI", default)]
    pub abi: String,
    /// Contract name as verified
    #[serde(rename = "contractName", alias = "ContractName", default)]
    pub contract_name: String,
    /// Solidity or Vyper compiler version
    #[serde(rename = "compilerVersion", alias = "CompilerVersion", default)]
    pub compiler_version: String,
    /// "1" if the optimizer was enabled
    #[serde(rename = "optimizationUsed", alias = "OptimizationUsed", default)]
    pub optimization_used: String,
    /// Optimizer runs
    #[serde(rename = "runs", alias = "Runs", default)]
    pub runs: String,
    /// ABI-encoded constructor arguments, hex
    #[serde(rename = "constructorArguments", alias = "ConstructorArguments", default)]
    pub constructor_arguments: String,
    /// Target EVM version
    #[serde(rename = "EVMVersion", default)]
    pub evm_version: String,
    /// Linked libraries
    #[serde(rename = "library", alias = "Library", default)]
    pub library: String,
    /// SPDX license identifier
    #[serde(rename = "licenseType", alias = "LicenseType", default)]
    pub license_type: String,
    /// "1" if the explorer detected a proxy
    #[serde(rename = "proxy", alias = "Proxy", default)]
    pub proxy: String,
    /// Implementation address when `proxy` is set
    #[serde(rename = "implementation", alias = "Implementation", default)]
    pub implementation: String,
    /// Swarm metadata location
    #[serde(rename = "swarmSource", alias = "SwarmSource", default)]
    pub swarm_source: String,
}

impl SourceCode {
    /// Returns the implementation address if this record describes a proxy
    /// that should be followed.
    pub fn proxy_target(&self) -> Option<&str> {
        if self.proxy == PROXY_FLAG && !self.implementation.is_empty() {
            Some(self.implementation.as_str())
        } else {
            None
        }
    }
}
