use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Platform identifier (lowercase, e.g. "ethereum", "solana", "cardano")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlatformId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PlatformId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Contract execution model of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionModel {
    /// EVM-style account/balance chain with bytecode contracts
    Evm,
    /// Account-model chain with program-owned accounts
    Account,
    /// UTXO-model chain with validator scripts
    Utxo,
}

impl ExecutionModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionModel::Evm => "evm",
            ExecutionModel::Account => "account",
            ExecutionModel::Utxo => "utxo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "evm" => Some(ExecutionModel::Evm),
            "account" => Some(ExecutionModel::Account),
            "utxo" => Some(ExecutionModel::Utxo),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExecutionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A supported blockchain platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub name: String,
    pub execution_model: ExecutionModel,
    pub active: bool,
}

impl Platform {
    pub fn new(id: impl Into<PlatformId>, name: impl Into<String>, model: ExecutionModel) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            execution_model: model,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Registry of known platforms, consulted during request validation and
/// cross-platform pair-risk lookup.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    platforms: HashMap<PlatformId, Platform>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with one representative platform per execution model
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Platform::new("ethereum", "Ethereum", ExecutionModel::Evm));
        registry.register(Platform::new("solana", "Solana", ExecutionModel::Account));
        registry.register(Platform::new("cardano", "Cardano", ExecutionModel::Utxo));
        registry
    }

    pub fn register(&mut self, platform: Platform) {
        self.platforms.insert(platform.id.clone(), platform);
    }

    pub fn get(&self, id: &PlatformId) -> Option<&Platform> {
        self.platforms.get(id)
    }

    pub fn is_known(&self, id: &PlatformId) -> bool {
        self.platforms.contains_key(id)
    }

    pub fn is_active(&self, id: &PlatformId) -> bool {
        self.platforms.get(id).map(|p| p.active).unwrap_or(false)
    }

    pub fn execution_model(&self, id: &PlatformId) -> Option<ExecutionModel> {
        self.platforms.get(id).map(|p| p.execution_model)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
