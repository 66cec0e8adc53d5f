use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// A trading pair tracked by the exchange, with its creation instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolRecord {
    pub id: String,
    pub token0: TokenInfo,
    pub token1: TokenInfo,
    pub block: u64,
    pub datetime: DateTime<Utc>,
}
