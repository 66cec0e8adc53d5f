use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One trade event against a pool.
///
/// `fee_usd` is `None` on subgraphs that do not expose a per-swap fee
/// (the Kim AMM schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRecord {
    pub id: String,
    pub block: u64,
    pub datetime: DateTime<Utc>,
    pub pool_id: String,
    pub from: String,
    pub fee_usd: Option<f64>,
}
