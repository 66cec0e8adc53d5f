use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One exchange-wide daily snapshot.
///
/// The upstream schemas disagree on which columns exist: V2 has no fee
/// columns, V3 has no native-asset liquidity, the Kim fork has both fee
/// denominations. Missing columns stay `None` for that adapter.
///
/// `daily_transactions` and the `total_*` volume/fee columns are derived
/// during parsing (delta from the running total, running sums of the
/// daily columns), not taken from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeDayRecord {
    pub date: NaiveDate,
    pub daily_volume_eth: f64,
    pub daily_volume_usd: f64,
    pub daily_volume_untracked: f64,
    pub total_liquidity_eth: Option<f64>,
    pub total_liquidity_usd: f64,
    pub daily_fee_eth: Option<f64>,
    pub daily_fee_usd: Option<f64>,
    pub total_transactions: u64,
    pub daily_transactions: u64,
    pub total_volume_eth: f64,
    pub total_volume_usd: f64,
    pub total_fee_eth: Option<f64>,
    pub total_fee_usd: Option<f64>,
}

/// One per-pool daily snapshot, as parsed (cumulative columns are added
/// later by the pool-day join, which recomputes them from the dailies).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolDayRecord {
    pub date: NaiveDate,
    pub pool_id: String,
    pub daily_volume_usd: f64,
    pub total_liquidity_usd: f64,
    pub daily_fee_usd: Option<f64>,
    pub daily_transactions: u64,
}
