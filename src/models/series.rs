use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ExchangeDayRecord;

/// One row of a gap-filled daily count series (new pools or new tokens).
///
/// The producing routines guarantee a dense date index from the earliest
/// observed day through "today", and `total_count` as the running sum of
/// `new_count` in ascending date order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub new_count: u64,
    pub total_count: u64,
}

/// Exchange-wide daily swap activity, gap-filled to "today".
///
/// Fee columns are `None` on schemas without per-swap fees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapDaily {
    pub date: NaiveDate,
    pub new_swap_count: u64,
    pub daily_fee_in_usd: Option<f64>,
    pub total_swap_count: u64,
    pub total_fee_in_usd: Option<f64>,
}

/// Per-pool daily swap activity. Sparse: one row per (pool, day) that saw
/// at least one swap; cumulative columns are per-pool running sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSwapDaily {
    pub pool_id: String,
    pub date: NaiveDate,
    pub new_swap_count: u64,
    pub daily_fee_in_usd: Option<f64>,
    pub total_swap_count: u64,
    pub total_fee_in_usd: Option<f64>,
}

/// Exchange day-data joined with the global swap series on date.
/// Swap columns are `None` for dates with no swap-series row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeDayRow {
    #[serde(flatten)]
    pub day: ExchangeDayRecord,
    pub new_swap_count: Option<u64>,
    pub daily_fee_in_usd: Option<f64>,
    pub total_swap_count: Option<u64>,
    pub total_fee_in_usd: Option<f64>,
}

/// Pool day-data left-merged with the per-pool swap series on
/// (pool, date), with the pool-scoped cumulative columns recomputed from
/// the daily values. `total_fee_usd` is only populated by the Kim AMM
/// adapter's join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolDayRow {
    pub date: NaiveDate,
    pub pool_id: String,
    pub daily_volume_usd: f64,
    pub total_liquidity_usd: f64,
    pub daily_fee_usd: Option<f64>,
    pub daily_transactions: u64,
    pub new_swap_count: Option<u64>,
    pub daily_fee_in_usd: Option<f64>,
    pub total_swap_count: Option<u64>,
    pub total_fee_in_usd: Option<f64>,
    pub total_volume_usd: f64,
    pub total_transactions: u64,
    pub total_fee_usd: Option<f64>,
}
