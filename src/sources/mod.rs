pub mod graphql;
pub mod kim_amm;
pub mod supswap_v2;
pub mod supswap_v3;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::models::{
    ExchangeDayRecord, ExchangeDayRow, PoolDayRecord, PoolDayRow, PoolRecord, PoolSwapDaily,
    SwapDaily, SwapRecord, TokenInfo,
};
use crate::services::normalize;
use graphql::{query_until_end, QueryExecutor, RawResultSet};

/// One subgraph schema variant. Each adapter supplies the literal query
/// documents for the four query kinds and the matching parse routine that
/// maps that schema's raw rows onto the shared record types.
///
/// The swap aggregations and the joins are shared defaults; an adapter
/// overrides them only when its schema warrants it (Kim AMM adds a
/// per-pool cumulative fee to the pool-day join).
#[async_trait]
pub trait Exchange: Send + Sync {
    fn name(&self) -> &'static str;

    fn pools_query(&self) -> &'static str;
    fn exchange_day_query(&self) -> &'static str;
    fn pool_day_query(&self) -> &'static str;
    fn swaps_query(&self) -> &'static str;

    async fn query_pools(&self, executor: &dyn QueryExecutor) -> Result<RawResultSet, SourceError> {
        query_until_end(executor, self.pools_query()).await
    }

    async fn query_exchange_day(
        &self,
        executor: &dyn QueryExecutor,
    ) -> Result<RawResultSet, SourceError> {
        query_until_end(executor, self.exchange_day_query()).await
    }

    async fn query_pool_day(
        &self,
        executor: &dyn QueryExecutor,
    ) -> Result<RawResultSet, SourceError> {
        query_until_end(executor, self.pool_day_query()).await
    }

    async fn query_swaps(&self, executor: &dyn QueryExecutor) -> Result<RawResultSet, SourceError> {
        query_until_end(executor, self.swaps_query()).await
    }

    /// All three schemas alias their pool fields onto the same shape
    /// (`block`/`timestamp`, nested token descriptors), so the pools parse
    /// is shared.
    fn parse_pools(&self, raw: &RawResultSet) -> Result<Vec<PoolRecord>, SourceError> {
        let rows: Vec<RawPool> = graphql::decode_rows(raw, "pools")?;
        rows.into_iter()
            .map(|row| {
                Ok(PoolRecord {
                    datetime: datetime_from_epoch("timestamp", &row.timestamp)?,
                    block: parse_u64("block", &row.block)?,
                    token0: token_info(row.token0)?,
                    token1: token_info(row.token1)?,
                    id: row.id,
                })
            })
            .collect()
    }

    fn parse_exchange_day(&self, raw: &RawResultSet)
        -> Result<Vec<ExchangeDayRecord>, SourceError>;
    fn parse_pool_day(&self, raw: &RawResultSet) -> Result<Vec<PoolDayRecord>, SourceError>;
    fn parse_swaps(&self, raw: &RawResultSet) -> Result<Vec<SwapRecord>, SourceError>;

    fn swaps_daily(&self, swaps: &[SwapRecord], today: NaiveDate) -> Vec<SwapDaily> {
        normalize::swap_daily_series(swaps, today)
    }

    fn swaps_by_pool(&self, swaps: &[SwapRecord]) -> Vec<PoolSwapDaily> {
        normalize::swaps_by_pool(swaps)
    }

    fn join_exchange_day(
        &self,
        days: Vec<ExchangeDayRecord>,
        swaps: &[SwapDaily],
    ) -> Vec<ExchangeDayRow> {
        normalize::join_exchange_day(days, swaps)
    }

    fn join_pool_day(&self, days: Vec<PoolDayRecord>, swaps: &[PoolSwapDaily]) -> Vec<PoolDayRow> {
        normalize::join_pool_day(days, swaps)
    }
}

/// Looks an adapter up by its configured name.
pub fn exchange_by_name(name: &str) -> Option<Arc<dyn Exchange>> {
    match name {
        "supswap-v2" => Some(Arc::new(supswap_v2::SupSwapV2)),
        "supswap-v3" => Some(Arc::new(supswap_v3::SupSwapV3)),
        "kim-amm" => Some(Arc::new(kim_amm::KimAmm)),
        _ => None,
    }
}

#[derive(Debug)]
pub enum SourceError {
    Network(String),
    Graph(String),
    Parse(String),
    Schema(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Network(e) => write!(f, "Network error: {}", e),
            SourceError::Graph(e) => write!(f, "GraphQL error: {}", e),
            SourceError::Parse(e) => write!(f, "Parse error: {}", e),
            SourceError::Schema(e) => write!(f, "Schema mismatch: {}", e),
        }
    }
}

impl std::error::Error for SourceError {}

#[derive(Debug, Deserialize)]
struct RawToken {
    id: String,
    name: String,
    symbol: String,
    decimals: String,
}

#[derive(Debug, Deserialize)]
struct RawPool {
    id: String,
    token0: RawToken,
    token1: RawToken,
    block: String,
    timestamp: String,
}

fn token_info(raw: RawToken) -> Result<TokenInfo, SourceError> {
    Ok(TokenInfo {
        decimals: raw
            .decimals
            .parse()
            .map_err(|_| SourceError::Schema(format!("bad integer in `decimals`: {}", raw.decimals)))?,
        id: raw.id,
        name: raw.name,
        symbol: raw.symbol,
    })
}

// Subgraphs serialize BigDecimal and BigInt values as JSON strings; these
// coerce them, naming the offending column on failure.

pub(crate) fn parse_f64(column: &str, value: &str) -> Result<f64, SourceError> {
    value
        .parse()
        .map_err(|_| SourceError::Schema(format!("bad float in `{}`: {}", column, value)))
}

pub(crate) fn parse_u64(column: &str, value: &str) -> Result<u64, SourceError> {
    value
        .parse()
        .map_err(|_| SourceError::Schema(format!("bad integer in `{}`: {}", column, value)))
}

pub(crate) fn datetime_from_epoch(
    column: &str,
    value: &str,
) -> Result<DateTime<Utc>, SourceError> {
    let secs: i64 = value
        .parse()
        .map_err(|_| SourceError::Schema(format!("bad timestamp in `{}`: {}", column, value)))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| SourceError::Schema(format!("timestamp out of range in `{}`: {}", column, secs)))
}

pub(crate) fn date_from_epoch(column: &str, secs: i64) -> Result<NaiveDate, SourceError> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| SourceError::Schema(format!("day epoch out of range in `{}`: {}", column, secs)))
}
