use std::collections::HashMap;

use serde::Deserialize;

use super::graphql::{decode_rows, RawResultSet};
use super::{date_from_epoch, datetime_from_epoch, parse_f64, parse_u64, Exchange, SourceError};
use crate::models::{ExchangeDayRecord, PoolDayRecord, PoolDayRow, PoolSwapDaily, SwapRecord};
use crate::services::normalize;

/// Kim AMM subgraph, a V2-style fork with V3-style field names. Day-data
/// carries fees in both denominations, swaps expose no per-swap fee, and
/// the pool-day join additionally tracks a per-pool cumulative fee taken
/// from the day-data fee column.
pub struct KimAmm;

const POOLS_QUERY: &str = r#"
query getPools(
    $skip: Int = 0,
    $first: Int = 1000,
) {
    pools: pairs(
        skip: $skip,
        first: $first,
    ) {
        id
        token0 {
            id
            name
            symbol
            decimals
        }
        token1 {
            id
            name
            symbol
            decimals
        }
        block: createdAtBlockNumber
        timestamp: createdAtTimestamp
    }
}
"#;

const EXCHANGE_DAY_QUERY: &str = r#"
query getExchangeDayDatas(
    $skip: Int = 0,
    $first: Int = 1000,
) {
    exchangeDayDatas: uniswapDayDatas(
        skip: $skip,
        first: $first,
    ) {
        id
        date
        dailyVolumeETH
        dailyVolumeUSD
        dailyVolumeUntracked
        totalLiquidityETH
        totalLiquidityUSD
        dailyFeeETH
        dailyFeeUSD
        totalTransactions: txCount
    }
}
"#;

const POOL_DAY_QUERY: &str = r#"
query getPoolDayDatas(
    $skip: Int = 0,
    $first: Int = 1000,
) {
    poolDayDatas: pairDayDatas(
        skip: $skip,
        first: $first,
    ) {
        id
        date
        poolId: pairAddress
        dailyVolumeUSD
        totalLiquidityUSD: reserveUSD
        dailyFeeUSD
        dailyTransactions: dailyTxns
    }
}
"#;

const SWAPS_QUERY: &str = r#"
query getSwaps(
    $skip: Int = 0,
    $first: Int = 1000,
) {
    swaps: swaps(
        skip: $skip,
        first: $first,
    ) {
        id
        block: transaction {
            blockNumber
        }
        timestamp
        poolId: pair {
            id
        }
        from
    }
}
"#;

#[derive(Debug, Deserialize)]
struct RawExchangeDay {
    #[allow(dead_code)]
    id: String,
    date: i64,
    #[serde(rename = "dailyVolumeETH")]
    daily_volume_eth: String,
    #[serde(rename = "dailyVolumeUSD")]
    daily_volume_usd: String,
    #[serde(rename = "dailyVolumeUntracked")]
    daily_volume_untracked: String,
    #[serde(rename = "totalLiquidityETH")]
    total_liquidity_eth: String,
    #[serde(rename = "totalLiquidityUSD")]
    total_liquidity_usd: String,
    #[serde(rename = "dailyFeeETH")]
    daily_fee_eth: String,
    #[serde(rename = "dailyFeeUSD")]
    daily_fee_usd: String,
    #[serde(rename = "totalTransactions")]
    total_transactions: String,
}

#[derive(Debug, Deserialize)]
struct RawPoolDay {
    #[allow(dead_code)]
    id: String,
    date: i64,
    #[serde(rename = "poolId")]
    pool_id: String,
    #[serde(rename = "dailyVolumeUSD")]
    daily_volume_usd: String,
    #[serde(rename = "totalLiquidityUSD")]
    total_liquidity_usd: String,
    #[serde(rename = "dailyFeeUSD")]
    daily_fee_usd: String,
    #[serde(rename = "dailyTransactions")]
    daily_transactions: String,
}

#[derive(Debug, Deserialize)]
struct RawSwap {
    id: String,
    block: RawSwapBlock,
    timestamp: String,
    #[serde(rename = "poolId")]
    pool_id: RawPoolRef,
    from: String,
}

#[derive(Debug, Deserialize)]
struct RawSwapBlock {
    #[serde(rename = "blockNumber")]
    block_number: String,
}

#[derive(Debug, Deserialize)]
struct RawPoolRef {
    id: String,
}

impl Exchange for KimAmm {
    fn name(&self) -> &'static str {
        "kim-amm"
    }

    fn pools_query(&self) -> &'static str {
        POOLS_QUERY
    }

    fn exchange_day_query(&self) -> &'static str {
        EXCHANGE_DAY_QUERY
    }

    fn pool_day_query(&self) -> &'static str {
        POOL_DAY_QUERY
    }

    fn swaps_query(&self) -> &'static str {
        SWAPS_QUERY
    }

    fn parse_exchange_day(
        &self,
        raw: &RawResultSet,
    ) -> Result<Vec<ExchangeDayRecord>, SourceError> {
        let rows: Vec<RawExchangeDay> = decode_rows(raw, "exchangeDayDatas")?;
        let mut records = rows
            .into_iter()
            .map(|row| {
                Ok(ExchangeDayRecord {
                    date: date_from_epoch("date", row.date)?,
                    daily_volume_eth: parse_f64("dailyVolumeETH", &row.daily_volume_eth)?,
                    daily_volume_usd: parse_f64("dailyVolumeUSD", &row.daily_volume_usd)?,
                    daily_volume_untracked: parse_f64(
                        "dailyVolumeUntracked",
                        &row.daily_volume_untracked,
                    )?,
                    total_liquidity_eth: Some(parse_f64(
                        "totalLiquidityETH",
                        &row.total_liquidity_eth,
                    )?),
                    total_liquidity_usd: parse_f64("totalLiquidityUSD", &row.total_liquidity_usd)?,
                    daily_fee_eth: Some(parse_f64("dailyFeeETH", &row.daily_fee_eth)?),
                    daily_fee_usd: Some(parse_f64("dailyFeeUSD", &row.daily_fee_usd)?),
                    total_transactions: parse_u64("totalTransactions", &row.total_transactions)?,
                    daily_transactions: 0,
                    total_volume_eth: 0.0,
                    total_volume_usd: 0.0,
                    total_fee_eth: None,
                    total_fee_usd: None,
                })
            })
            .collect::<Result<Vec<_>, SourceError>>()?;
        normalize::finalize_exchange_day(&mut records);
        Ok(records)
    }

    fn parse_pool_day(&self, raw: &RawResultSet) -> Result<Vec<PoolDayRecord>, SourceError> {
        let rows: Vec<RawPoolDay> = decode_rows(raw, "poolDayDatas")?;
        rows.into_iter()
            .map(|row| {
                Ok(PoolDayRecord {
                    date: date_from_epoch("date", row.date)?,
                    daily_volume_usd: parse_f64("dailyVolumeUSD", &row.daily_volume_usd)?,
                    total_liquidity_usd: parse_f64("totalLiquidityUSD", &row.total_liquidity_usd)?,
                    daily_fee_usd: Some(parse_f64("dailyFeeUSD", &row.daily_fee_usd)?),
                    daily_transactions: parse_u64("dailyTransactions", &row.daily_transactions)?,
                    pool_id: row.pool_id,
                })
            })
            .collect()
    }

    /// This schema has no per-swap fee; `fee_usd` stays `None` and the
    /// downstream swap series carry no fee columns.
    fn parse_swaps(&self, raw: &RawResultSet) -> Result<Vec<SwapRecord>, SourceError> {
        let rows: Vec<RawSwap> = decode_rows(raw, "swaps")?;
        rows.into_iter()
            .map(|row| {
                Ok(SwapRecord {
                    block: parse_u64("blockNumber", &row.block.block_number)?,
                    datetime: datetime_from_epoch("timestamp", &row.timestamp)?,
                    pool_id: row.pool_id.id,
                    from: row.from,
                    fee_usd: None,
                    id: row.id,
                })
            })
            .collect()
    }

    /// Delegates to the shared join, then adds the per-pool cumulative fee
    /// that only this schema's day-data can supply.
    fn join_pool_day(&self, days: Vec<PoolDayRecord>, swaps: &[PoolSwapDaily]) -> Vec<PoolDayRow> {
        let mut rows = normalize::join_pool_day(days, swaps);

        // Rows come back sorted by (pool, date) ascending.
        let mut totals: HashMap<String, f64> = HashMap::new();
        for row in &mut rows {
            if let Some(fee) = row.daily_fee_usd {
                let total = totals.entry(row.pool_id.clone()).or_insert(0.0);
                *total += fee;
                row.total_fee_usd = Some(*total);
            }
        }
        rows
    }
}
