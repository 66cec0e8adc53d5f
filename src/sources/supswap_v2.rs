use serde::Deserialize;

use super::graphql::{decode_rows, RawResultSet};
use super::{date_from_epoch, datetime_from_epoch, parse_f64, parse_u64, Exchange, SourceError};
use crate::models::{ExchangeDayRecord, PoolDayRecord, SwapRecord};
use crate::services::normalize;

/// SupSwap V2 subgraph. The pool collection is called `pairs`, day-data
/// carries untracked volume and native-asset liquidity but no fee columns,
/// and swaps expose a per-swap fee in USD.
pub struct SupSwapV2;

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
        block
        timestamp
    }
}
"#;

const EXCHANGE_DAY_QUERY: &str = r#"
query getExchangeDayDatas(
    $skip: Int = 0,
    $first: Int = 1000,
) {
    exchangeDayDatas: supDayDatas(
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
        totalTransactions
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
            block
        }
        timestamp
        poolId: pair {
            id
        }
        from
        amountFeeUSD
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
    #[serde(rename = "amountFeeUSD")]
    amount_fee_usd: String,
}

#[derive(Debug, Deserialize)]
struct RawSwapBlock {
    block: String,
}

#[derive(Debug, Deserialize)]
struct RawPoolRef {
    id: String,
}

impl Exchange for SupSwapV2 {
    fn name(&self) -> &'static str {
        "supswap-v2"
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
                    daily_fee_eth: None,
                    daily_fee_usd: None,
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
                    daily_fee_usd: None,
                    daily_transactions: parse_u64("dailyTransactions", &row.daily_transactions)?,
                    pool_id: row.pool_id,
                })
            })
            .collect()
    }

    fn parse_swaps(&self, raw: &RawResultSet) -> Result<Vec<SwapRecord>, SourceError> {
        let rows: Vec<RawSwap> = decode_rows(raw, "swaps")?;
        rows.into_iter()
            .map(|row| {
                Ok(SwapRecord {
                    block: parse_u64("block", &row.block.block)?,
                    datetime: datetime_from_epoch("timestamp", &row.timestamp)?,
                    pool_id: row.pool_id.id,
                    from: row.from,
                    fee_usd: Some(parse_f64("amountFeeUSD", &row.amount_fee_usd)?),
                    id: row.id,
                })
            })
            .collect()
    }
}
