use serde::Deserialize;

use super::graphql::{decode_rows, RawResultSet};
use super::{date_from_epoch, datetime_from_epoch, parse_f64, parse_u64, Exchange, SourceError};
use crate::models::{ExchangeDayRecord, PoolDayRecord, SwapRecord};
use crate::services::normalize;

/// SupSwap V3 subgraph. The pool collection is `pools` with
/// `createdAt*` fields aliased onto the shared shape, day-data exposes
/// fees in USD but no native-asset liquidity, and swaps alias `origin`
/// onto `from`.
pub struct SupSwapV3;

const POOLS_QUERY: &str = r#"
query getPools(
    $skip: Int = 0,
    $first: Int = 1000,
) {
    pools: pools(
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
    exchangeDayDatas: supDayDatas(
        skip: $skip,
        first: $first,
    ) {
        id
        date
        dailyVolumeETH: volumeETH
        dailyVolumeUSD: volumeUSD
        dailyVolumeUntracked: volumeUSDUntracked
        totalLiquidityUSD: tvlUSD
        dailyFeeUSD: feesUSD
        totalTransactions: txCount
    }
}
"#;

const POOL_DAY_QUERY: &str = r#"
query getPoolDayDatas(
    $skip: Int = 0,
    $first: Int = 1000,
) {
    poolDayDatas: poolDayDatas(
        skip: $skip,
        first: $first,
    ) {
        id
        date
        poolId: pool {
            id
        }
        dailyVolumeUSD: volumeUSD
        totalLiquidityUSD: tvlUSD
        dailyFeeUSD: feesUSD
        dailyTransactions: txCount
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
        poolId: pool {
            id
        }
        from: origin
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
    #[serde(rename = "totalLiquidityUSD")]
    total_liquidity_usd: String,
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
    pool_id: RawPoolRef,
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
    #[serde(rename = "amountFeeUSD")]
    amount_fee_usd: String,
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

impl Exchange for SupSwapV3 {
    fn name(&self) -> &'static str {
        "supswap-v3"
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
                    total_liquidity_eth: None,
                    total_liquidity_usd: parse_f64("totalLiquidityUSD", &row.total_liquidity_usd)?,
                    daily_fee_eth: None,
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
                    pool_id: row.pool_id.id,
                })
            })
            .collect()
    }

    fn parse_swaps(&self, raw: &RawResultSet) -> Result<Vec<SwapRecord>, SourceError> {
        let rows: Vec<RawSwap> = decode_rows(raw, "swaps")?;
        rows.into_iter()
            .map(|row| {
                Ok(SwapRecord {
                    block: parse_u64("blockNumber", &row.block.block_number)?,
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_set(field: &str, records: Vec<serde_json::Value>) -> RawResultSet {
        RawResultSet {
            field: field.to_string(),
            records,
        }
    }

    #[test]
    fn exchange_day_accumulates_fee_total() {
        let raw = result_set(
            "exchangeDayDatas",
            vec![
                json!({
                    "id": "19724",
                    "date": 1_704_067_200,
                    "dailyVolumeETH": "1.0",
                    "dailyVolumeUSD": "2000.0",
                    "dailyVolumeUntracked": "0",
                    "totalLiquidityUSD": "16000",
                    "dailyFeeUSD": "6.0",
                    "totalTransactions": "10"
                }),
                json!({
                    "id": "19725",
                    "date": 1_704_153_600,
                    "dailyVolumeETH": "2.0",
                    "dailyVolumeUSD": "4000.0",
                    "dailyVolumeUntracked": "0",
                    "totalLiquidityUSD": "20000",
                    "dailyFeeUSD": "4.0",
                    "totalTransactions": "25"
                }),
            ],
        );
        let days = SupSwapV3.parse_exchange_day(&raw).unwrap();

        assert_eq!(days[0].total_fee_usd, Some(6.0));
        assert_eq!(days[1].total_fee_usd, Some(10.0));
        assert!(days[1].total_liquidity_eth.is_none());
        assert_eq!(days[1].daily_transactions, 15);
    }

    #[test]
    fn pool_day_flattens_nested_pool_reference() {
        let raw = result_set(
            "poolDayDatas",
            vec![json!({
                "id": "0xp1-19724",
                "date": 1_704_067_200,
                "poolId": { "id": "0xp1" },
                "dailyVolumeUSD": "500.5",
                "totalLiquidityUSD": "9000",
                "dailyFeeUSD": "1.5",
                "dailyTransactions": "7"
            })],
        );
        let days = SupSwapV3.parse_pool_day(&raw).unwrap();

        assert_eq!(days[0].pool_id, "0xp1");
        assert_eq!(days[0].daily_fee_usd, Some(1.5));
    }

    #[test]
    fn swaps_read_block_number_alias() {
        let raw = result_set(
            "swaps",
            vec![json!({
                "id": "0xs1",
                "block": { "blockNumber": "456" },
                "timestamp": "1700000000",
                "poolId": { "id": "0xp1" },
                "from": "0xsender",
                "amountFeeUSD": "0.75"
            })],
        );
        let swaps = SupSwapV3.parse_swaps(&raw).unwrap();

        assert_eq!(swaps[0].block, 456);
        assert_eq!(swaps[0].from, "0xsender");
        assert_eq!(swaps[0].fee_usd, Some(0.75));
    }

    #[test]
    fn bad_numeric_string_fails_the_parse() {
        let raw = result_set(
            "swaps",
            vec![json!({
                "id": "0xs1",
                "block": { "blockNumber": "not-a-number" },
                "timestamp": "1700000000",
                "poolId": { "id": "0xp1" },
                "from": "0xsender",
                "amountFeeUSD": "0.75"
            })],
        );
        let err = SupSwapV3.parse_swaps(&raw).unwrap_err();
        assert!(matches!(err, SourceError::Schema(_)));
    }
}
