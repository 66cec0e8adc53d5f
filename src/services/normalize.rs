//! Daily time-series transforms shared by all exchange adapters.
//!
//! Everything here is a pure function over ordered record sequences. The
//! gap-filling routines take `today` as an argument instead of reading the
//! clock so tests can pin the upper bound of the date index.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    DailyCount, ExchangeDayRecord, ExchangeDayRow, PoolDayRecord, PoolDayRow, PoolRecord,
    PoolSwapDaily, SwapDaily, SwapRecord,
};

/// Buckets a list of days, gap-fills the range from the earliest observed
/// day through `today` inclusive with zero counts, and attaches the running
/// total. Empty input yields an empty series.
pub fn daily_new_counts(days: &[NaiveDate], today: NaiveDate) -> Vec<DailyCount> {
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for day in days {
        *buckets.entry(*day).or_insert(0) += 1;
    }
    let Some((&start, _)) = buckets.first_key_value() else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut total = 0;
    for date in start.iter_days().take_while(|d| *d <= today) {
        let new_count = buckets.get(&date).copied().unwrap_or(0);
        total += new_count;
        rows.push(DailyCount {
            date,
            new_count,
            total_count: total,
        });
    }
    rows
}

/// Daily and cumulative pool creation counts.
pub fn pool_daily_counts(pools: &[PoolRecord], today: NaiveDate) -> Vec<DailyCount> {
    let days: Vec<NaiveDate> = pools.iter().map(|p| p.datetime.date_naive()).collect();
    daily_new_counts(&days, today)
}

/// Daily and cumulative token deployment counts.
///
/// A token shows up on either side of any number of pools; it counts as new
/// exactly once, on its earliest appearance. Ties on the same instant are
/// broken by record order so the flag stays unique per token.
pub fn token_daily_counts(pools: &[PoolRecord], today: NaiveDate) -> Vec<DailyCount> {
    let mut appearances: Vec<(&str, DateTime<Utc>)> = Vec::with_capacity(pools.len() * 2);
    for pool in pools {
        appearances.push((pool.token0.id.as_str(), pool.datetime));
        appearances.push((pool.token1.id.as_str(), pool.datetime));
    }

    let mut earliest: HashMap<&str, DateTime<Utc>> = HashMap::new();
    for &(token, datetime) in &appearances {
        earliest
            .entry(token)
            .and_modify(|e| {
                if datetime < *e {
                    *e = datetime;
                }
            })
            .or_insert(datetime);
    }

    let mut flagged: HashSet<&str> = HashSet::new();
    let mut days = Vec::new();
    for &(token, datetime) in &appearances {
        if earliest[token] == datetime && flagged.insert(token) {
            days.push(datetime.date_naive());
        }
    }
    daily_new_counts(&days, today)
}

/// Exchange-wide daily swap counts and fee sums, gap-filled to `today`,
/// with running totals. Fee columns stay `None` when no swap carries one.
pub fn swap_daily_series(swaps: &[SwapRecord], today: NaiveDate) -> Vec<SwapDaily> {
    let has_fees = swaps.iter().any(|s| s.fee_usd.is_some());

    let mut buckets: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
    for swap in swaps {
        let entry = buckets
            .entry(swap.datetime.date_naive())
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += swap.fee_usd.unwrap_or(0.0);
    }
    let Some((&start, _)) = buckets.first_key_value() else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut total_count = 0u64;
    let mut total_fee = 0f64;
    for date in start.iter_days().take_while(|d| *d <= today) {
        let (count, fee) = buckets.get(&date).copied().unwrap_or((0, 0.0));
        total_count += count;
        total_fee += fee;
        rows.push(SwapDaily {
            date,
            new_swap_count: count,
            daily_fee_in_usd: has_fees.then_some(fee),
            total_swap_count: total_count,
            total_fee_in_usd: has_fees.then_some(total_fee),
        });
    }
    rows
}

/// Per-pool daily swap counts and fee sums with per-pool running totals.
/// Sparse by design: no gap-filling, only (pool, day) pairs that traded.
pub fn swaps_by_pool(swaps: &[SwapRecord]) -> Vec<PoolSwapDaily> {
    let has_fees = swaps.iter().any(|s| s.fee_usd.is_some());

    let mut buckets: BTreeMap<(String, NaiveDate), (u64, f64)> = BTreeMap::new();
    for swap in swaps {
        let entry = buckets
            .entry((swap.pool_id.clone(), swap.datetime.date_naive()))
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += swap.fee_usd.unwrap_or(0.0);
    }

    // BTreeMap order groups each pool's days ascending, which is exactly
    // what the running sums need.
    let mut rows = Vec::with_capacity(buckets.len());
    let mut totals: HashMap<String, (u64, f64)> = HashMap::new();
    for ((pool_id, date), (count, fee)) in buckets {
        let running = totals.entry(pool_id.clone()).or_insert((0, 0.0));
        running.0 += count;
        running.1 += fee;
        rows.push(PoolSwapDaily {
            pool_id,
            date,
            new_swap_count: count,
            daily_fee_in_usd: has_fees.then_some(fee),
            total_swap_count: running.0,
            total_fee_in_usd: has_fees.then_some(running.1),
        });
    }
    rows
}

/// Sorts exchange day-data ascending and fills in the derived columns:
/// per-day transaction deltas from the server's running total, and running
/// sums for volume and (where present) fees. The server does not guarantee
/// row order, so the sort is mandatory before differencing.
pub fn finalize_exchange_day(rows: &mut [ExchangeDayRecord]) {
    rows.sort_by_key(|r| r.date);

    let mut prev_transactions = 0u64;
    let mut volume_eth = 0f64;
    let mut volume_usd = 0f64;
    let mut fee_eth = 0f64;
    let mut fee_usd = 0f64;
    for row in rows.iter_mut() {
        row.daily_transactions = row.total_transactions.saturating_sub(prev_transactions);
        prev_transactions = row.total_transactions;

        volume_eth += row.daily_volume_eth;
        volume_usd += row.daily_volume_usd;
        row.total_volume_eth = volume_eth;
        row.total_volume_usd = volume_usd;

        if let Some(fee) = row.daily_fee_usd {
            fee_usd += fee;
            row.total_fee_usd = Some(fee_usd);
        }
        if let Some(fee) = row.daily_fee_eth {
            fee_eth += fee;
            row.total_fee_eth = Some(fee_eth);
        }
    }
}

/// Attaches the global swap series to the exchange day-data, matched on
/// date. Both inputs are one-row-per-day with disjoint columns, so this is
/// a plain lookup join; days without a swap row keep `None` swap columns.
pub fn join_exchange_day(days: Vec<ExchangeDayRecord>, swaps: &[SwapDaily]) -> Vec<ExchangeDayRow> {
    let by_date: HashMap<NaiveDate, &SwapDaily> = swaps.iter().map(|s| (s.date, s)).collect();

    days.into_iter()
        .map(|day| {
            let swap = by_date.get(&day.date).copied();
            ExchangeDayRow {
                new_swap_count: swap.map(|s| s.new_swap_count),
                daily_fee_in_usd: swap.and_then(|s| s.daily_fee_in_usd),
                total_swap_count: swap.map(|s| s.total_swap_count),
                total_fee_in_usd: swap.and_then(|s| s.total_fee_in_usd),
                day,
            }
        })
        .collect()
}

/// Left-merges pool day-data with the per-pool swap series on (pool, date)
/// and recomputes the pool-scoped cumulative volume and transaction count
/// from the daily columns. The upstream cumulative totals are not trusted;
/// these running sums are the values carried downstream.
pub fn join_pool_day(mut days: Vec<PoolDayRecord>, swaps: &[PoolSwapDaily]) -> Vec<PoolDayRow> {
    let by_key: HashMap<(&str, NaiveDate), &PoolSwapDaily> = swaps
        .iter()
        .map(|s| ((s.pool_id.as_str(), s.date), s))
        .collect();

    days.sort_by(|a, b| a.pool_id.cmp(&b.pool_id).then(a.date.cmp(&b.date)));

    let mut totals: HashMap<String, (f64, u64)> = HashMap::new();
    days.into_iter()
        .map(|day| {
            let swap = by_key.get(&(day.pool_id.as_str(), day.date)).copied();
            let running = totals.entry(day.pool_id.clone()).or_insert((0.0, 0));
            running.0 += day.daily_volume_usd;
            running.1 += day.daily_transactions;
            let (total_volume_usd, total_transactions) = *running;

            PoolDayRow {
                date: day.date,
                daily_volume_usd: day.daily_volume_usd,
                total_liquidity_usd: day.total_liquidity_usd,
                daily_fee_usd: day.daily_fee_usd,
                daily_transactions: day.daily_transactions,
                new_swap_count: swap.map(|s| s.new_swap_count),
                daily_fee_in_usd: swap.and_then(|s| s.daily_fee_in_usd),
                total_swap_count: swap.map(|s| s.total_swap_count),
                total_fee_in_usd: swap.and_then(|s| s.total_fee_in_usd),
                total_volume_usd,
                total_transactions,
                total_fee_usd: None,
                pool_id: day.pool_id,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TokenInfo;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instant(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap().and_utc()
    }

    fn token(id: &str) -> TokenInfo {
        TokenInfo {
            id: id.to_string(),
            name: id.to_uppercase(),
            symbol: id.to_uppercase(),
            decimals: 18,
        }
    }

    fn pool(id: &str, token0: &str, token1: &str, created: DateTime<Utc>) -> PoolRecord {
        PoolRecord {
            id: id.to_string(),
            token0: token(token0),
            token1: token(token1),
            block: 1,
            datetime: created,
        }
    }

    fn swap(id: &str, pool_id: &str, at: DateTime<Utc>, fee: Option<f64>) -> SwapRecord {
        SwapRecord {
            id: id.to_string(),
            block: 1,
            datetime: at,
            pool_id: pool_id.to_string(),
            from: "0xabc".to_string(),
            fee_usd: fee,
        }
    }

    #[test]
    fn daily_counts_index_is_dense_through_today() {
        let days = vec![date(2024, 1, 1), date(2024, 1, 1), date(2024, 1, 4)];
        let rows = daily_new_counts(&days, date(2024, 1, 6));

        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 2),
                date(2024, 1, 3),
                date(2024, 1, 4),
                date(2024, 1, 5),
                date(2024, 1, 6),
            ]
        );
        let new_counts: Vec<u64> = rows.iter().map(|r| r.new_count).collect();
        assert_eq!(new_counts, vec![2, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn cumulative_is_running_sum_of_daily() {
        let days = vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 3)];
        let rows = daily_new_counts(&days, date(2024, 1, 4));

        let mut running = 0;
        for row in &rows {
            running += row.new_count;
            assert_eq!(row.total_count, running);
        }
        assert_eq!(rows.last().unwrap().total_count, 3);
    }

    #[test]
    fn empty_input_yields_empty_series() {
        assert!(daily_new_counts(&[], date(2024, 1, 1)).is_empty());
        assert!(swap_daily_series(&[], date(2024, 1, 1)).is_empty());
        assert!(pool_daily_counts(&[], date(2024, 1, 1)).is_empty());
        assert!(token_daily_counts(&[], date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn token_counted_once_at_first_appearance() {
        // "b" appears in two pools on different days; only the first counts.
        let pools = vec![
            pool("p1", "a", "b", instant(2024, 1, 1, 10)),
            pool("p2", "b", "c", instant(2024, 1, 3, 10)),
        ];
        let rows = token_daily_counts(&pools, date(2024, 1, 3));

        let new_counts: Vec<u64> = rows.iter().map(|r| r.new_count).collect();
        assert_eq!(new_counts, vec![2, 0, 1]); // a+b, -, c
        assert_eq!(rows.last().unwrap().total_count, 3);
    }

    #[test]
    fn token_tie_on_same_instant_still_counts_once() {
        let at = instant(2024, 1, 1, 10);
        let pools = vec![pool("p1", "a", "b", at), pool("p2", "b", "c", at)];
        let rows = token_daily_counts(&pools, date(2024, 1, 1));

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].new_count, 3);
    }

    #[test]
    fn swap_series_sums_fees_and_gap_fills() {
        let swaps = vec![
            swap("s1", "p1", instant(2024, 1, 1, 1), Some(2.0)),
            swap("s2", "p1", instant(2024, 1, 1, 2), Some(3.0)),
            swap("s3", "p2", instant(2024, 1, 3, 1), Some(1.0)),
        ];
        let rows = swap_daily_series(&swaps, date(2024, 1, 3));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].new_swap_count, 2);
        assert_eq!(rows[0].daily_fee_in_usd, Some(5.0));
        assert_eq!(rows[1].new_swap_count, 0);
        assert_eq!(rows[1].daily_fee_in_usd, Some(0.0));
        assert_eq!(rows[2].total_swap_count, 3);
        assert_eq!(rows[2].total_fee_in_usd, Some(6.0));
    }

    #[test]
    fn swap_series_without_fee_column_keeps_none() {
        let swaps = vec![swap("s1", "p1", instant(2024, 1, 1, 1), None)];
        let rows = swap_daily_series(&swaps, date(2024, 1, 2));

        assert!(rows.iter().all(|r| r.daily_fee_in_usd.is_none()));
        assert!(rows.iter().all(|r| r.total_fee_in_usd.is_none()));
        assert_eq!(rows[0].new_swap_count, 1);
    }

    #[test]
    fn swaps_by_pool_runs_per_pool_totals() {
        let swaps = vec![
            swap("s1", "p1", instant(2024, 1, 1, 1), Some(1.0)),
            swap("s2", "p2", instant(2024, 1, 1, 2), Some(10.0)),
            swap("s3", "p1", instant(2024, 1, 2, 1), Some(2.0)),
            swap("s4", "p1", instant(2024, 1, 2, 2), Some(3.0)),
        ];
        let rows = swaps_by_pool(&swaps);

        assert_eq!(rows.len(), 3);
        let p1_day2 = rows
            .iter()
            .find(|r| r.pool_id == "p1" && r.date == date(2024, 1, 2))
            .unwrap();
        assert_eq!(p1_day2.new_swap_count, 2);
        assert_eq!(p1_day2.total_swap_count, 3);
        assert_eq!(p1_day2.total_fee_in_usd, Some(6.0));

        let p2 = rows.iter().find(|r| r.pool_id == "p2").unwrap();
        assert_eq!(p2.total_swap_count, 1);
        assert_eq!(p2.total_fee_in_usd, Some(10.0));
    }

    fn day_record(date: NaiveDate, volume_usd: f64, total_transactions: u64) -> ExchangeDayRecord {
        ExchangeDayRecord {
            date,
            daily_volume_eth: 0.0,
            daily_volume_usd: volume_usd,
            daily_volume_untracked: 0.0,
            total_liquidity_eth: None,
            total_liquidity_usd: 0.0,
            daily_fee_eth: None,
            daily_fee_usd: None,
            total_transactions,
            daily_transactions: 0,
            total_volume_eth: 0.0,
            total_volume_usd: 0.0,
            total_fee_eth: None,
            total_fee_usd: None,
        }
    }

    #[test]
    fn transaction_deltas_from_running_totals() {
        let mut rows = vec![
            day_record(date(2024, 1, 1), 1.0, 10),
            day_record(date(2024, 1, 2), 1.0, 10),
            day_record(date(2024, 1, 3), 1.0, 25),
        ];
        finalize_exchange_day(&mut rows);

        let deltas: Vec<u64> = rows.iter().map(|r| r.daily_transactions).collect();
        assert_eq!(deltas, vec![10, 0, 15]);
    }

    #[test]
    fn finalize_sorts_before_differencing() {
        let mut rows = vec![
            day_record(date(2024, 1, 3), 3.0, 25),
            day_record(date(2024, 1, 1), 1.0, 10),
            day_record(date(2024, 1, 2), 2.0, 10),
        ];
        finalize_exchange_day(&mut rows);

        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
        let volumes: Vec<f64> = rows.iter().map(|r| r.total_volume_usd).collect();
        assert_eq!(volumes, vec![1.0, 3.0, 6.0]);
    }

    #[test]
    fn exchange_join_attaches_swap_columns_by_date() {
        let days = vec![day_record(date(2024, 1, 1), 1.0, 1), day_record(date(2024, 1, 2), 2.0, 2)];
        let swaps = vec![SwapDaily {
            date: date(2024, 1, 1),
            new_swap_count: 4,
            daily_fee_in_usd: Some(1.5),
            total_swap_count: 4,
            total_fee_in_usd: Some(1.5),
        }];
        let rows = join_exchange_day(days, &swaps);

        assert_eq!(rows[0].new_swap_count, Some(4));
        assert_eq!(rows[0].daily_fee_in_usd, Some(1.5));
        assert_eq!(rows[1].new_swap_count, None);
    }

    fn pool_day(pool_id: &str, date: NaiveDate, volume: f64, transactions: u64) -> PoolDayRecord {
        PoolDayRecord {
            date,
            pool_id: pool_id.to_string(),
            daily_volume_usd: volume,
            total_liquidity_usd: 100.0,
            daily_fee_usd: None,
            daily_transactions: transactions,
        }
    }

    #[test]
    fn pool_day_join_recomputes_cumulative_volume() {
        let days = vec![
            pool_day("p1", date(2024, 1, 1), 5.0, 1),
            pool_day("p1", date(2024, 1, 2), 3.0, 2),
        ];
        let rows = join_pool_day(days, &[]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_volume_usd, 5.0);
        assert_eq!(rows[1].total_volume_usd, 8.0);
        assert_eq!(rows[1].total_transactions, 3);
        assert!(rows.iter().all(|r| r.new_swap_count.is_none()));
    }

    #[test]
    fn pool_day_join_is_scoped_per_pool() {
        let days = vec![
            pool_day("p2", date(2024, 1, 1), 7.0, 1),
            pool_day("p1", date(2024, 1, 2), 3.0, 1),
            pool_day("p1", date(2024, 1, 1), 5.0, 1),
        ];
        let swaps = vec![PoolSwapDaily {
            pool_id: "p1".to_string(),
            date: date(2024, 1, 1),
            new_swap_count: 2,
            daily_fee_in_usd: Some(0.5),
            total_swap_count: 2,
            total_fee_in_usd: Some(0.5),
        }];
        let rows = join_pool_day(days, &swaps);

        let p1: Vec<&PoolDayRow> = rows.iter().filter(|r| r.pool_id == "p1").collect();
        assert_eq!(p1[0].date, date(2024, 1, 1));
        assert_eq!(p1[0].total_volume_usd, 5.0);
        assert_eq!(p1[0].new_swap_count, Some(2));
        assert_eq!(p1[1].total_volume_usd, 8.0);
        assert_eq!(p1[1].new_swap_count, None);

        let p2 = rows.iter().find(|r| r.pool_id == "p2").unwrap();
        assert_eq!(p2.total_volume_usd, 7.0);
    }
}
