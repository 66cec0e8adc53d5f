use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::normalize;
use crate::models::{
    DailyCount, ExchangeDayRow, PoolDayRow, PoolRecord, PoolSwapDaily, SwapDaily,
};
use crate::sources::graphql::{QueryExecutor, RawResultSet};
use crate::sources::{Exchange, SourceError};

/// Every output table of one gather run. All tables are fresh, in-memory
/// artifacts; nothing is carried over between runs.
pub struct ExchangeReport {
    pub exchange: &'static str,
    pub pools: Vec<PoolRecord>,
    pub pool_counts: Vec<DailyCount>,
    pub token_counts: Vec<DailyCount>,
    pub exchange_day: Vec<ExchangeDayRow>,
    pub pool_day: Vec<PoolDayRow>,
    pub swaps_daily: Vec<SwapDaily>,
    pub swaps_by_pool: Vec<PoolSwapDaily>,
}

/// Runs the fetch → parse → normalize pipeline for one exchange.
pub struct Gatherer {
    exchange: Arc<dyn Exchange>,
    executor: Arc<dyn QueryExecutor>,
}

impl Gatherer {
    pub fn new(exchange: Arc<dyn Exchange>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self { exchange, executor }
    }

    /// Fetches all four query kinds and builds the report. The kinds have
    /// no data dependency on each other, so they are fetched concurrently;
    /// pages within each kind stay sequential. Any failure aborts the whole
    /// run with no partial result.
    pub async fn gather(&self) -> Result<ExchangeReport, SourceError> {
        tracing::info!("Gathering {} ...", self.exchange.name());

        let (pools_raw, exchange_day_raw, pool_day_raw, swaps_raw) = futures::try_join!(
            self.exchange.query_pools(self.executor.as_ref()),
            self.exchange.query_exchange_day(self.executor.as_ref()),
            self.exchange.query_pool_day(self.executor.as_ref()),
            self.exchange.query_swaps(self.executor.as_ref()),
        )?;
        tracing::debug!(
            pools = pools_raw.records.len(),
            exchange_day = exchange_day_raw.records.len(),
            pool_day = pool_day_raw.records.len(),
            swaps = swaps_raw.records.len(),
            "raw result sets fetched"
        );

        let today = Utc::now().date_naive();
        let report = self.build_report(pools_raw, exchange_day_raw, pool_day_raw, swaps_raw, today)?;

        tracing::info!(
            "✓ {}: {} pools, {} exchange-day rows, {} pool-day rows, {} swap-day rows",
            report.exchange,
            report.pools.len(),
            report.exchange_day.len(),
            report.pool_day.len(),
            report.swaps_daily.len(),
        );
        Ok(report)
    }

    fn build_report(
        &self,
        pools_raw: RawResultSet,
        exchange_day_raw: RawResultSet,
        pool_day_raw: RawResultSet,
        swaps_raw: RawResultSet,
        today: NaiveDate,
    ) -> Result<ExchangeReport, SourceError> {
        let pools = self.exchange.parse_pools(&pools_raw)?;
        let exchange_day = self.exchange.parse_exchange_day(&exchange_day_raw)?;
        let pool_day = self.exchange.parse_pool_day(&pool_day_raw)?;
        let swaps = self.exchange.parse_swaps(&swaps_raw)?;

        let pool_counts = normalize::pool_daily_counts(&pools, today);
        let token_counts = normalize::token_daily_counts(&pools, today);
        let swaps_daily = self.exchange.swaps_daily(&swaps, today);
        let swaps_by_pool = self.exchange.swaps_by_pool(&swaps);
        let exchange_day = self.exchange.join_exchange_day(exchange_day, &swaps_daily);
        let pool_day = self.exchange.join_pool_day(pool_day, &swaps_by_pool);

        Ok(ExchangeReport {
            exchange: self.exchange.name(),
            pools,
            pool_counts,
            token_counts,
            exchange_day,
            pool_day,
            swaps_daily,
            swaps_by_pool,
        })
    }
}
