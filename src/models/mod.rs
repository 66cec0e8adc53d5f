pub mod day_data;
pub mod pool;
pub mod series;
pub mod swap;

pub use day_data::{ExchangeDayRecord, PoolDayRecord};
pub use pool::{PoolRecord, TokenInfo};
pub use series::{DailyCount, ExchangeDayRow, PoolDayRow, PoolSwapDaily, SwapDaily};
pub use swap::SwapRecord;
