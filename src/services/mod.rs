pub mod gatherer;
pub mod normalize;

pub use gatherer::{ExchangeReport, Gatherer};
