pub mod error;
pub mod rates;
pub mod series;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use rates::{DateRange, Periodicity, PortfolioWeights, RateAssumptions};
pub use series::ReturnSeries;
