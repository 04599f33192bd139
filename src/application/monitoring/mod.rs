pub mod profit_tracker;

pub use profit_tracker::ProfitTracker;
