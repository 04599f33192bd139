// Discovery of live contract and relayer addresses
pub mod discovery;

// Accuracy-driven confidence reconciliation
pub mod accuracy;

// Prediction submission
pub mod agents;

// Rewards, profit and automation jobs
pub mod jobs;
pub mod monitoring;
pub mod rewards;

// Wiring and the supervised loop
pub mod system;
