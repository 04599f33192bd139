pub mod app;
pub mod runner;

pub use app::{Adapters, Application};
pub use runner::{AgentRunner, CycleReport, CycleSteps, Schedule, ScheduledTask};
