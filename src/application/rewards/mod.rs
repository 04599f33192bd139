pub mod claimer;

pub use claimer::{ClaimOutcome, RewardsClaimer};
