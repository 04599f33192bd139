pub mod balance;

pub use balance::ExplorerBalanceSource;
