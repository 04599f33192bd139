pub mod binance;
pub mod core;
pub mod discovery;
pub mod explorer;
pub mod gelato;
pub mod mock;
pub mod notifications;
pub mod persistence;
pub mod predictoor;
