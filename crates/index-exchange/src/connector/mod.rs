//! 거래소 커넥터.

pub mod binance;

pub use binance::BinanceKlineClient;
