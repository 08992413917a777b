//! 인덱스 파이프라인의 도메인 모델.

mod candle;
mod record;
mod sector;

pub use candle::*;
pub use record::*;
pub use sector::*;
