//! 파이프라인 실행 모듈.

pub mod backfill;
pub mod incremental;

pub use backfill::{run_backfill, BackfillOptions};
pub use incremental::{run_incremental, IncrementalOptions, UpdateStage};
