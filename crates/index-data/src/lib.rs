//! 인덱스 레코드 저장.
//!
//! 이 crate는 다음을 제공합니다:
//! - IndexStore trait와 PostgreSQL/메모리 구현
//! - 청크 단위 upsert 기록기 (고유 제약 조건 부재 시 insert 폴백)

pub mod error;
pub mod storage;
pub mod writer;

pub use error::{DataError, Result};
pub use storage::memory::MemoryIndexStore;
pub use storage::postgres::{Database, DatabaseConfig, PgIndexStore};
pub use storage::IndexStore;
pub use writer::{PersistenceWriter, WriteReport, DEFAULT_CHUNK_SIZE};
