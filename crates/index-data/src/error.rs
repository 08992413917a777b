//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 중복 레코드
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// ON CONFLICT 대상 고유 제약 조건이 없음
    #[error("Missing unique constraint: {0}")]
    MissingConstraint(String),

    /// 마이그레이션 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DataError {
    /// 고유 제약 조건이 없어 upsert가 불가능한 경우인지 확인.
    pub fn is_missing_constraint(&self) -> bool {
        matches!(self, DataError::MissingConstraint(_))
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => DataError::PoolExhausted,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                match code.as_ref() {
                    // PostgreSQL 고유 제약 조건 위반
                    "23505" => DataError::DuplicateError(db_err.message().to_string()),
                    // ON CONFLICT 명세와 일치하는 고유/배제 제약 조건 없음
                    "42P10" => DataError::MissingConstraint(db_err.message().to_string()),
                    _ => DataError::QueryError(db_err.message().to_string()),
                }
            }
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
