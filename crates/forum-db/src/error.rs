use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("topic references unknown course {0}")]
    UnknownCourse(i64),
}

pub type StoreResult<T> = Result<T, StoreError>;
