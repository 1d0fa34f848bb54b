pub mod error;
pub mod filters;
pub mod movie;
pub mod runtime;
pub mod search;

use std::{future::Future, str::FromStr, time::Duration};

pub use error::{Error, ValidationErrors};
pub use filters::{Filters, Metadata, SortColumn, SortOrder, calculate_metadata};
pub use runtime::Runtime;
pub use sqlx::Error as SqlxError;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type ChosenRow = sqlx::sqlite::SqliteRow;
pub type Pool = sqlx::Pool<ChosenDB>;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Opens the pool and brings the schema up to date.
pub async fn new_pool(database_url: &str, max_connections: u32) -> Result<Pool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}

/// One page of listing results.
#[derive(Debug, Clone, Serialize)]
pub struct Batch<T> {
    pub rows: Vec<T>,
    pub metadata: Metadata,
}

impl<T> Batch<T> {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            metadata: Metadata::default(),
        }
    }
}

pub(crate) async fn with_timeout<F, T, E>(timeout: Duration, query: F) -> Result<T>
where
    F: Future<Output = Result<T, E>>,
    Error: From<E>,
{
    match tokio::time::timeout(timeout, query).await {
        Ok(res) => Ok(res?),
        Err(_) => {
            debug!("Query exceeded timeout of {timeout:?}");
            Err(Error::Timeout)
        }
    }
}
