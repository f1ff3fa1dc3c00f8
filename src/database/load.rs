// file: src/database/load.rs
// description: batch load strategies shared by the table managers
// reference: https://docs.rs/clickhouse

use crate::database::schema::truncate_table_sql;
use crate::error::Result;
use clickhouse::{Client, Row};
use serde::Serialize;
use tracing::{debug, info};

/// How a batch lands in its table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoadStrategy {
    /// Truncate the table, then insert the whole batch.
    #[default]
    FullReplace,
}

/// Write `rows` into `table` on one session according to `strategy`; returns the rows written.
pub async fn write_batch<T>(
    session: &Client,
    table: &str,
    rows: &[T],
    strategy: LoadStrategy,
) -> Result<u64>
where
    T: Row + Serialize,
{
    match strategy {
        LoadStrategy::FullReplace => {
            session.query(&truncate_table_sql(table)).execute().await?;
            debug!("Truncated {}", table);
        }
    }

    if rows.is_empty() {
        info!("No rows to load into {}", table);
        return Ok(0);
    }

    let mut insert = session.insert::<T>(table)?;
    for row in rows {
        insert.write(row).await?;
    }
    insert.end().await?;

    info!("Loaded {} rows into {}", rows.len(), table);
    Ok(rows.len() as u64)
}
