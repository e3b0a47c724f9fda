//! LanceDB connection and table housekeeping helpers.

use arrow_array::RecordBatchIterator;
use arrow_schema::SchemaRef;
use lancedb::{connect, Connection};
use ragline_core::{Error, Result};

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(Error::vector_store)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await.map_err(Error::vector_store)?;
    Ok(names.iter().any(|n| n == name))
}

/// Create `name` with `schema` and zero rows unless it already exists.
pub async fn ensure_table(conn: &Connection, name: &str, schema: SchemaRef) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter))
        .execute()
        .await
        .map_err(Error::vector_store)?;
    Ok(())
}

pub async fn drop_table(conn: &Connection, name: &str) -> Result<()> {
    if !table_exists(conn, name).await? {
        return Ok(());
    }
    conn.drop_table(name, &[]).await.map_err(Error::vector_store)
}
