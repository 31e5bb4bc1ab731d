//! ScyllaDB schema creation for the `tasks` and `notes` tables.

use crate::error::RepositoryError;
use scylla::Session;

pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), RepositoryError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH replication = \
         {{'class': 'SimpleStrategy', 'replication_factor': {replication_factor}}}"
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| RepositoryError::SchemaError(format!("failed to create keyspace: {e}")))?;

    Ok(())
}

pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), RepositoryError> {
    let tasks_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {keyspace}.tasks (
            user_id TEXT,
            task_id UUID,
            title TEXT,
            description TEXT,
            completed BOOLEAN,
            created_at TIMESTAMP,
            updated_at TIMESTAMP,
            PRIMARY KEY ((user_id), task_id)
        )
        "#
    );
    session
        .query_unpaged(tasks_table, &[])
        .await
        .map_err(|e| RepositoryError::SchemaError(format!("failed to create tasks table: {e}")))?;

    let notes_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {keyspace}.notes (
            task_id UUID,
            note_id UUID,
            user_id TEXT,
            content TEXT,
            created_at TIMESTAMP,
            PRIMARY KEY ((task_id), note_id)
        ) WITH CLUSTERING ORDER BY (note_id DESC)
        "#
    );
    session
        .query_unpaged(notes_table, &[])
        .await
        .map_err(|e| RepositoryError::SchemaError(format!("failed to create notes table: {e}")))?;

    Ok(())
}
