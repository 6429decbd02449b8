//! MySQL load backend (feature `mysql-backend`)

use std::path::PathBuf;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, TxOpts};

use super::backend::{LoadBackend, RowCountMode};
use super::error::BackendError;
use super::loader::{LoadStatement, quote_identifier};
use crate::pipeline::DbCredentials;

/// Server error raised for a table that does not exist
const ER_NO_SUCH_TABLE: u16 = 1146;

/// A single MySQL connection used serially by the pipeline
pub struct MySqlBackend {
    conn: Conn,
}

impl MySqlBackend {
    /// Connect with the given credentials
    pub async fn connect(credentials: &DbCredentials) -> Result<Self, BackendError> {
        tracing::info!(
            host = %credentials.host,
            port = credentials.port,
            user = %credentials.user,
            "connecting to MySQL"
        );

        let opts: Opts = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(credentials.host.as_str())
            .tcp_port(credentials.port)
            .user(Some(credentials.user.as_str()))
            .pass(Some(credentials.password.as_str()))
            .into();

        let conn = Conn::new(opts)
            .await
            .map_err(|e| BackendError::Connection(format!("Failed to connect to MySQL: {}", e)))?;

        Ok(Self { conn })
    }

    /// Close the connection
    pub async fn disconnect(self) -> Result<(), BackendError> {
        self.conn.disconnect().await.map_err(BackendError::from)
    }
}

#[async_trait]
impl LoadBackend for MySqlBackend {
    fn name(&self) -> &str {
        "mysql"
    }

    async fn secure_file_dir(&mut self) -> Result<Option<PathBuf>, BackendError> {
        let row: Option<(Option<String>,)> = self
            .conn
            .query_first("SELECT @@GLOBAL.secure_file_priv")
            .await?;

        // NULL disables server-side loads; an empty value names no directory
        Ok(row
            .and_then(|(dir,)| dir)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from))
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BackendError> {
        self.conn.query_drop(sql).await?;
        Ok(self.conn.affected_rows())
    }

    async fn table_columns(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>, BackendError> {
        let columns: Vec<String> = self
            .conn
            .exec(
                "SELECT COLUMN_NAME FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
                 ORDER BY ORDINAL_POSITION",
                (schema, table),
            )
            .await?;
        Ok(columns)
    }

    async fn load_file(&mut self, statement: &LoadStatement) -> Result<u64, BackendError> {
        let sql = statement.to_sql();
        let mut tx = self.conn.start_transaction(TxOpts::default()).await?;

        match tx.query_drop(&sql).await {
            Ok(()) => {
                let inserted = tx.affected_rows();
                tx.commit().await?;
                Ok(inserted)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(error = %rollback, "rollback after failed load also failed");
                }
                Err(e.into())
            }
        }
    }

    async fn row_count(
        &mut self,
        schema: &str,
        table: &str,
        mode: RowCountMode,
    ) -> Result<Option<u64>, BackendError> {
        match mode {
            RowCountMode::Estimated => {
                let row: Option<(Option<u64>,)> = self
                    .conn
                    .exec_first(
                        "SELECT TABLE_ROWS FROM information_schema.TABLES \
                         WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?",
                        (schema, table),
                    )
                    .await?;
                Ok(row.and_then(|(rows,)| rows))
            }
            RowCountMode::Exact => {
                let sql = format!(
                    "SELECT COUNT(*) FROM {}.{}",
                    quote_identifier(schema),
                    quote_identifier(table)
                );
                match self.conn.query_first::<u64, _>(sql).await {
                    Ok(count) => Ok(count),
                    Err(mysql_async::Error::Server(e)) if e.code == ER_NO_SUCH_TABLE => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}
