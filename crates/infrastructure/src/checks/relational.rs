//! Relational database smoke check

use application::{CheckError, SmokeCheck};
use async_trait::async_trait;
use domain::{RunningInstance, ServiceKind};
use sqlx::{Connection, PgConnection};
use tracing::{debug, instrument, warn};

const NAME: &str = "relational";

const CREATE_USERS: &str =
    "CREATE TABLE IF NOT EXISTS users (id SERIAL PRIMARY KEY, name VARCHAR(100))";
const INSERT_USER: &str = "INSERT INTO users (name) VALUES ($1) RETURNING id";
const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";
const TEST_USER: &str = "Test User";

/// Creates a table, inserts a row and counts rows over the PostgreSQL protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationalCheck;

#[async_trait]
impl SmokeCheck for RelationalCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::RelationalDb
    }

    #[instrument(skip_all, fields(service = %instance.name()))]
    async fn run(&self, instance: &RunningInstance) -> Result<(), CheckError> {
        let address = instance.address()?;
        let mut conn = PgConnection::connect(address.connection_string())
            .await
            .map_err(|e| CheckError::client(NAME, e))?;

        let outcome = exercise(&mut conn).await;

        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close connection");
        }
        outcome
    }
}

async fn exercise(conn: &mut PgConnection) -> Result<(), CheckError> {
    sqlx::query(CREATE_USERS)
        .execute(&mut *conn)
        .await
        .map_err(|e| CheckError::client(NAME, e))?;

    let id: i32 = sqlx::query_scalar(INSERT_USER)
        .bind(TEST_USER)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CheckError::client(NAME, e))?;
    verify_generated_id(id)?;

    let count: i64 = sqlx::query_scalar(COUNT_USERS)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| CheckError::client(NAME, e))?;
    verify_row_count(count)?;

    debug!(id, count, "Relational check passed");
    Ok(())
}

fn verify_generated_id(id: i32) -> Result<(), CheckError> {
    if id > 0 {
        Ok(())
    } else {
        Err(CheckError::assertion(
            NAME,
            format!("generated id should be positive, got {id}"),
        ))
    }
}

fn verify_row_count(count: i64) -> Result<(), CheckError> {
    if count >= 1 {
        Ok(())
    } else {
        Err(CheckError::assertion(
            NAME,
            format!("expected at least 1 user, found {count}"),
        ))
    }
}
