//! Key-value cache smoke check

use application::{CheckError, SmokeCheck};
use async_trait::async_trait;
use domain::{RunningInstance, ServiceKind, ttl_within};
use redis::AsyncCommands;
use tracing::{debug, instrument};

const NAME: &str = "cache";

const TEST_KEY: &str = "test:key";
const TEST_VALUE: &str = "test-value";
const TEMP_KEY: &str = "temp:key";
const TEMP_VALUE: &str = "temporary";
const TEMP_TTL_SECS: u64 = 60;

/// Round-trips a key and checks expiry over the Redis protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheCheck;

#[async_trait]
impl SmokeCheck for CacheCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> ServiceKind {
        ServiceKind::KvCache
    }

    #[instrument(skip_all, fields(service = %instance.name()))]
    async fn run(&self, instance: &RunningInstance) -> Result<(), CheckError> {
        let address = instance.address()?;
        let client = redis::Client::open(address.connection_string())
            .map_err(|e| CheckError::client(NAME, e))?;
        // Dropping the multiplexed connection closes it.
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CheckError::client(NAME, e))?;

        let _: () = conn
            .set(TEST_KEY, TEST_VALUE)
            .await
            .map_err(|e| CheckError::client(NAME, e))?;
        let value: Option<String> = conn
            .get(TEST_KEY)
            .await
            .map_err(|e| CheckError::client(NAME, e))?;
        verify_value(value.as_deref())?;

        let _: () = redis::cmd("SETEX")
            .arg(TEMP_KEY)
            .arg(TEMP_TTL_SECS)
            .arg(TEMP_VALUE)
            .query_async(&mut conn)
            .await
            .map_err(|e| CheckError::client(NAME, e))?;
        let ttl: i64 = conn
            .ttl(TEMP_KEY)
            .await
            .map_err(|e| CheckError::client(NAME, e))?;
        verify_ttl(ttl)?;

        debug!(ttl, "Cache check passed");
        Ok(())
    }
}

fn verify_value(value: Option<&str>) -> Result<(), CheckError> {
    match value {
        Some(TEST_VALUE) => Ok(()),
        Some(other) => Err(CheckError::assertion(
            NAME,
            format!("expected {TEST_VALUE}, got {other}"),
        )),
        None => Err(CheckError::assertion(
            NAME,
            format!("key {TEST_KEY} is missing"),
        )),
    }
}

fn verify_ttl(ttl: i64) -> Result<(), CheckError> {
    if ttl_within(ttl, TEMP_TTL_SECS) {
        Ok(())
    } else {
        Err(CheckError::assertion(
            NAME,
            format!("ttl {ttl} outside (0, {TEMP_TTL_SECS}]"),
        ))
    }
}
