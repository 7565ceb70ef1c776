use crate::config::Config;
use crate::error::{adapter_error, config_error, DeskResult};
use redis::aio::MultiplexedConnection;
use redis::{Client as RedisClient, Cmd, ErrorKind, FromRedisValue, RedisError, RedisResult, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// Redis key constants
pub mod keys {
    pub const GOOGLE_CALENDAR_TOKEN: &str = "google_calendar_token";
    pub const EVENTS: &str = "lifedesk:events";
    pub const EVENTS_BY_EXTERNAL_ID: &str = "lifedesk:events:by_external_id";
    pub const TASKS: &str = "lifedesk:tasks";
    pub const IDEAS: &str = "lifedesk:ideas";
    pub const EXPENSES: &str = "lifedesk:expenses";
    pub const SYNC_LOCK_PREFIX: &str = "lifedesk:lock:calendar_sync:";
}

/// The Redis actor that owns the connection and executes commands
pub struct RedisActor {
    client: RedisClient,
    connection: Option<MultiplexedConnection>,
    command_rx: mpsc::Receiver<RedisCommand>,
}

/// Commands that can be sent to the Redis actor
pub enum RedisCommand {
    Query(Cmd, mpsc::Sender<RedisResult<Value>>),
    Shutdown,
}

/// Handle for communicating with the Redis actor
#[derive(Clone)]
pub struct RedisActorHandle {
    command_tx: mpsc::Sender<RedisCommand>,
}

impl RedisActorHandle {
    /// Create a new empty handle for initialization purposes
    pub fn empty() -> Self {
        let (command_tx, _) = mpsc::channel(32);
        Self { command_tx }
    }

    /// Wrap an existing mailbox, for actors running outside `RedisActor`
    pub fn from_mailbox(command_tx: mpsc::Sender<RedisCommand>) -> Self {
        Self { command_tx }
    }

    /// Run a command and decode its reply
    pub async fn query<T: FromRedisValue>(&self, cmd: Cmd) -> RedisResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(RedisCommand::Query(cmd, response_tx))
            .await
            .map_err(|_| RedisError::from((ErrorKind::IoError, "Redis actor mailbox closed")))?;

        let value = response_rx
            .recv()
            .await
            .ok_or_else(|| RedisError::from((ErrorKind::IoError, "Response channel closed")))??;

        redis::from_redis_value(&value)
    }

    /// Get the stored calendar credential, if any
    pub async fn get_token(&self) -> DeskResult<Option<serde_json::Value>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(keys::GOOGLE_CALENDAR_TOKEN);

        let raw: Option<String> = self
            .query(cmd)
            .await
            .map_err(|e| adapter_error("redis.get", keys::GOOGLE_CALENDAR_TOKEN, e))?;

        match raw {
            Some(token_json) => Ok(Some(serde_json::from_str(&token_json)?)),
            None => Ok(None),
        }
    }

    /// Save the calendar credential
    pub async fn save_token(&self, token: &serde_json::Value) -> DeskResult<()> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(keys::GOOGLE_CALENDAR_TOKEN).arg(token.to_string());

        self.query::<()>(cmd)
            .await
            .map_err(|e| adapter_error("redis.set", keys::GOOGLE_CALENDAR_TOKEN, e))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> DeskResult<()> {
        let _ = self.command_tx.send(RedisCommand::Shutdown).await;
        Ok(())
    }
}

impl RedisActor {
    /// Create a new actor and return its handle
    pub fn new(config: &Config) -> DeskResult<(Self, RedisActorHandle)> {
        let (command_tx, command_rx) = mpsc::channel(32);

        let client = RedisClient::open(config.redis_url.as_str())
            .map_err(|e| config_error(&format!("Invalid REDIS_URL: {}", e)))?;

        let actor = Self {
            client,
            connection: None,
            command_rx,
        };

        let handle = RedisActorHandle { command_tx };

        Ok((actor, handle))
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Redis actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                RedisCommand::Query(cmd, response_tx) => {
                    let result = self.execute(&cmd).await;
                    let _ = response_tx.send(result).await;
                }
                RedisCommand::Shutdown => {
                    info!("Redis actor shutting down");
                    break;
                }
            }
        }

        info!("Redis actor shut down");
    }

    /// Get a redis connection, connecting on first use
    async fn connection(&mut self) -> RedisResult<MultiplexedConnection> {
        if let Some(conn) = &self.connection {
            return Ok(conn.clone());
        }

        debug!("Opening Redis connection");
        let conn = self.client.get_multiplexed_async_connection().await?;
        self.connection = Some(conn.clone());
        Ok(conn)
    }

    async fn execute(&mut self, cmd: &Cmd) -> RedisResult<Value> {
        let mut conn = self.connection().await?;
        let result = cmd.query_async::<Value>(&mut conn).await;

        if let Err(e) = &result {
            if e.is_io_error() || e.is_connection_dropped() {
                // Reconnect on the next command
                warn!("Redis connection lost: {}", e);
                self.connection = None;
            }
        }

        result
    }
}
