use super::models::{Task, TaskFilter};
use crate::components::redis_service::{keys, RedisActorHandle, RedisCollection};
use crate::error::{not_found, DeskResult};
use async_trait::async_trait;

/// Persisted task collection
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get(&self, id: &str) -> DeskResult<Option<Task>>;

    async fn list(&self, filter: TaskFilter) -> DeskResult<Vec<Task>>;

    /// Insert or replace a task
    async fn save(&self, task: &Task) -> DeskResult<()>;

    /// Remove a task; fails with NotFound when it does not exist
    async fn delete(&self, id: &str) -> DeskResult<()>;
}

/// Task store backed by a Redis hash
pub struct RedisTaskStore {
    tasks: RedisCollection<Task>,
}

impl RedisTaskStore {
    pub fn new(redis: RedisActorHandle) -> Self {
        Self {
            tasks: RedisCollection::new(redis, keys::TASKS),
        }
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn get(&self, id: &str) -> DeskResult<Option<Task>> {
        self.tasks.get(id).await
    }

    async fn list(&self, filter: TaskFilter) -> DeskResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .all()
            .await?
            .into_iter()
            .filter(|task| filter.matches(task))
            .collect();
        tasks.sort_by(|a, b| {
            a.scheduled_date
                .cmp(&b.scheduled_date)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(tasks)
    }

    async fn save(&self, task: &Task) -> DeskResult<()> {
        task.validate()?;
        self.tasks.put(&task.id, task).await
    }

    async fn delete(&self, id: &str) -> DeskResult<()> {
        if self.tasks.remove(id).await? {
            Ok(())
        } else {
            Err(not_found("task", id))
        }
    }
}
