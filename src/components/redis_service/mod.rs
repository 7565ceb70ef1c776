mod actor;
mod collection;

pub use actor::{keys, RedisActor, RedisActorHandle, RedisCommand};
pub use collection::RedisCollection;
