//! The Task Repository (C2): abstract storage for tasks and their notes,
//! keyed by user.

pub mod client;
pub mod error;
pub mod memory;
pub mod model;
pub mod schema;
pub mod scylla_store;
pub mod task_repository;

pub use client::{ScyllaClient, ScyllaConfig};
pub use error::RepositoryError;
pub use memory::InMemoryTaskRepository;
pub use model::{Note, Task, TaskPatch};
pub use scylla_store::ScyllaTaskRepository;
pub use task_repository::TaskRepository;
