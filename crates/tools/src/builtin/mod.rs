pub mod datetime;
pub mod notes;
pub mod tasks;

use crate::registry::ToolRegistry;
use std::sync::Arc;
use voice_gateway_repository::TaskRepository;

/// Registers every concrete tool of the gateway's builtin surface against a
/// fresh registry and the given repository.
pub fn register_all(registry: &ToolRegistry, repository: Arc<dyn TaskRepository>) -> Result<(), crate::error::ToolError> {
    registry.register(Arc::new(datetime::DateTimeTool))?;
    registry.register(Arc::new(tasks::GetAllTasksTool::new(repository.clone())))?;
    registry.register(Arc::new(tasks::GetTaskByIdTool::new(repository.clone())))?;
    registry.register(Arc::new(tasks::CreateTaskTool::new(repository.clone())))?;
    registry.register(Arc::new(tasks::UpdateTaskTool::new(repository.clone())))?;
    registry.register(Arc::new(tasks::DeleteTaskTool::new(repository.clone())))?;
    registry.register(Arc::new(notes::GetNotesByTodoIdTool::new(repository.clone())))?;
    registry.register(Arc::new(notes::CreateNoteTool::new(repository.clone())))?;
    registry.register(Arc::new(notes::DeleteNoteTool::new(repository)))?;
    Ok(())
}
