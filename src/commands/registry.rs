//! Registry of the available maintenance commands.

use super::{DeleteRows, FixImages, InspectImages, ListRows, MaintenanceCommand, VerifyUpload};
use serde::Serialize;
use std::sync::Arc;

/// Name and summary of a registered command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
}

/// Registry of all available commands, in registration order.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn MaintenanceCommand>>,
}

impl CommandRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command. A command with the same name replaces the old one.
    pub fn register(&mut self, command: Arc<dyn MaintenanceCommand>) {
        self.commands.retain(|c| c.name() != command.name());
        self.commands.push(command);
    }

    pub fn list(&self) -> Vec<CommandInfo> {
        self.commands
            .iter()
            .map(|c| CommandInfo {
                name: c.name().to_string(),
                description: c.description().to_string(),
            })
            .collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the registry with every command in its default configuration.
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register(Arc::new(InspectImages::default()));
    registry.register(Arc::new(FixImages::default()));
    registry.register(Arc::new(ListRows::default()));
    registry.register(Arc::new(DeleteRows::default()));
    registry.register(Arc::new(VerifyUpload::default()));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_registry() {
        let registry = create_registry();
        let names: Vec<String> = registry.list().into_iter().map(|c| c.name).collect();

        assert_eq!(
            names,
            vec!["inspect-images", "fix-images", "list", "delete-rows", "verify-upload"]
        );
        assert!(registry.list().iter().all(|c| !c.description.is_empty()));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = CommandRegistry::new();
        registry.register(Arc::new(FixImages::default()));
        registry.register(Arc::new(FixImages {
            dry_run: true,
            ..Default::default()
        }));

        let listed = registry.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "fix-images");
    }
}
