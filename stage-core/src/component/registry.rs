//! Name → factory registry used when reading component JSON.
//!
//! The process-wide registry is populated once, either by an explicit
//! [`install`] or lazily with the built-in kinds on first use, and is
//! read-only afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::{Component, ComponentKind};

/// Creates a default-initialised component.
pub type ComponentFactory = fn() -> Component;

static GLOBAL: OnceLock<ComponentRegistry> = OnceLock::new();

/// Maps JSON `kind` names to factories.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

fn new_transform() -> Component {
    Component::new(ComponentKind::Transform)
}

fn new_image() -> Component {
    Component::new(ComponentKind::Image)
}

fn new_text() -> Component {
    Component::new(ComponentKind::Text)
}

fn new_button() -> Component {
    Component::new(ComponentKind::Button)
}

impl ComponentRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in kinds under their own names.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ComponentKind::Transform.name(), new_transform);
        registry.register(ComponentKind::Image.name(), new_image);
        registry.register(ComponentKind::Text.name(), new_text);
        registry.register(ComponentKind::Button.name(), new_button);
        registry
    }

    /// Add or replace a factory.
    pub fn register(&mut self, name: impl Into<String>, factory: ComponentFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Create a component by name.
    #[must_use]
    pub fn create(&self, name: &str) -> Option<Component> {
        self.factories.get(name).map(|factory| factory())
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Install the process-wide registry.
///
/// # Errors
///
/// Returns the registry back if one was already installed (explicitly or by
/// an earlier [`global`] call).
pub fn install(registry: ComponentRegistry) -> Result<(), ComponentRegistry> {
    GLOBAL.set(registry)
}

/// The process-wide registry, installing the built-ins if nothing was
/// installed yet.
pub fn global() -> &'static ComponentRegistry {
    GLOBAL.get_or_init(|| {
        tracing::debug!("Installing built-in component registry");
        ComponentRegistry::with_builtins()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_create_matching_kinds() {
        let registry = ComponentRegistry::with_builtins();
        for kind in ComponentKind::ALL {
            let c = registry.create(kind.name()).expect("built-in kind");
            assert_eq!(c.kind(), kind);
        }
        assert_eq!(registry.names(), vec!["Button", "Image", "Text", "Transform"]);
    }

    #[test]
    fn test_unknown_name() {
        assert!(ComponentRegistry::new().create("Text").is_none());
        assert!(!global().contains("Sprite"));
    }

    #[test]
    fn test_aliases_can_be_registered() {
        let mut registry = ComponentRegistry::with_builtins();
        registry.register("Label", new_text);
        assert_eq!(
            registry.create("Label").map(|c| c.kind()),
            Some(ComponentKind::Text)
        );
    }

    #[test]
    fn test_global_is_read_only_after_first_use() {
        assert!(global().contains("Transform"));
        assert!(install(ComponentRegistry::new()).is_err());
    }
}
