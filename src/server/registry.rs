//! Resource registry for collecting mounted resources and generating their
//! CRUD routes

use super::resource::{Resource, routes};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait that describes how to build routes for one resource
///
/// [`ResourceRegistry::mount`] covers the conventional CRUD surface; this
/// trait is the escape hatch for resources that need hand-built routes.
pub trait ResourceDescriptor: Send + Sync {
    /// The resource name (plural path segment, e.g. "widgets")
    fn resource_name(&self) -> &str;

    /// Build the routes for this resource
    fn build_routes(&self) -> Router;
}

struct Conventional<R: Resource> {
    resource: Arc<R>,
}

impl<R: Resource> ResourceDescriptor for Conventional<R> {
    fn resource_name(&self) -> &str {
        self.resource.resource_name()
    }

    fn build_routes(&self) -> Router {
        routes(self.resource.clone())
    }
}

/// Registry for all resources in the application
///
/// Mounting the same resource name twice replaces the earlier entry.
#[derive(Default)]
pub struct ResourceRegistry {
    descriptors: HashMap<String, Box<dyn ResourceDescriptor>>,
}

impl ResourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
        }
    }

    /// Mount a resource under its conventional CRUD routes
    pub fn mount<R: Resource>(&mut self, resource: Arc<R>) {
        self.register(Box::new(Conventional { resource }));
    }

    /// Register a custom resource descriptor
    pub fn register(&mut self, descriptor: Box<dyn ResourceDescriptor>) {
        let name = descriptor.resource_name().to_string();
        self.descriptors.insert(name, descriptor);
    }

    /// Build a router with all registered resource routes merged
    pub fn build_routes(&self) -> Router {
        let mut router = Router::new();
        for descriptor in self.descriptors.values() {
            router = router.merge(descriptor.build_routes());
        }
        router
    }

    /// Get all registered resource names
    pub fn resource_names(&self) -> Vec<&str> {
        self.descriptors.keys().map(|name| name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal descriptor for registry tests
    struct MockDescriptor {
        name: String,
    }

    impl MockDescriptor {
        fn new(name: &str) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
            })
        }
    }

    impl ResourceDescriptor for MockDescriptor {
        fn resource_name(&self) -> &str {
            &self.name
        }

        fn build_routes(&self) -> Router {
            Router::new()
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ResourceRegistry::new();
        assert!(registry.resource_names().is_empty());
    }

    #[test]
    fn test_register_single_resource() {
        let mut registry = ResourceRegistry::new();
        registry.register(MockDescriptor::new("widgets"));
        assert_eq!(registry.resource_names(), vec!["widgets"]);
    }

    #[test]
    fn test_register_multiple_resources() {
        let mut registry = ResourceRegistry::new();
        registry.register(MockDescriptor::new("widgets"));
        registry.register(MockDescriptor::new("gadgets"));
        assert_eq!(registry.resource_names().len(), 2);
    }

    #[test]
    fn test_register_duplicate_replaces() {
        let mut registry = ResourceRegistry::new();
        registry.register(MockDescriptor::new("widgets"));
        registry.register(MockDescriptor::new("widgets"));
        assert_eq!(registry.resource_names().len(), 1);
    }

    #[test]
    fn test_build_routes_empty_registry() {
        let registry = ResourceRegistry::new();
        let _router = registry.build_routes(); // Should not panic
    }

    #[test]
    fn test_build_routes_with_resources() {
        let mut registry = ResourceRegistry::new();
        registry.register(MockDescriptor::new("widgets"));
        registry.register(MockDescriptor::new("gadgets"));
        let _router = registry.build_routes(); // Should not panic
    }
}
