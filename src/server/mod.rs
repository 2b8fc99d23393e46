//! HTTP exposure: generic resource handlers, registry, and server builder

pub mod builder;
pub mod params;
pub mod registry;
pub mod resource;

pub use builder::ServerBuilder;
pub use params::{parse_filters, parse_options};
pub use registry::{ResourceDescriptor, ResourceRegistry};
pub use resource::{AccessGuard, PROFILE_HEADER, Resource};
