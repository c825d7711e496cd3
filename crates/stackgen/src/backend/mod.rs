//! provisioning backend interface
//!
//! The builder never provisions anything itself. It hands fully resolved requests to a [Backend]
//! and keeps the returned [ResourceHandle]s so later declarations can reference them.
//!
//! [Stack] is the bundled backend: it synthesizes a Terraform configuration instead of calling
//! cloud APIs.
mod catalog;
mod stack;

pub use catalog::{Catalog, CatalogEntry, TypeResolutionError};
pub use stack::{Stack, SynthesizedResource};

use crate::resource_type::ResourceType;
use crate::value::{Object, Value};

/// Everything a backend needs to materialize a single declaration
#[derive(derive_new::new, Debug)]
pub struct ResourceRequest<'a> {
    /// Declaration name, unique within a build
    pub name: &'a str,
    /// Generated (or custom) resource identifier
    pub identifier: &'a str,
    pub resource_type: &'a ResourceType,
    /// Resolved arguments
    pub args: Object,
}

/// Backend that can create and look up resources
pub trait Backend {
    /// Create a new resource
    fn create(&mut self, request: ResourceRequest<'_>)
        -> Result<Box<dyn ResourceHandle>, BackendError>;

    /// Look up an existing resource (data source)
    fn lookup(&mut self, request: ResourceRequest<'_>)
        -> Result<Box<dyn ResourceHandle>, BackendError>;

    /// Publish a named output value
    fn export(&mut self, name: &str, value: Value) -> Result<(), BackendError>;
}

/// A materialized (created or looked up) resource
///
/// Attributes are read through two accessors: [ResourceHandle::attribute] for attributes the
/// resource type exposes directly, and [ResourceHandle::attribute_by_name] as a generic fallback
/// for anything else.
pub trait ResourceHandle: std::fmt::Debug {
    fn attribute(&self, name: &str) -> Option<Value>;

    fn attribute_by_name(&self, name: &str) -> Result<Value, AttributeError>;

    /// Identifying attribute, used for outputs
    fn id(&self) -> Result<Value, AttributeError> {
        self.attribute(DEFAULT_ATTRIBUTE)
            .ok_or_else(|| AttributeError::Missing(DEFAULT_ATTRIBUTE.to_string()))
    }
}

/// Attribute referenced when none is named
pub const DEFAULT_ATTRIBUTE: &str = "id";

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    #[error("Attribute '{0}' does not exist")]
    Missing(String),
    #[error("'{0}' is not a valid attribute name")]
    InvalidName(String),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum BackendError {
    #[error("Unable to initialize backend: {0}")]
    Init(String),
    #[error(transparent)]
    TypeResolution(#[from] TypeResolutionError),
    #[error("A construct named '{0}' already exists")]
    DuplicateConstruct(String),
    #[error("An output named '{0}' already exists")]
    DuplicateOutput(String),
}
