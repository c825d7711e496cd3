//! Resource builder
//!
//! Builds every declaration of a configuration, in document order:
//!
//! 1. split the `existing` flag off the arguments and resolve markers ([crate::resolve]) against
//!    the resources built so far
//! 2. map the type tag to backend addressing ([ResourceType])
//! 3. apply naming and tag policy
//! 4. create the resource, or look it up when it already exists
//! 5. register the handle under the declaration name
//!
//! A declaration that fails is reported and skipped, the remaining declarations are still built.
//! Afterwards the `id` of every built resource is exported as `output_<name>`.
use crate::backend::{AttributeError, Backend, BackendError, ResourceRequest};
use crate::config::{OrganizationalContext, ResourceDeclaration};
use crate::diagnostics::Diagnostics;
use crate::registry::Registry;
use crate::resolve::{self, ResolveError};
use crate::resource_type::ResourceType;
use crate::value::{Object, Value};

/// Argument receiving the context tags
pub const TAGS_ARGUMENT: &str = "tags";

/// Progress of a single declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    ArgsResolved,
    TypeMapped,
    Materialized,
    Registered,
    Exported,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Pending => f.write_str("pending"),
            Stage::ArgsResolved => f.write_str("args-resolved"),
            Stage::TypeMapped => f.write_str("type-mapped"),
            Stage::Materialized => f.write_str("materialized"),
            Stage::Registered => f.write_str("registered"),
            Stage::Exported => f.write_str("exported"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DeclarationError {
    #[error("Unable to resolve arguments")]
    Resolve(#[from] ResolveError),
    #[error("Unable to materialize resource")]
    Backend(#[from] BackendError),
    #[error("A resource with this name was already built")]
    AlreadyRegistered,
}

impl DeclarationError {
    /// The stage that could not be reached
    pub fn stage(&self) -> Stage {
        match self {
            DeclarationError::Resolve(_) => Stage::ArgsResolved,
            DeclarationError::Backend(_) => Stage::Materialized,
            DeclarationError::AlreadyRegistered => Stage::Registered,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExportError {
    #[error("Identifying attribute is not available")]
    Attribute(#[from] AttributeError),
    #[error("Output was rejected")]
    Backend(#[from] BackendError),
}

/// A successfully built declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Materialized {
    /// Generated or custom identifier handed to the backend
    pub identifier: String,
    pub resource_type: ResourceType,
    /// Looked up instead of created
    pub existing: bool,
}

#[derive(Debug)]
pub struct Outcome {
    pub name: String,
    pub result: Result<Materialized, DeclarationError>,
}

#[derive(Debug)]
pub struct Export {
    /// Declaration name
    pub name: String,
    /// `output_<name>`
    pub output: String,
    pub result: Result<Value, ExportError>,
}

/// Result of a build
///
/// Individual failures are part of the report, building never fails as a whole.
#[derive(Debug)]
pub struct BuildReport {
    /// One entry per declaration, in document order
    pub outcomes: Vec<Outcome>,
    /// One entry per registered resource, in registration order
    pub exports: Vec<Export>,
    pub registry: Registry,
}

impl BuildReport {
    pub fn outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|outcome| outcome.name == name)
    }

    pub fn failed(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    pub fn failed_exports(&self) -> impl Iterator<Item = &Export> {
        self.exports.iter().filter(|export| export.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none() && self.failed_exports().next().is_none()
    }
}

pub struct Builder<'a, B: Backend + ?Sized> {
    context: &'a OrganizationalContext,
    backend: &'a mut B,
    registry: Registry,
}

impl<'a, B: Backend + ?Sized> Builder<'a, B> {
    pub fn new(context: &'a OrganizationalContext, backend: &'a mut B) -> Self {
        Self {
            context,
            backend,
            registry: Registry::default(),
        }
    }

    /// Build all `declarations` in order, then export outputs
    pub fn build(
        mut self,
        declarations: &[ResourceDeclaration],
        diagnostics: &mut Diagnostics,
    ) -> BuildReport {
        let mut outcomes = Vec::with_capacity(declarations.len());

        for (position, declaration) in declarations.iter().enumerate() {
            diagnostics.set_subject(declaration.name.as_str());

            let result = self.build_declaration(declaration, diagnostics);
            match &result {
                Ok(materialized) if materialized.existing => diagnostics.info(format!(
                    "Created data source for: {} ({})",
                    materialized.identifier, declaration.resource_type
                )),
                Ok(materialized) => diagnostics.info(format!(
                    "Created resource: {} ({})",
                    materialized.identifier, declaration.resource_type
                )),
                Err(err) => {
                    tracing::trace!(stage = %err.stage(), "declaration failed");
                    let mut message = format!(
                        "Error creating resource of type '{}': {}",
                        declaration.resource_type,
                        error_chain(err)
                    );
                    if let DeclarationError::Resolve(ResolveError::ReferenceNotFound(missing)) =
                        err
                    {
                        message.push_str(&missing_reference_hint(
                            missing,
                            position,
                            declarations,
                        ));
                    }
                    diagnostics.error(message);
                }
            }

            diagnostics.clear_subject();
            outcomes.push(Outcome {
                name: declaration.name.clone(),
                result,
            });
        }

        let exports = self.export(diagnostics);

        BuildReport {
            outcomes,
            exports,
            registry: self.registry,
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(name = %declaration.name))]
    fn build_declaration(
        &mut self,
        declaration: &ResourceDeclaration,
        diagnostics: &mut Diagnostics,
    ) -> Result<Materialized, DeclarationError> {
        tracing::trace!(stage = %Stage::Pending);

        let (existing, args) = declaration.split_existing();
        let mut args = resolve::resolve_object(&args, &self.registry, diagnostics)?;
        tracing::trace!(stage = %Stage::ArgsResolved);

        let resource_type = ResourceType::from_tag(&declaration.resource_type);
        tracing::trace!(stage = %Stage::TypeMapped, %resource_type);

        let identifier = declaration
            .custom_name
            .clone()
            .unwrap_or_else(|| self.context.generate_name(&declaration.name));
        self.apply_tag_policy(&resource_type, &mut args);

        if self.registry.contains(&declaration.name) {
            return Err(DeclarationError::AlreadyRegistered);
        }

        let request = ResourceRequest::new(&declaration.name, &identifier, &resource_type, args);
        let handle = if existing {
            self.backend.lookup(request)?
        } else {
            self.backend.create(request)?
        };
        tracing::trace!(stage = %Stage::Materialized);

        self.registry
            .register(declaration.name.as_str(), handle)
            .map_err(|_| DeclarationError::AlreadyRegistered)?;
        tracing::trace!(stage = %Stage::Registered);

        Ok(Materialized {
            identifier,
            resource_type,
            existing,
        })
    }

    /// Inject context tags into tag-capable resources without explicit tags
    fn apply_tag_policy(&self, resource_type: &ResourceType, args: &mut Object) {
        if !resource_type.supports_tags() || args.contains_key(TAGS_ARGUMENT) {
            return;
        }

        if let Some(tags) = self.context.default_tags() {
            args.insert(TAGS_ARGUMENT.to_string(), tags);
        }
    }

    fn export(&mut self, diagnostics: &mut Diagnostics) -> Vec<Export> {
        let mut exports = Vec::with_capacity(self.registry.len());

        for (name, handle) in self.registry.iter() {
            let output = format!("output_{name}");
            let result = handle.id().map_err(ExportError::from).and_then(|id| {
                self.backend.export(&output, id.clone())?;
                Ok(id)
            });

            match &result {
                Ok(_) => tracing::trace!(%name, stage = %Stage::Exported),
                Err(err) => diagnostics.error(format!(
                    "Failed to export resource '{name}': {}",
                    error_chain(err)
                )),
            }

            exports.push(Export {
                name: name.to_string(),
                output,
                result,
            });
        }

        exports
    }
}

/// Explain why `missing` is not available to the declaration at `position`
fn missing_reference_hint(
    missing: &str,
    position: usize,
    declarations: &[ResourceDeclaration],
) -> String {
    if declarations[position].name == missing {
        return " (a resource cannot reference itself)".to_string();
    }

    if declarations[position + 1..]
        .iter()
        .any(|declaration| declaration.name == missing)
    {
        return format!(" ('{missing}' is declared later, references must point to earlier resources)");
    }

    if declarations[..position]
        .iter()
        .any(|declaration| declaration.name == missing)
    {
        return format!(" ('{missing}' failed to build)");
    }

    String::new()
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
