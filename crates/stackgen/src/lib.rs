//! # stackgen - declarative infrastructure stacks
//!
//! ## Introduction for developers
//!
//! Read this to understand how `stackgen` works internally.
//!
//! ### Terms
//!
//! - a **declaration** describes one resource to create or look up
//! - a **handle** is what a backend returns for a materialized resource, it exposes attributes
//! - the **registry** maps declaration names to handles, in build order
//! - a **marker** is a string argument with a special prefix (`ref:`, `secret:`)
//!
//! This is a valid configuration:
//! ```yaml
//! team: Demo
//! service: example
//! environment: dev
//! region: us-east-1
//! tags:
//!   Owner: example-user
//!
//! aws_resources:
//!   - name: vpc-example
//!     type: vpc.Vpc
//!     args:
//!       cidr_block: 10.0.0.0/16
//!
//!   - name: subnet-example
//!     type: subnet.Subnet
//!     args:
//!       vpc_id: ref:vpc-example.id
//!       cidr_block: 10.0.1.0/24
//! ```
//!
//! ### Loading
//!
//! see [config::Configuration]
//!
//! The document is read as yaml. The keys `team`, `service`, `environment` and `region` are
//! required, their absence aborts before anything is built. Declaration names must be unique.
//!
//! ### Building
//!
//! see [builder::Builder::build]
//!
//! Declarations are built strictly one after another, in document order. Each one
//!
//! - resolves its arguments ([resolve::resolve]). A `ref:` marker can only see resources that
//!   were built before, so forward and circular references are errors.
//! - maps its type tag `service.ClassName` to a backend `(module, class)`
//!   ([resource_type::ResourceType])
//! - gets a conventional identifier ([config::OrganizationalContext::generate_name]) unless
//!   `custom_name` is set, and the context tags if the type supports tags
//! - is created (or looked up, for `existing: true`) by the [backend::Backend]
//! - is registered under its declaration name ([registry::Registry])
//!
//! A failing declaration is logged to [diagnostics::Diagnostics] and skipped, the others are
//! still built. Finally the `id` of every registered resource is exported as `output_<name>`.
//!
//! | declaration                               | after resolution                 |
//! |-------------------------------------------|----------------------------------|
//! | `vpc_id: ref:vpc-example.id`              | `vpc_id: ${aws_vpc.vpc-example.id}` |
//! | `vpc_id: ref:vpc-example`                 | same, `id` is the default        |
//! | `password: secret:db_password`            | `password: ${db_password}`       |
//! | `cidr_block: 10.0.1.0/24`                 | unchanged                        |
//!
//! ### Output
//!
//! The bundled [backend::Stack] does not talk to any cloud. It synthesizes a Terraform
//! configuration which can be serialized via [serde] (json, yaml) or rendered as hcl.
//!
pub mod backend;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod naming;
pub mod registry;
pub mod resolve;
pub mod resource_type;
pub mod value;
mod visit;

pub use visit::{Visit, VisitStrings};
