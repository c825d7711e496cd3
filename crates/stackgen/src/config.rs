//! configuration document
//!
//! A configuration is a single yaml mapping:
//! ```yaml
//! team: Demo
//! service: example
//! environment: dev
//! region: us-east-1
//! tags:
//!   Owner: example-user
//! aws_resources:
//!   - name: vpc-example
//!     type: vpc.Vpc
//!     args:
//!       cidr_block: 10.0.0.0/16
//! ```
//!
//! `team`, `service`, `environment` and `region` are required. The declarations in `aws_resources`
//! keep their document order, which is also the order they are built in.
use crate::value::{Object, Value};
use std::path::Path;

/// Keys that must be present at the document root, checked in this order
pub const REQUIRED_KEYS: [&str; 4] = ["team", "service", "environment", "region"];

/// Default input file name
pub const DEFAULT_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Configuration {
    #[serde(flatten)]
    pub context: OrganizationalContext,
    #[serde(default)]
    pub aws_resources: Vec<ResourceDeclaration>,
}

/// Organizational metadata shared by every declaration of a build
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct OrganizationalContext {
    pub team: String,
    pub service: String,
    pub environment: String,
    pub region: String,
    #[serde(default)]
    pub tags: Object,
}

/// A single resource to create or look up
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ResourceDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub args: Object,
    #[serde(default, alias = "customName")]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub existing: bool,
}

impl ResourceDeclaration {
    /// Split the `existing` flag off a copy of the arguments
    ///
    /// The flag may be given on the declaration or as an argument. The argument form is removed
    /// from the returned arguments so it never reaches the backend.
    pub fn split_existing(&self) -> (bool, Object) {
        let mut args = self.args.clone();
        let from_args = args
            .shift_remove("existing")
            .is_some_and(|flag| flag.is_truthy());

        (self.existing || from_args, args)
    }
}

impl Configuration {
    pub fn load_file(file_path: &Path) -> Result<Self, ConfigurationError> {
        tracing::info!(path=%file_path.display(), "loading configuration");

        let file = std::fs::File::open(file_path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, ConfigurationError> {
        let document: serde_yaml::Value = serde_yaml::from_reader(reader)?;
        Self::from_document(document)
    }

    /// Validate and convert an already parsed document
    pub fn from_document(document: serde_yaml::Value) -> Result<Self, ConfigurationError> {
        let serde_yaml::Value::Mapping(root) = &document else {
            return Err(ConfigurationError::NotAMapping);
        };

        if let Some(missing) = REQUIRED_KEYS
            .iter()
            .copied()
            .find(|key| !root.contains_key(*key))
        {
            return Err(ConfigurationError::MissingKey(missing));
        }

        let configuration: Configuration = serde_yaml::from_value(document)?;

        let mut seen = std::collections::HashSet::new();
        for declaration in &configuration.aws_resources {
            if !seen.insert(declaration.name.as_str()) {
                return Err(ConfigurationError::DuplicateDeclaration(
                    declaration.name.clone(),
                ));
            }
        }

        tracing::debug!(
            declarations = configuration.aws_resources.len(),
            "configuration loaded"
        );
        Ok(configuration)
    }
}

impl std::str::FromStr for Configuration {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}

impl OrganizationalContext {
    /// Context tags, unless there are none
    pub fn default_tags(&self) -> Option<Value> {
        if self.tags.is_empty() {
            return None;
        }
        Some(Value::Object(self.tags.clone()))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required configuration key: {0}")]
    MissingKey(&'static str),
    #[error("Configuration document must be a mapping")]
    NotAMapping,
    #[error("Resource name '{0}' is declared more than once")]
    DuplicateDeclaration(String),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse configuration")]
    YamlParseFailed(#[from] serde_yaml::Error),
}

/// Utility macro to create a [Configuration] from yaml
///
/// ```
/// # use stackgen::configuration;
/// let config = configuration!("team: a\nservice: b\nenvironment: c\nregion: us-east-1");
/// assert!(config.aws_resources.is_empty());
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use stackgen::configuration;
/// configuration!("team: a");
/// ```
#[macro_export]
macro_rules! configuration {
    { $expr:expr } => {
        $expr
            .parse::<$crate::config::Configuration>()
            .expect("configuration must load")
    };
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"
team: Demo
service: example
environment: dev
region: us-east-1
"#;

    #[test]
    fn minimal() {
        let config = configuration!(MINIMAL);
        assert_eq!(config.context.team, "Demo");
        assert!(config.context.tags.is_empty());
        assert!(config.aws_resources.is_empty());
    }

    #[test]
    fn each_required_key() {
        for key in REQUIRED_KEYS {
            let document: String = MINIMAL
                .lines()
                .filter(|line| !line.starts_with(key))
                .map(|line| format!("{line}\n"))
                .collect();

            let err = document.parse::<Configuration>().expect_err("must error");
            assert!(
                matches!(err, ConfigurationError::MissingKey(missing) if missing == key),
                "{key}: {err:?}"
            );
        }
    }

    #[test]
    fn first_missing_key_is_reported() {
        let err = "region: us-east-1".parse::<Configuration>().unwrap_err();
        assert_eq!(err.to_string(), "Missing required configuration key: team");
    }

    #[test]
    fn not_a_mapping() {
        let err = "- one\n- two".parse::<Configuration>().unwrap_err();
        assert!(matches!(err, ConfigurationError::NotAMapping));
    }

    #[test]
    fn declarations_keep_document_order() {
        let config = configuration!(format!(
            "{MINIMAL}aws_resources:\n  - {{name: b, type: vpc.Vpc}}\n  - {{name: a, type: vpc.Vpc}}"
        ));
        let names: Vec<_> = config.aws_resources.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn duplicate_names() {
        let err = format!(
            "{MINIMAL}aws_resources:\n  - {{name: a, type: vpc.Vpc}}\n  - {{name: a, type: sqs.Queue}}"
        )
        .parse::<Configuration>()
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateDeclaration(name) if name == "a"));
    }

    #[test]
    fn custom_name_aliases() {
        let config = configuration!(format!(
            "{MINIMAL}aws_resources:\n  - {{name: a, type: vpc.Vpc, custom_name: x}}\n  - {{name: b, type: vpc.Vpc, customName: y}}"
        ));
        assert_eq!(config.aws_resources[0].custom_name.as_deref(), Some("x"));
        assert_eq!(config.aws_resources[1].custom_name.as_deref(), Some("y"));
    }

    #[test]
    fn existing_flag_is_split_from_args() {
        let config = configuration!(format!(
            "{MINIMAL}aws_resources:\n  - name: a\n    type: vpc.Vpc\n    args:\n      existing: true\n      id: vpc-123"
        ));
        let declaration = &config.aws_resources[0];

        let (existing, args) = declaration.split_existing();

        assert!(existing);
        assert_eq!(args.keys().collect::<Vec<_>>(), vec!["id"]);
        // the declaration itself is untouched
        assert!(declaration.args.contains_key("existing"));
    }

    #[test]
    fn existing_flag_on_declaration() {
        let config = configuration!(format!(
            "{MINIMAL}aws_resources:\n  - {{name: a, type: vpc.Vpc, existing: true}}"
        ));
        assert!(config.aws_resources[0].split_existing().0);
    }

    #[test]
    fn tags() {
        let config = configuration!(format!("{MINIMAL}tags:\n  Owner: x"));
        assert_eq!(
            config.context.default_tags(),
            Some(Value::Object([("Owner".to_string(), Value::from("x"))].into()))
        );
    }
}
