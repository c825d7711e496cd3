//! naming convention
//!
//! Generated names follow `{team}-{service}-{environment}-{region}-{base}`, for example
//! `demo-example-dev-use1-vpc-example`. The region is abbreviated via [REGION_ABBREVIATIONS].
use crate::config::OrganizationalContext;

/// Canonical region abbreviations
pub const REGION_ABBREVIATIONS: &[(&str, &str)] = &[
    ("us-east-1", "use1"),
    ("us-east-2", "use2"),
    ("us-west-1", "usw1"),
    ("us-west-2", "usw2"),
    ("af-south-1", "afs1"),
    ("ap-east-1", "ape1"),
    ("ap-south-1", "aps1"),
    ("ap-south-2", "aps2"),
    ("ap-northeast-1", "apne1"),
    ("ap-northeast-2", "apne2"),
    ("ap-northeast-3", "apne3"),
    ("ap-southeast-1", "apse1"),
    ("ap-southeast-2", "apse2"),
    ("ap-southeast-3", "apse3"),
    ("ca-central-1", "cac1"),
    ("ca-west-1", "caw1"),
    ("eu-central-1", "euc1"),
    ("eu-central-2", "euc2"),
    ("eu-west-1", "euw1"),
    ("eu-west-2", "euw2"),
    ("eu-west-3", "euw3"),
    ("eu-north-1", "eun1"),
    ("eu-south-1", "eus1"),
    ("eu-south-2", "eus2"),
    ("il-central-1", "ilc1"),
    ("me-south-1", "mes1"),
    ("me-central-1", "mec1"),
    ("sa-east-1", "sae1"),
    ("us-gov-east-1", "usge1"),
    ("us-gov-west-1", "usgw1"),
    ("cn-north-1", "cnn1"),
    ("cn-northwest-1", "cnnw1"),
];

/// Abbreviation for `region`
///
/// Unknown regions fall back to their first `-` delimited segment (`foo-bar-1` becomes `foo`).
pub fn region_abbreviation(region: &str) -> String {
    let region = region.trim().to_lowercase();

    if let Some((_, abbreviation)) = REGION_ABBREVIATIONS
        .iter()
        .find(|(known, _)| *known == region)
    {
        return abbreviation.to_string();
    }

    match region.split_once('-') {
        Some((first, _)) => first.to_string(),
        None => region,
    }
}

impl OrganizationalContext {
    /// Generate the conventional name for a resource
    ///
    /// Never fails, unknown regions degrade via [region_abbreviation].
    pub fn generate_name(&self, base_name: &str) -> String {
        let normalize = |s: &str| s.trim().to_lowercase();

        format!(
            "{}-{}-{}-{}-{}",
            normalize(&self.team),
            normalize(&self.service),
            normalize(&self.environment),
            region_abbreviation(&self.region),
            base_name
        )
        .to_lowercase()
    }
}
