use serde::{Deserialize, Serialize};

use crate::ManPage;

/// Version of the man page data contract (semver).
pub const MANPAGE_CONTRACT_VERSION: &str = "1.0.0";

/// Serializable bundle of man pages used for distribution.
///
/// # Examples
///
/// ```
/// use explain_core::*;
///
/// let mut package = ManPagePackage::new("1.0.0", "2024-01-15T10:30:00Z");
/// package.name = Some("coreutils".into());
/// package.manpages.push(ManPage::new("ls.1.gz", "ls"));
/// package.manpages.push(ManPage::new("cp.1.gz", "cp"));
///
/// assert_eq!(package.manpage_count(), 2);
/// assert_eq!(package.version, "1.0.0");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManPagePackage {
    /// Data contract version (from [`MANPAGE_CONTRACT_VERSION`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_version: Option<String>,
    /// Package format version (semver string).
    pub version: String,
    /// Optional package name.
    pub name: Option<String>,
    /// Optional package description.
    pub description: Option<String>,
    /// ISO-8601 timestamp for package creation.
    pub generated_at: String,
    /// Optional SHA-256 of the serialized man pages.
    pub bundle_hash: Option<String>,
    /// Man pages included in this package.
    pub manpages: Vec<ManPage>,
}

impl ManPagePackage {
    /// Creates a package with required fields.
    pub fn new(version: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            contract_version: Some(MANPAGE_CONTRACT_VERSION.to_string()),
            version: version.into(),
            name: None,
            description: None,
            generated_at: generated_at.into(),
            bundle_hash: None,
            manpages: Vec::new(),
        }
    }

    /// Returns the number of man pages in this package.
    pub fn manpage_count(&self) -> usize {
        self.manpages.len()
    }
}
