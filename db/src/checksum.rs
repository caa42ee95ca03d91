//! Content hashes for man page bundles.

use explain_core::{ManPage, ManPagePackage};
use sha2::{Digest, Sha256};

use crate::error::{Result, StoreError};

/// Computes the SHA-256 hex digest of the JSON serialization of `manpages`.
///
/// # Errors
///
/// Returns [`JsonError`](StoreError::JsonError) if serialization fails.
pub fn manpages_hash(manpages: &[ManPage]) -> Result<String> {
    let bytes = serde_json::to_vec(manpages)?;
    let hash = Sha256::digest(&bytes);
    Ok(format!("{:x}", hash))
}

/// Records the content hash in `package.bundle_hash`.
pub fn seal_package(package: &mut ManPagePackage) -> Result<()> {
    package.bundle_hash = Some(manpages_hash(&package.manpages)?);
    Ok(())
}

/// Checks `package.bundle_hash` against the content, if a hash is recorded.
///
/// # Errors
///
/// Returns [`InvalidChecksum`](StoreError::InvalidChecksum) on mismatch.
pub fn verify_package(package: &ManPagePackage) -> Result<()> {
    let Some(expected) = package.bundle_hash.as_deref() else {
        return Ok(());
    };
    let actual = manpages_hash(&package.manpages)?;
    if actual != expected {
        return Err(StoreError::InvalidChecksum(format!(
            "bundle records {expected}, content hashes to {actual}"
        )));
    }
    Ok(())
}
