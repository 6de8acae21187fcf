//! Pack-qualified resource references.
//!
//! A reference is the deterministic string `"<pack>.<name>"` used to look
//! up namespaced resources. The pack name itself must not contain the
//! separator; the resource name may (splitting is on the first separator
//! only).

use crate::constants::PACK_SEPARATOR;
use crate::models::rule::ValidationError;
use serde::{Deserialize, Serialize};

/// A resource reference: a pack name plus a resource name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReference {
    pub pack: String,
    pub name: String,
}

impl ResourceReference {
    /// Build the `"<pack>.<name>"` reference string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidReference`] if either part is
    /// empty, or if the pack name contains the separator (which would make
    /// the reference ambiguous to parse).
    pub fn to_string_reference(pack: &str, name: &str) -> Result<String, ValidationError> {
        if pack.is_empty() || name.is_empty() {
            return Err(ValidationError::InvalidReference(format!(
                "Both pack and name needed for building a reference (pack={:?}, name={:?})",
                pack, name
            )));
        }

        if pack.contains(PACK_SEPARATOR) {
            return Err(ValidationError::InvalidReference(format!(
                "Pack name {:?} must not contain {:?}",
                pack, PACK_SEPARATOR
            )));
        }

        Ok(format!("{}{}{}", pack, PACK_SEPARATOR, name))
    }

    /// Parse a reference string into its pack and name parts.
    ///
    /// Splits on the first separator only, so resource names containing
    /// the separator round-trip correctly.
    pub fn from_string_reference(reference: &str) -> Result<Self, ValidationError> {
        let (pack, name) = reference
            .split_once(PACK_SEPARATOR)
            .filter(|(pack, name)| !pack.is_empty() && !name.is_empty())
            .ok_or_else(|| {
                ValidationError::InvalidReference(format!(
                    "{:?} is not a valid resource reference",
                    reference
                ))
            })?;

        Ok(Self {
            pack: pack.to_string(),
            name: name.to_string(),
        })
    }

    /// Whether a string looks like a `"<pack>.<name>"` reference.
    pub fn is_resource_reference(reference: &str) -> bool {
        Self::from_string_reference(reference).is_ok()
    }
}
