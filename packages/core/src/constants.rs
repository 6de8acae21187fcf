//! Shared constants for pack namespacing.

/// Pack assigned to every rule migrated from the legacy collection.
/// The migration never inspects or infers pack membership.
pub const DEFAULT_PACK_NAME: &str = "default";

/// Separator between pack name and resource name in a reference string.
pub const PACK_SEPARATOR: char = '.';
