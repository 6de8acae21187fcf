//! Rule Data Structures
//!
//! This module defines the two rule record shapes and their supporting
//! types:
//!
//! - `LegacyRule` - rule as stored before pack namespacing existed
//! - `Rule` - pack-namespaced rule (adds `pack` and derived `ref`)
//! - `ActionSpec` - embedded action sub-record
//! - `ResourceReference` - `pack.name` reference string handling
//!
//! Both shapes describe the same domain entity: a binding of a trigger
//! (event source) to an action (executable response) with match criteria
//! and an enabled flag.

pub mod reference;
pub mod rule;

pub use reference::ResourceReference;
pub use rule::{ActionSpec, LegacyRule, Rule, Tag, ValidationError};
