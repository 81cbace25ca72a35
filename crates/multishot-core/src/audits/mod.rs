//! Built-in cleaners, grouped by defect class (`pub_audits`, `person_audits`,
//! `misc_audits`). New cleaners are added here and registered in
//! [`builtin_registry`].

use crate::error::Result;
use crate::registry::{Cleaner, CleanerCategory, CleanerRegistry};

pub mod pub_audits;

pub fn builtin_registry() -> Result<CleanerRegistry> {
    let mut registry = CleanerRegistry::new();
    registry.register(
        Cleaner::new(pub_audits::DUPE_AUTHORSHIPS, CleanerCategory::Pub)
            .with_sub(pub_audits::detect_duplicate_authorships),
    )?;
    Ok(registry)
}
