//! [`ScriptHost`] — bookkeeping shared across every entity's script context.

use std::collections::HashSet;

use crate::error::ScriptError;
use crate::script::EntityScript;

/// Tracks which entity ids currently have an active script context.
///
/// The host does not own any [`EntityScript`] — each is owned by its
/// `SpaceEntity`. The host exists so the engine has one place to ask "does
/// this entity have a script to tick" without every caller threading a
/// `HashMap<u64, EntityScript>` through by hand, and so a future module
/// loader / shared native-binding registry has somewhere to live.
#[derive(Debug, Default)]
pub struct ScriptHost {
    registered: HashSet<u64>,
}

impl ScriptHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context for `script`, evaluate its current source, and mark
    /// its entity as registered.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError`] if the context cannot be created or the
    /// source raises an exception.
    pub fn bind(&mut self, script: &mut EntityScript, source: impl Into<String>) -> Result<(), ScriptError> {
        script.set_source(source)?;
        self.registered.insert(script.entity_id());
        Ok(())
    }

    /// Mark `entity_id`'s script context as torn down.
    pub fn unregister(&mut self, entity_id: u64) {
        self.registered.remove(&entity_id);
    }

    #[must_use]
    pub fn is_registered(&self, entity_id: u64) -> bool {
        self.registered.contains(&entity_id)
    }

    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregister_unknown_entity_is_noop() {
        let mut host = ScriptHost::new();
        host.unregister(999);
        assert_eq!(host.registered_count(), 0);
    }

    #[test]
    fn test_is_registered_false_initially() {
        let host = ScriptHost::new();
        assert!(!host.is_registered(1));
    }
}
