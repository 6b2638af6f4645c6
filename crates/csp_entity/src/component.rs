//! [`Component`] — a typed, keyed property bag attached to a [`crate::SpaceEntity`].

use std::collections::HashMap;

use csp_value::ReplicatedValue;
use csp_wire::ComponentType;

/// Property keys `1..=64` are reserved for entity-level ("view") properties
/// and must never be assigned to a real component's id or property key.
pub const VIEW_KEY_MIN: u32 = 1;
pub const VIEW_KEY_MAX: u32 = 64;

/// Component ids are allocated densely starting here, so they never collide
/// with the reserved view-key range.
pub const COMPONENT_ID_FLOOR: u16 = 65;

/// Whether a dirty component entry is a brand-new component or an update to
/// an existing one. Both get serialized into the next outbound patch;
/// removal is tracked separately (`SpaceEntity::transient_deletions`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentDirtyState {
    Add,
    Update,
}

/// An opaque, keyed bag of [`ReplicatedValue`]s.
///
/// Concrete component semantics (animation, audio, a light's color, ...) are
/// schema to this engine: it only inspects a component's
/// [`ComponentType`] to enforce the `ScriptData` singleton invariant and to
/// partition avatars from objects.
#[derive(Debug, Clone)]
pub struct Component {
    id: u16,
    component_type: ComponentType,
    committed: HashMap<u32, ReplicatedValue>,
    staged: HashMap<u32, ReplicatedValue>,
}

impl Component {
    pub(crate) fn new(id: u16, component_type: ComponentType) -> Self {
        Self {
            id,
            component_type,
            committed: HashMap::new(),
            staged: HashMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> u16 {
        self.id
    }

    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// Returns the committed value for `key`, or the not-yet-committed
    /// staged value if a local write is pending — callers always see their
    /// own writes immediately even though the wire hasn't carried them yet.
    /// `None` if `key` has never been set.
    #[must_use]
    pub fn get_property(&self, key: u32) -> Option<&ReplicatedValue> {
        self.staged.get(&key).or_else(|| self.committed.get(&key))
    }

    /// Stage a property write. Does not transmit; becomes visible on the
    /// wire at the next tick that serializes this entity's dirty set.
    pub fn set_property(&mut self, key: u32, value: ReplicatedValue) {
        self.staged.insert(key, value);
    }

    #[must_use]
    pub fn committed_properties(&self) -> &HashMap<u32, ReplicatedValue> {
        &self.committed
    }

    /// Only the not-yet-committed writes — what `crate::serializer` needs to
    /// build the next outbound patch entry for this component.
    #[must_use]
    pub fn staged_properties(&self) -> &HashMap<u32, ReplicatedValue> {
        &self.staged
    }

    /// Commit all staged properties. Returns `true` if anything was staged.
    pub(crate) fn commit(&mut self) -> bool {
        if self.staged.is_empty() {
            return false;
        }
        for (key, value) in self.staged.drain() {
            self.committed.insert(key, value);
        }
        true
    }

    /// Apply a remote patch's property updates directly to committed state
    /// (no staging — remote state is already authoritative).
    pub(crate) fn apply_remote(&mut self, properties: HashMap<u32, ReplicatedValue>) {
        for (key, value) in properties {
            self.committed.insert(key, value);
        }
    }

    /// Snapshot of everything that would be sent if this component were
    /// serialized right now: staged writes layered over committed state.
    #[must_use]
    pub fn effective_properties(&self) -> HashMap<u32, ReplicatedValue> {
        let mut merged = self.committed.clone();
        merged.extend(self.staged.clone());
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_component_has_no_properties() {
        let c = Component::new(65, ComponentType::ScriptData);
        assert!(c.get_property(1).is_none());
    }

    #[test]
    fn test_staged_write_visible_before_commit() {
        let mut c = Component::new(65, ComponentType::Other(10));
        c.set_property(1, ReplicatedValue::Integer(42));
        assert_eq!(c.get_property(1), Some(&ReplicatedValue::Integer(42)));
        assert!(c.committed_properties().is_empty());
    }

    #[test]
    fn test_commit_moves_staged_to_committed() {
        let mut c = Component::new(65, ComponentType::Other(10));
        c.set_property(1, ReplicatedValue::Integer(42));
        assert!(c.commit());
        assert_eq!(c.committed_properties().get(&1), Some(&ReplicatedValue::Integer(42)));
        assert!(!c.commit(), "second commit with nothing staged returns false");
    }

    #[test]
    fn test_apply_remote_is_immediate() {
        let mut c = Component::new(65, ComponentType::Other(10));
        let mut props = HashMap::new();
        props.insert(1, ReplicatedValue::Boolean(true));
        c.apply_remote(props);
        assert_eq!(c.get_property(1), Some(&ReplicatedValue::Boolean(true)));
    }
}
