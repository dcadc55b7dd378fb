//! Owner identity for retrieval loops.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque identity of the logical owner of a retrieval loop.
///
/// Equality is by type identity, not by value content: two `ContextId`s
/// compare equal iff they were created from the same Rust type. Screens and
/// view controllers use their own type as the token, so "the active context
/// changed" means "a different screen type now owns the loop".
///
/// The retriever never inspects the token beyond equality; the captured type
/// name is carried only for diagnostics.
#[derive(Clone, Copy)]
pub struct ContextId {
    id: TypeId,
    name: &'static str,
}

impl ContextId {
    /// Identity token for the type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Type name of the owning context, for logs and error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ContextId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContextId {}

impl Hash for ContextId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextId({})", self.name)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
