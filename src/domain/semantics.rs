//! The payload contract carried by every tree node.

use std::fmt;

use crate::domain::arena::NodeId;

/// Semantic payload of a tree node.
///
/// A payload is an immutable value. It is bound to its owning node once when
/// the node is created and again on every read, so a payload that cares about
/// its position in the tree can record the owner. The default binding is a
/// plain clone, which is what simple value payloads want.
///
/// Binding must not change equality: two payloads equal before `bind` stay
/// equal after it, whatever node they are bound to.
pub trait Semantics: Clone + PartialEq + fmt::Debug {
    /// Produces a logically equal copy bound to `owner`.
    fn bind(&self, _owner: NodeId) -> Self {
        self.clone()
    }
}

macro_rules! value_semantics {
    ($($ty:ty),* $(,)?) => {
        $(impl Semantics for $ty {})*
    };
}

value_semantics!(
    String,
    &'static str,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
);
