//! Entity identity contract
//!
//! Everything stored in a file-backed index is an entity: it carries a unique
//! `i64` id, and its ordering (and equality) is the ordering of that id. Two
//! entities with the same id are the same entity as far as the index is
//! concerned, even when their payloads differ.

/// An object with a unique integer identity, ordered by that identity
///
/// Implementations must keep `Ord`/`Eq` consistent with `id()`; the
/// [`impl_entity_ord!`](crate::impl_entity_ord) macro derives both from the id.
pub trait Entity: Ord {
    fn id(&self) -> i64;
}

impl Entity for i64 {
    fn id(&self) -> i64 {
        *self
    }
}

/// Implement `PartialEq`, `Eq`, `PartialOrd` and `Ord` for an [`Entity`] by id
///
/// ```
/// use mapindex::{impl_entity_ord, Entity};
///
/// struct Stop { id: i64, name: String }
///
/// impl Entity for Stop {
///     fn id(&self) -> i64 { self.id }
/// }
/// impl_entity_ord!(Stop);
///
/// let a = Stop { id: 1, name: "north".into() };
/// let b = Stop { id: 1, name: "south".into() };
/// assert!(a == b);
/// ```
#[macro_export]
macro_rules! impl_entity_ord {
    ($ty:ty) => {
        impl ::std::cmp::PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                $crate::Entity::id(self) == $crate::Entity::id(other)
            }
        }

        impl ::std::cmp::Eq for $ty {}

        impl ::std::cmp::PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<::std::cmp::Ordering> {
                Some(::std::cmp::Ord::cmp(self, other))
            }
        }

        impl ::std::cmp::Ord for $ty {
            fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {
                $crate::Entity::id(self).cmp(&$crate::Entity::id(other))
            }
        }
    };
}
