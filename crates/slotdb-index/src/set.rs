//! Index sets: every secondary index a container maintains, as one unit.
//!
//! An index set is normally declared with [`indices!`](crate::indices),
//! which generates a struct with one [`SecondaryIndex`](crate::SecondaryIndex)
//! per tag plus the [`IndexSet`] and [`IndexSelector`](crate::IndexSelector)
//! implementations. `()` is the empty set, for containers that only need
//! lookup by id.

use std::fmt;

use slotdb_types::{Object, Oid};

use crate::tag::IndexKind;

/// An index that already holds a key under another object's id.
pub struct Conflict<V> {
    /// Name of the index holding the key.
    pub index: &'static str,
    /// Kind of that index.
    pub kind: IndexKind,
    /// The object already holding the key.
    pub holder: Oid<V>,
}

impl<V> Clone for Conflict<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Conflict<V> {}

impl<V> PartialEq for Conflict<V> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.kind == other.kind && self.holder == other.holder
    }
}

impl<V> Eq for Conflict<V> {}

impl<V> fmt::Debug for Conflict<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conflict")
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("holder", &self.holder)
            .finish()
    }
}

impl<V> fmt::Display for Conflict<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` ({}) held by {}", self.index, self.kind, self.holder)
    }
}

/// The set of secondary indices maintained over values of type `V`.
///
/// Callers check before they mutate: [`conflict`](Self::conflict) and
/// [`replace_conflict`](Self::replace_conflict) must come back empty before
/// [`insert`](Self::insert) or [`replace`](Self::replace) is called.
/// Mutating methods assume the check passed.
pub trait IndexSet<V: Object>: Default {
    /// First unique index that already holds one of `value`'s keys.
    fn conflict(&self, value: &V) -> Option<Conflict<V>>;

    /// First unique index whose key changes between `old` and `new` and
    /// whose new key is held by another object.
    fn replace_conflict(&self, old: &V, new: &V) -> Option<Conflict<V>>;

    /// Every index, unique or not, already holding one of `value`'s keys
    /// under another id.
    fn matches(&self, value: &V) -> Vec<Conflict<V>>;

    /// Index `value` in every index.
    fn insert(&mut self, value: &V);

    /// Remove `value` from every index.
    fn remove(&mut self, value: &V);

    /// Move an object's entries from `old`'s keys to `new`'s keys.
    fn replace(&mut self, old: &V, new: &V);

    /// Drop every entry of every index.
    fn clear(&mut self);
}

impl<V: Object> IndexSet<V> for () {
    fn conflict(&self, _value: &V) -> Option<Conflict<V>> {
        None
    }

    fn replace_conflict(&self, _old: &V, _new: &V) -> Option<Conflict<V>> {
        None
    }

    fn matches(&self, _value: &V) -> Vec<Conflict<V>> {
        Vec::new()
    }

    fn insert(&mut self, _value: &V) {}

    fn remove(&mut self, _value: &V) {}

    fn replace(&mut self, _old: &V, _new: &V) {}

    fn clear(&mut self) {}
}

/// Declare an index set over a value type.
///
/// Generates a struct with one [`SecondaryIndex`](crate::SecondaryIndex)
/// field per tag, its `Default` and [`IndexSet`] implementations, and an
/// [`IndexSelector`](crate::IndexSelector) impl per tag so containers can
/// hand out a typed view with `get_index::<Tag>()`.
///
/// ```
/// use slotdb_index::{indices, IndexKind, IndexSet, IndexTag};
/// use slotdb_types::{Object, Oid};
///
/// struct Account { id: Oid<Account>, name: String }
///
/// impl Object for Account {
///     fn id(&self) -> Oid<Self> { self.id }
/// }
///
/// struct ByName;
/// impl IndexTag<Account> for ByName {
///     const NAME: &'static str = "by_name";
///     const KIND: IndexKind = IndexKind::OrderedUnique;
///     type Key = String;
///     fn key(value: &Account) -> String { value.name.clone() }
/// }
///
/// indices! {
///     pub struct AccountIndices for Account {
///         by_name: ByName,
///     }
/// }
///
/// let set = AccountIndices::default();
/// assert!(set.conflict(&Account { id: Oid::new(1), name: "ann".into() }).is_none());
/// ```
#[macro_export]
macro_rules! indices {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident for $value:ty {
            $( $field:ident : $tag:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $field: $crate::SecondaryIndex<$value, $tag>, )+
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self {
                    $( $field: $crate::SecondaryIndex::new(), )+
                }
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct(::core::stringify!($name))
                    $( .field(::core::stringify!($field), &self.$field) )+
                    .finish()
            }
        }

        impl $crate::IndexSet<$value> for $name {
            fn conflict(&self, value: &$value) -> ::core::option::Option<$crate::Conflict<$value>> {
                $(
                    if let ::core::option::Option::Some(found) = self.$field.conflict(value) {
                        return ::core::option::Option::Some(found);
                    }
                )+
                ::core::option::Option::None
            }

            fn replace_conflict(
                &self,
                old: &$value,
                new: &$value,
            ) -> ::core::option::Option<$crate::Conflict<$value>> {
                $(
                    if let ::core::option::Option::Some(found) = self.$field.replace_conflict(old, new) {
                        return ::core::option::Option::Some(found);
                    }
                )+
                ::core::option::Option::None
            }

            fn matches(&self, value: &$value) -> ::std::vec::Vec<$crate::Conflict<$value>> {
                let mut found = ::std::vec::Vec::new();
                $( found.extend(self.$field.matching(value)); )+
                found
            }

            fn insert(&mut self, value: &$value) {
                $( self.$field.insert(value); )+
            }

            fn remove(&mut self, value: &$value) {
                $( self.$field.remove(value); )+
            }

            fn replace(&mut self, old: &$value, new: &$value) {
                $( self.$field.reindex(old, new); )+
            }

            fn clear(&mut self) {
                $( self.$field.clear(); )+
            }
        }

        $(
            impl $crate::IndexSelector<$value, $name> for $tag {
                type View<'a> = $crate::SecondaryView<'a, $value, $tag>
                where
                    $value: 'a,
                    $name: 'a;

                fn select<'a>(
                    indices: &'a $name,
                    storage: &'a dyn $crate::Resolve<$value>,
                ) -> Self::View<'a>
                where
                    $value: 'a,
                {
                    $crate::SecondaryView::new(&indices.$field, storage)
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IndexTag, SecondaryIndex};

    #[derive(Debug)]
    struct Item {
        id: Oid<Item>,
        code: u32,
        group: u8,
    }

    impl Object for Item {
        fn id(&self) -> Oid<Self> {
            self.id
        }
    }

    struct ByCode;
    impl IndexTag<Item> for ByCode {
        const NAME: &'static str = "by_code";
        const KIND: IndexKind = IndexKind::HashedUnique;
        type Key = u32;
        fn key(value: &Item) -> u32 {
            value.code
        }
    }

    struct ByGroup;
    impl IndexTag<Item> for ByGroup {
        const NAME: &'static str = "by_group";
        const KIND: IndexKind = IndexKind::OrderedNonUnique;
        type Key = u8;
        fn key(value: &Item) -> u8 {
            value.group
        }
    }

    crate::indices! {
        struct ItemIndices for Item {
            by_code: ByCode,
            by_group: ByGroup,
        }
    }

    fn item(id: u64, code: u32, group: u8) -> Item {
        Item {
            id: Oid::new(id),
            code,
            group,
        }
    }

    #[test]
    fn empty_set_accepts_everything() {
        let mut set = ();
        let a = item(1, 1, 1);
        assert!(IndexSet::conflict(&set, &a).is_none());
        IndexSet::insert(&mut set, &a);
        IndexSet::remove(&mut set, &a);
        assert!(IndexSet::<Item>::matches(&set, &a).is_empty());
    }

    #[test]
    fn conflict_comes_from_unique_index_only() {
        let mut set = ItemIndices::default();
        set.insert(&item(1, 100, 7));

        assert!(set.conflict(&item(2, 200, 7)).is_none());
        let found = set.conflict(&item(2, 100, 9)).unwrap();
        assert_eq!(found.index, "by_code");
        assert_eq!(found.holder, Oid::new(1));
    }

    #[test]
    fn matches_reports_every_index() {
        let mut set = ItemIndices::default();
        set.insert(&item(1, 100, 7));
        let found = set.matches(&item(2, 100, 7));
        let names: Vec<&str> = found.iter().map(|c| c.index).collect();
        assert_eq!(names, vec!["by_code", "by_group"]);
    }

    #[test]
    fn replace_moves_every_index() {
        let mut set = ItemIndices::default();
        let old = item(1, 100, 7);
        set.insert(&old);
        let new = item(1, 101, 8);
        assert!(set.replace_conflict(&old, &new).is_none());
        set.replace(&old, &new);

        assert_eq!(set.by_code.holder(&101), Some(Oid::new(1)));
        assert!(set.by_code.holder(&100).is_none());
        assert_eq!(set.by_group.holder(&8), Some(Oid::new(1)));
    }

    #[test]
    fn remove_and_clear() {
        let mut set = ItemIndices::default();
        let a = item(1, 100, 7);
        set.insert(&a);
        set.insert(&item(2, 200, 7));
        set.remove(&a);
        assert_eq!(set.by_code.len(), 1);
        assert_eq!(set.by_group.equal_ids(&7).count(), 1);
        set.clear();
        assert!(set.by_group.is_empty());
    }

    #[test]
    fn conflict_display() {
        let c = Conflict::<Item> {
            index: "by_code",
            kind: IndexKind::HashedUnique,
            holder: Oid::new(3),
        };
        assert_eq!(c.to_string(), "`by_code` (hashed-unique) held by 3");
    }

    #[test]
    fn debug_lists_fields() {
        let set = ItemIndices::default();
        let debug = format!("{set:?}");
        assert!(debug.contains("ItemIndices"));
        assert!(debug.contains("by_group"));
    }

    #[test]
    fn secondary_index_type_is_reachable() {
        let idx: SecondaryIndex<Item, ByGroup> = SecondaryIndex::default();
        assert_eq!(idx.kind(), IndexKind::OrderedNonUnique);
    }
}
