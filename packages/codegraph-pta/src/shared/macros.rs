//! Shared macros for the codebase
//!
//! `index_id!` declares a dense `u32` handle used as an arena index.

/// Dense handle into an arena
pub trait ArenaId: Copy + Eq + std::hash::Hash {
    fn from_index(index: usize) -> Self;
    fn to_index(self) -> usize;
}

/// Declare a `Copy` newtype over `u32` used to index an arena.
///
/// ```text
/// index_id! {
///     /// Handle of a method in the program arena
///     pub struct MethodId;
/// }
/// ```
#[macro_export]
macro_rules! index_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        $vis struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl $crate::shared::macros::ArenaId for $name {
            #[inline]
            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            fn to_index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}
