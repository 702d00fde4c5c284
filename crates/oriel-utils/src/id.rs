/// Defines a `Copy` index newtype over `u32`.
///
/// Ids are handed out by the arena that owns the indexed values, so the
/// constructor takes the arena position rather than an arbitrary number.
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        pub struct $name {
            id: u32,
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.id)
            }
        }

        impl $name {
            pub const fn new(id: u32) -> Self {
                Self { id }
            }

            /// Id of the element at `index` of an arena.
            pub fn from_usize(index: usize) -> Self {
                let id = u32::try_from(index).unwrap_or_else(|_| {
                    panic!("{} arena exceeded u32::MAX entries", stringify!($name))
                });
                Self { id }
            }

            pub fn as_usize(&self) -> usize {
                self.id as usize
            }

            pub fn id(&self) -> u32 {
                self.id
            }
        }
    };
}

#[cfg(test)]
mod tests {
    define_id!(ThingId);

    #[test]
    fn ids_order_by_position() {
        let a = ThingId::from_usize(3);
        let b = ThingId::new(7);

        assert!(a < b);
        assert_eq!(a.as_usize(), 3);
        assert_eq!(format!("{b:?}"), "ThingId(7)");
        assert_eq!(b.to_string(), "7");
    }
}
