/// Borrow the payload of one enum variant, if the value is that variant.
pub trait TryAsRef<T> {
    fn try_as_ref(&self) -> Option<&T>;
}

/// Mutable counterpart of [`TryAsRef`].
pub trait TryAsMut<T> {
    fn try_as_mut(&mut self) -> Option<&mut T>;
}

/// Implements [`TryAsRef`] and [`TryAsMut`] for every listed `Variant(Type)`
/// of a payload enum.
///
/// ```
/// use oriel_utils::impl_try_as;
/// use oriel_utils::convert::TryAsRef;
///
/// enum Value {
///     Text(String),
///     Count(usize),
/// }
///
/// impl_try_as!(Value, Text(String), Count(usize));
///
/// let value = Value::Count(3);
/// assert_eq!(TryAsRef::<usize>::try_as_ref(&value), Some(&3));
/// assert!(TryAsRef::<String>::try_as_ref(&value).is_none());
/// ```
#[macro_export]
macro_rules! impl_try_as {
    ($enum_type:ident, $($variant:ident($variant_type:ty)),* $(,)?) => {
        $(
            impl $crate::convert::TryAsRef<$variant_type> for $enum_type {
                fn try_as_ref(&self) -> Option<&$variant_type> {
                    match self {
                        $enum_type::$variant(val) => Some(val),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }

            impl $crate::convert::TryAsMut<$variant_type> for $enum_type {
                fn try_as_mut(&mut self) -> Option<&mut $variant_type> {
                    match self {
                        $enum_type::$variant(val) => Some(val),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }
        )*
    };
}
