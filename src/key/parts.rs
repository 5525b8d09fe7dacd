//! Key Parts Module
//!
//! Canonical key formatting: `<namespace>:<prefix>` followed by `_<part>` for
//! each key part, in order. The result is the literal storage key on every
//! backend, so the layout must stay stable.

use std::fmt::{Display, Write};

/// Separator between namespace and prefix.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Separator in front of every key part.
pub const PART_SEPARATOR: char = '_';

/// Formats the `<namespace>:<prefix>` head shared by every key of an operation.
pub fn key_base(namespace: &str, prefix: &str) -> String {
    format!("{namespace}{NAMESPACE_SEPARATOR}{prefix}")
}

/// Appends `_<part>` to `key`.
pub fn push_part(key: &mut String, part: &dyn Display) {
    key.push(PART_SEPARATOR);
    // fmt::Write for String never fails
    let _ = write!(key, "{part}");
}

// == Key Parts ==
/// A fixed-shape tuple of key parts.
///
/// Implemented for `()` and tuples of up to eight `Display` elements.
pub trait KeyParts {
    /// Number of parts in the tuple.
    const ARITY: usize;

    /// Appends every part, in order, to `key`.
    fn write_parts(&self, key: &mut String);
}

impl KeyParts for () {
    const ARITY: usize = 0;

    fn write_parts(&self, _key: &mut String) {}
}

macro_rules! impl_key_parts {
    ($arity:expr => $($name:ident $idx:tt),+) => {
        impl<$($name: Display),+> KeyParts for ($($name,)+) {
            const ARITY: usize = $arity;

            fn write_parts(&self, key: &mut String) {
                $(push_part(key, &self.$idx);)+
            }
        }
    };
}

impl_key_parts!(1 => A 0);
impl_key_parts!(2 => A 0, B 1);
impl_key_parts!(3 => A 0, B 1, C 2);
impl_key_parts!(4 => A 0, B 1, C 2, D 3);
impl_key_parts!(5 => A 0, B 1, C 2, D 3, E 4);
impl_key_parts!(6 => A 0, B 1, C 2, D 3, E 4, F 5);
impl_key_parts!(7 => A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_key_parts!(8 => A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

#[cfg(test)]
mod tests {
    use super::*;

    fn format<K: KeyParts>(parts: K) -> String {
        let mut key = key_base("ns", "prefix");
        parts.write_parts(&mut key);
        key
    }

    #[test]
    fn test_key_base() {
        assert_eq!(key_base("ns", "prefix"), "ns:prefix");
    }

    #[test]
    fn test_tuple_formatting() {
        assert_eq!(format(()), "ns:prefix");
        assert_eq!(format(("a",)), "ns:prefix_a");
        assert_eq!(format(("a", 1)), "ns:prefix_a_1");
        assert_eq!(format((1u8, -2i64, 'c', 1.5f32)), "ns:prefix_1_-2_c_1.5");
        assert_eq!(
            format((1, 2, 3, 4, 5, 6, 7, 8)),
            "ns:prefix_1_2_3_4_5_6_7_8"
        );
    }

    #[test]
    fn test_arity() {
        assert_eq!(<() as KeyParts>::ARITY, 0);
        assert_eq!(<(String, i32) as KeyParts>::ARITY, 2);
        assert_eq!(<(u8, u8, u8, u8, u8) as KeyParts>::ARITY, 5);
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let user = String::from("jerry");
        assert_eq!(format((&user, 22)), format(("jerry", 22)));
    }
}
