//!
//! # Enum-String Mapping Module
//!
//! Defines the [enumstr] macro and paired [EnumStr] trait,
//! for enumerations exposed as one of a fixed set of strings.
//! Schema enum value names (`PURPOSE_METAL`, `KIND_REGULAR`) and
//! command-line format names both use it.
//!
//! The [EnumStr] trait defines:
//! * `to_str(&self) -> &'static str` converts the enum to its string value.
//! * `from_str(&str) -> Option<Self>` does the opposite.
//! * `variants()` lists every variant, in declaration order.
//!
//! Example:
//!
//! ```rs
//! use tech21utils::enumstr;
//!
//! enumstr!(
//! /// # Light-Switch States: ON and OFF
//! LightSwitch {
//!     On: "ON",
//!     Off: "OFF",
//!  }
//! );
//! ```
//!

///
/// # String-Enumeration Trait
///
/// Primarily implemented by the [enumstr] macro.
///
pub trait EnumStr: std::marker::Sized + 'static {
    fn to_str(&self) -> &'static str;
    fn from_str(txt: &str) -> Option<Self>;
    fn variants() -> &'static [Self];
}

///
/// # Enum-String Pairing Macro
///
/// Creates a fieldless `enum` which:
/// * (a) Implements [EnumStr] for conversions to and from its string values
/// * (b) Implements [std::fmt::Display], writing the string values
/// * (c) Serializes and deserializes *as* its string values, via serde renames
///
/// The invoking module must have `serde::{Deserialize, Serialize}` and [EnumStr] in scope.
///
#[macro_export]
macro_rules! enumstr {
    (   $(#[$meta: meta])*
        $enum_name: ident {
        $( $variant: ident : $strval: literal ),* $(,)?
    }) => {
        $(#[$meta])*
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $( #[doc=$strval]
               #[serde(rename = $strval)]
                $variant ),*
        }
        impl EnumStr for $enum_name {
            /// Convert a [$enum_name] variant to its paired (static) string value.
            fn to_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $strval),*,
                }
            }
            /// Create a [$enum_name] from one of its string-values.
            /// Returns `None` if input `txt` does not match one of [$enum_name]'s variants.
            /// Matching is case *sensitive*.
            fn from_str(txt: &str) -> Option<Self> {
                match txt {
                    $( $strval => Some(Self::$variant)),*,
                    _ => None,
                }
            }
            fn variants() -> &'static [Self] {
                &[ $( Self::$variant ),* ]
            }
        }
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.to_str())
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    enumstr!(
        /// # Dielectric Kinds
        DielectricKind {
            Simple: "DIELECTRIC_SIMPLE",
            Conformal: "DIELECTRIC_CONFORMAL",
        }
    );

    #[test]
    fn test_enumstr() {
        assert_eq!(DielectricKind::Simple.to_str(), "DIELECTRIC_SIMPLE");
        assert_eq!(
            DielectricKind::from_str("DIELECTRIC_CONFORMAL"),
            Some(DielectricKind::Conformal)
        );
        assert_eq!(DielectricKind::from_str("dielectric_simple"), None);
        assert_eq!(DielectricKind::variants().len(), 2);
        assert_eq!(format!("{}", DielectricKind::Conformal), "DIELECTRIC_CONFORMAL");
    }

    #[test]
    fn serializes_as_string_value() {
        let s = serde_json::to_string(&DielectricKind::Simple).unwrap();
        assert_eq!(s, "\"DIELECTRIC_SIMPLE\"");
        let k: DielectricKind = serde_json::from_str("\"DIELECTRIC_CONFORMAL\"").unwrap();
        assert_eq!(k, DielectricKind::Conformal);
    }
}
