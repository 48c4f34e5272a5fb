//!
//! # Technology Result and Error Types
//!

// Local Imports
use crate::stack::StackLayerId;
use tech21utils as utils;

/// # [TechError] Result Type
pub type TechResult<T> = Result<T, TechError>;

///
/// # Technology Error Enumeration
///
pub enum TechError {
    /// A name-based reference which resolves to nothing
    DanglingReference {
        /// The unresolved name
        name: String,
        /// Description of the referring entry
        referrer: String,
    },
    /// Two entries of a name-keyed registry share a name
    DuplicateName { registry: &'static str, name: String },
    /// Two rows of a parasitics table share a key
    DuplicateKey { table: &'static str, key: String },
    /// Metal heights which do not follow `lower.height + lower.thickness + contact.thickness`
    HeightMismatch {
        lower: String,
        upper: String,
        expected: f64,
        actual: f64,
    },
    /// A computed layer whose kind is inconsistent with the purpose of the layer it derives from
    KindPurpose { name: String, message: String },
    /// A [StackLayerId] which does not refer to an entry of its stack
    InvalidHandle(StackLayerId),
    /// Attempt to attach a contact to a layer-type which has none
    NoContactSlot {
        name: String,
        layer_type: &'static str,
    },
    /// Error Exporting to the Proto Schema
    Export {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// Error Importing from the Proto Schema
    Import {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// Boxed External Errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized Error, with String Message
    Str(String),
}
impl TechError {
    /// Create a [TechError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create an error-variant [Result] of our [TechError::Str] variant from anything String-convertible
    pub fn fail<T>(s: impl Into<String>) -> Result<T, Self> {
        Err(Self::msg(s))
    }
    /// Create a [TechError::DanglingReference]
    pub fn dangling(name: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self::DanglingReference {
            name: name.into(),
            referrer: referrer.into(),
        }
    }
}
impl std::fmt::Debug for TechError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TechError::DanglingReference { name, referrer } => {
                write!(f, "Dangling Layer Reference: `{}` (from {})", name, referrer)
            }
            TechError::DuplicateName { registry, name } => {
                write!(f, "Duplicate Name: `{}` appears twice in {}", name, registry)
            }
            TechError::DuplicateKey { table, key } => {
                write!(f, "Duplicate Key: {} appears twice in {}", key, table)
            }
            TechError::HeightMismatch {
                lower,
                upper,
                expected,
                actual,
            } => write!(
                f,
                "Height Mismatch: `{}` should sit at {} (top of `{}` plus its contact), found {}",
                upper, expected, lower, actual
            ),
            TechError::KindPurpose { name, message } => {
                write!(f, "Kind/Purpose Mismatch on `{}`: {}", name, message)
            }
            TechError::InvalidHandle(id) => write!(f, "Invalid Stack Layer Handle: {:?}", id),
            TechError::NoContactSlot { name, layer_type } => {
                write!(f, "Layer `{}` of type {} has no contact", name, layer_type)
            }
            TechError::Export { message, stack } => {
                write!(f, "Export Error: \n - {} \n - {:?}", message, stack)
            }
            TechError::Import { message, stack } => {
                write!(f, "Import Error: \n - {} \n - {:?}", message, stack)
            }
            TechError::Boxed(err) => err.fmt(f),
            TechError::Str(err) => err.fmt(f),
        }
    }
}
impl std::fmt::Display for TechError {
    /// Display a [TechError]
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for TechError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<String> for TechError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for TechError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<utils::ser::Error> for TechError {
    fn from(e: utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<serde_json::Error> for TechError {
    fn from(e: serde_json::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::io::Error> for TechError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<prost::DecodeError> for TechError {
    fn from(e: prost::DecodeError) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<tech21protos::TextFormatError> for TechError {
    fn from(e: tech21protos::TextFormatError) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::str::Utf8Error> for TechError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}

/// Enumerated conversion contexts
/// Generally used for error reporting
#[derive(Debug, Clone)]
pub enum ErrorContext {
    Technology(String),
    Layer(String),
    ComputedLayer(String),
    StackLayer(String),
    Contact(String),
    Resistance,
    Capacitance,
}
