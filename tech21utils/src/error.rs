//!
//! # Tech21 Error-Helper Utilities
//!
//! Shared by the tree-walkers which convert between technology representations.
//! Each walker keeps some context (which layer, which table) and injects it
//! into every error it produces via [`ErrorHelper::err`].
//!
//! ```rust
//! use tech21utils::error::{ErrorHelper, Unwrapper};
//!
//! struct LayerWalker {
//!     layer: String,
//! }
//! impl ErrorHelper for LayerWalker {
//!     type Error = String;
//!     fn err(&self, msg: impl Into<String>) -> Self::Error {
//!         format!("{} (in layer `{}`)", msg.into(), self.layer)
//!     }
//! }
//! impl LayerWalker {
//!     fn thickness(&self, t: Option<f64>) -> Result<f64, String> {
//!         let t = t.unwrapper(self, "Missing thickness")?;
//!         self.assert(t >= 0.0, "Negative thickness")?;
//!         Ok(t)
//!     }
//! }
//! ```
//!

///
/// # ErrorHelper
///
/// Implementers define `err`, creating their error type from a message.
/// The remaining methods are provided in terms of it.
///
pub trait ErrorHelper {
    type Error;

    /// Create and return a [Self::Error] value.
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Return failure
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwrap the [Option] `opt` if it is [Some], and return our error if not.
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Unwrap the [Result] `res`, replacing any error with our own.
    /// The original error's text is appended to `msg`.
    fn ok<T, E: std::fmt::Display>(
        &self,
        res: Result<T, E>,
        msg: impl Into<String>,
    ) -> Result<T, Self::Error> {
        match res {
            Ok(val) => Ok(val),
            Err(e) => self.fail(format!("{}: {}", msg.into(), e)),
        }
    }
    /// Assert a boolean condition. Returns through `self.fail` if it is not satisfied.
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}

///
/// # Unwrapper
///
/// Post-fix application of [`ErrorHelper`] handling to [`Option`]s and [`Result`]s.
///
/// ```rust
/// use tech21utils::error::{ErrorHelper, Unwrapper};
///
/// fn example(h: &impl ErrorHelper<Error = String>) -> Result<(), String> {
///     Some(5).unwrapper(h, "Option failed!")?;
///     let r: Result<(), String> = Ok(());
///     r.unwrapper(h, "Result failed!")
/// }
/// ```
///
pub trait Unwrapper {
    type Ok;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper;
}

impl<T> Unwrapper for Option<T> {
    type Ok = T;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper,
    {
        helper.unwrap(self, msg)
    }
}

impl<T, E: std::fmt::Display> Unwrapper for Result<T, E> {
    type Ok = T;
    fn unwrapper<H>(
        self,
        helper: &H,
        msg: impl Into<String>,
    ) -> Result<<Self as Unwrapper>::Ok, H::Error>
    where
        H: ErrorHelper,
    {
        helper.ok(self, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Walker(&'static str);
    impl ErrorHelper for Walker {
        type Error = String;
        fn err(&self, msg: impl Into<String>) -> String {
            format!("[{}] {}", self.0, msg.into())
        }
    }

    #[test]
    fn context_is_injected() {
        let w = Walker("met1");
        let e = None::<f64>.unwrapper(&w, "no height").unwrap_err();
        assert_eq!(e, "[met1] no height");

        let r: Result<u32, std::num::ParseIntError> = "x".parse::<u32>();
        let e = r.unwrapper(&w, "bad datatype").unwrap_err();
        assert!(e.starts_with("[met1] bad datatype: "));

        assert!(w.assert(true, "unreachable").is_ok());
        assert_eq!(w.assert(false, "negative").unwrap_err(), "[met1] negative");
    }
}
