//! The lens failure type and its combinator stack trace.
//!
//! Composite lenses are deeply nested, so a bare "expected a record" message
//! is useless without knowing *which* combinator, *how deep*, and in *which
//! direction* the failure happened. [`LensError`] therefore carries an
//! ordered list of [`Frame`]s, innermost first, that every composition
//! boundary appends to while the error propagates outward:
//!
//! ```text
//! lens error in hoist: expected a record, got 3
//!   in seq(filter, hoist) [get]
//!   in xfork(seq, id) [get]
//! ```
//!
//! The idiom at each boundary is capture-and-rethrow:
//!
//! ```
//! use bilens::error::{Frame, LensError, Result};
//!
//! fn inner() -> Result<()> {
//!     Err(LensError::new("hoist", "expected a record, got 3"))
//! }
//!
//! fn outer() -> Result<()> {
//!     inner().map_err(|error| error.with_frame(Frame::new("seq", "filter, hoist", "get")))
//! }
//!
//! let error = outer().unwrap_err();
//! assert_eq!(error.stack()[0].function, "seq");
//! ```
//!
//! Nothing is silently recovered: the engine is fail-fast, and recovery (for
//! example, keeping the last good model) belongs to the caller.

use std::error::Error;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Crate-wide result alias for lens operations.
pub type Result<T> = std::result::Result<T, LensError>;

/// One step in a lens error's combinator backtrace.
#[derive(Clone, Debug)]
pub struct Frame {
    /// The combinator that caught and rethrew, e.g. `"seq"`.
    pub function: String,
    /// A rendering of the combinator's key sub-lenses or arguments.
    pub args: String,
    /// The direction attempted: `"get"` or `"putback"`.
    pub context: String,
}

impl Frame {
    /// Builds a frame.
    pub fn new(
        function: impl Into<String>,
        args: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            function: function.into(),
            args: args.into(),
            context: context.into(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "in {}({}) [{}]",
            self.function, self.args, self.context
        )
    }
}

/// The single failure type surfaced by every lens operation.
///
/// Carries the offending lens name, a message, a growing frame stack
/// (oldest/innermost frame first), and optionally the foreign error that
/// started it all.
#[derive(Clone, Debug)]
pub struct LensError {
    name: String,
    message: String,
    stack: SmallVec<[Frame; 4]>,
    cause: Option<Rc<dyn Error>>,
}

impl LensError {
    /// Builds an error originating at the named lens.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: SmallVec::new(),
            cause: None,
        }
    }

    /// Wraps a foreign error raised inside a sub-lens, preserving it as the
    /// cause.
    ///
    /// Any non-engine failure crossing a lens boundary must come through
    /// here so that frames can be appended to it like any other failure.
    pub fn wrap(name: impl Into<String>, cause: Rc<dyn Error>) -> Self {
        Self {
            name: name.into(),
            message: cause.to_string(),
            stack: SmallVec::new(),
            cause: Some(cause),
        }
    }

    /// Appends a frame and returns the same error.
    ///
    /// This is the capture-and-rethrow hook: composite lenses call it inside
    /// `map_err` at every sub-lens boundary.
    #[must_use]
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.stack.push(frame);
        self
    }

    /// The name of the lens (or other source) where the error originated.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The originating message, without the frame stack.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The frame stack, innermost frame first.
    pub fn stack(&self) -> &[Frame] {
        &self.stack
    }
}

impl fmt::Display for LensError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "lens error in {}: {}", self.name, self.message)?;
        for frame in &self.stack {
            write!(formatter, "\n  {frame}")?;
        }
        Ok(())
    }
}

impl Error for LensError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref()
    }
}
