//! Error types for compilation and module encoding.

use crate::ast::SourceLocation;
use thiserror::Error;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling a module
#[derive(Debug, Error)]
pub enum Error {
    /// The syntax tree uses a construct the compiler does not lower
    #[error("{construct} is not supported{}", at(.loc))]
    Unsupported {
        /// Name of the construct
        construct: String,
        /// Source position of the offending node, when the parser recorded one
        loc: Option<SourceLocation>,
    },

    /// Read of a binding that is not yet initialized
    #[error("ReferenceError: Cannot access '{0}' before initialization")]
    Undefined(String),

    /// A name declared twice in the same scope
    #[error("SyntaxError: Identifier '{0}' has already been declared")]
    Redeclaration(String),

    /// Write to a `const` binding
    #[error("TypeError: Assignment to constant variable '{0}'")]
    ConstAssignment(String),

    /// `break` outside of any loop
    #[error("SyntaxError: Illegal break statement")]
    IllegalBreak,

    /// `continue` outside of any loop
    #[error("SyntaxError: Illegal continue statement")]
    IllegalContinue,

    /// Left-hand side of an assignment or update is not assignable
    #[error("SyntaxError: Invalid left-hand side in {0}")]
    InvalidAssignmentTarget(&'static str),

    /// A compiler invariant was violated
    #[error("internal compiler error: {0}")]
    Internal(String),

    /// The syntax tree does not have the ESTree shape
    #[error("malformed syntax tree: {0}")]
    Syntax(#[from] serde_json::Error),

    /// A binary module failed validation
    #[error("invalid module: {0}")]
    InvalidModule(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input uses a construct outside the supported subset
    Unsupported,
    /// Scope or semantic error in the input program
    Semantic,
    /// Defect in the compiler itself
    Internal,
    /// Malformed input file or I/O failure
    Input,
}

impl Error {
    /// Creates an unsupported-construct error.
    pub fn unsupported(construct: impl Into<String>, loc: Option<&SourceLocation>) -> Self {
        Error::Unsupported {
            construct: construct.into(),
            loc: loc.cloned(),
        }
    }

    /// Creates an internal-invariant error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Unsupported { .. } => ErrorCategory::Unsupported,
            Error::Undefined(_)
            | Error::Redeclaration(_)
            | Error::ConstAssignment(_)
            | Error::IllegalBreak
            | Error::IllegalContinue
            | Error::InvalidAssignmentTarget(_) => ErrorCategory::Semantic,
            Error::Internal(_) => ErrorCategory::Internal,
            Error::Syntax(_) | Error::InvalidModule(_) | Error::Io(_) => ErrorCategory::Input,
        }
    }
}

fn at(loc: &Option<SourceLocation>) -> String {
    match loc {
        Some(loc) => format!(" (at {loc})"),
        None => String::new(),
    }
}
