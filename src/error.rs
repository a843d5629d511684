use std::fmt;

/// Why an enum could not be synthesized from its declared cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumShape {
    /// The enum declares no cases at all.
    NoCases,
    /// At least one case carries associated data.
    DataCarrying { case: &'static str },
}

impl fmt::Display for EnumShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumShape::NoCases => write!(f, "it declares no cases"),
            EnumShape::DataCarrying { case } => {
                write!(f, "case `{}` carries associated data", case)
            }
        }
    }
}

/// Everything that can stop a stub from being built.
///
/// Failures are never retried and never yield a partial instance.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StubError {
    /// The type requires an instance of itself at the same structural
    /// position, with no provider able to break the chain.
    #[error("cannot stub `{type_name}`: it requires itself to be constructed")]
    Cycle { type_name: &'static str },

    #[error("cannot stub enum `{type_name}`: {shape}")]
    UnsupportedEnumShape {
        type_name: &'static str,
        shape: EnumShape,
    },

    /// An override targets something with no stored slot in the instance.
    #[error("cannot override `{locator}`: no directly addressable storage for this field")]
    UnsupportedField { locator: String },

    #[error("invalid stub configuration: {0}")]
    InvalidConfig(&'static str),

    /// Raised by the stubbed type's own decode routine, or while replaying a
    /// provided value into it.
    #[error("{0}")]
    Custom(String),
}

impl serde::de::Error for StubError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        StubError::Custom(msg.to_string())
    }
}

impl From<serde_json::Error> for StubError {
    fn from(err: serde_json::Error) -> Self {
        StubError::Custom(err.to_string())
    }
}
