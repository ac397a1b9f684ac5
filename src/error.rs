use thiserror::Error;

/// Error surface for the three map constructors and indexed-access operators.
///
/// No operation that mutates or queries an already-constructed map can fail:
/// argument validation happens only at construction time, and indexed access
/// is the only lookup path that can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriphashError {
    #[error("key not found")]
    KeyNotFound,
    #[error("argument out of range: {what} = {value}")]
    ArgumentOutOfRange { what: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, TriphashError>;

impl TriphashError {
    pub(crate) fn capacity(value: usize) -> Self {
        TriphashError::ArgumentOutOfRange {
            what: "initial_capacity",
            value: value.to_string(),
        }
    }

    pub(crate) fn load_factor(value: f32) -> Self {
        TriphashError::ArgumentOutOfRange {
            what: "load_factor",
            value: value.to_string(),
        }
    }
}
