use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("malformed program document: {message}")]
    Document { message: String },
    #[error("cannot parse type `{text}` at offset {offset}: {message}")]
    TypeSyntax {
        text: String,
        offset: usize,
        message: String,
    },
    #[error("unknown type name `{name}`")]
    UnknownType { name: String },
    #[error("type `{name}` declared twice")]
    DuplicateType { name: String },
    #[error("function `{name}` declared twice")]
    DuplicateFunction { name: String },
    #[error("in {function}: {message}")]
    Link { function: String, message: String },
}

impl LoadError {
    pub fn link(function: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::Link {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn document(message: impl Into<String>) -> Self {
        LoadError::Document {
            message: message.into(),
        }
    }
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;
