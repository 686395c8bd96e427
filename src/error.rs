use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BorgError {
    #[error("Attribute '{name}' is not set in the shared state")]
    AttributeNotFound { name: String },
}

impl BorgError {
    pub fn attribute_not_found(name: impl Into<String>) -> Self {
        Self::AttributeNotFound { name: name.into() }
    }
}
