use openroute_core::RegistrationError;

/// The assembled document is inconsistent. Any of these stops startup when
/// the document is validated while the app is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// A `$ref` points at a schema that is not in the components registry.
    UnresolvedReference { reference: String, location: String },
    /// A route requires a security scheme that is not configured.
    UnknownSecurityScheme { scheme: String, operation_id: String },
    /// Two documented routes share an operation id.
    DuplicateOperationId(String),
    /// A schema could not be given a unique component name.
    SchemaConflict { name: String },
    /// The document could not be serialized.
    Serialize(String),
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::UnresolvedReference { reference, location } => {
                write!(f, "unresolved schema reference '{reference}' at {location}")
            }
            DocumentError::UnknownSecurityScheme {
                scheme,
                operation_id,
            } => write!(
                f,
                "operation '{operation_id}' requires unknown security scheme '{scheme}'"
            ),
            DocumentError::DuplicateOperationId(id) => {
                write!(f, "operation id '{id}' is used by more than one route")
            }
            DocumentError::SchemaConflict { name } => {
                write!(f, "schema '{name}' is registered twice with different content")
            }
            DocumentError::Serialize(msg) => write!(f, "document serialization failed: {msg}"),
        }
    }
}

impl std::error::Error for DocumentError {}

impl From<DocumentError> for RegistrationError {
    fn from(err: DocumentError) -> Self {
        RegistrationError::Document(err.to_string())
    }
}
