//! Error types for the resource layer and its HTTP client.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by resource declaration, instance access and search.
///
/// Missing attributes are never errors; lookups return `None` instead.
#[derive(Error, Debug)]
pub enum Error {
    /// A resource was compared against something that is not a resource.
    #[error("cannot compare a resource with a non-resource value of type {0}")]
    NotAResource(&'static str),

    /// Two raw attributes of one type derive the same accessor name.
    #[error("accessor `{accessor}` on {resource_type} is derived from both `{first}` and `{second}`")]
    AccessorCollision {
        resource_type: String,
        accessor: String,
        first: String,
        second: String,
    },

    /// A resource type with this name is already in the registry.
    #[error("resource type already declared: {0}")]
    AlreadyDeclared(String),

    /// A set-once setting (endpoint or parser) was configured twice.
    #[error("{setting} is already configured for {resource_type}")]
    AlreadyConfigured {
        resource_type: String,
        setting: &'static str,
    },

    /// The resource type exposes no accessor with this name.
    #[error("{resource_type} has no accessor `{accessor}`")]
    UnknownAccessor {
        resource_type: String,
        accessor: String,
    },

    /// No resource type with this name has been declared.
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// A search was issued for a type that has no endpoint.
    #[error("no endpoint configured for {0}")]
    MissingEndpoint(String),

    /// The client configuration has no application id.
    #[error("application id is required")]
    MissingApplicationId,

    /// An embedded resource declaration file could not be read.
    #[error("invalid resource catalog: {0}")]
    Catalog(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("API request failed: {status} {error}")]
    Api {
        status: u16,
        error: String,
        description: Option<String>,
    },

    /// The request could not be sent or its body could not be decoded.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl Error {
    /// HTTP status of an API failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
