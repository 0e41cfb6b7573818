use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by selector resolution and cut submission.
///
/// The precondition variants (`InvalidFacetName`, `InvalidAction`) are raised
/// before any artifact I/O or chain interaction.
#[derive(Debug, Error)]
pub enum CutError {
    #[error("invalid facet: {name}. Choices: {choices}.")]
    InvalidFacetName { name: String, choices: String },

    #[error("invalid cut action: {action}. Choices: add,replace,remove.")]
    InvalidAction { action: String },

    #[error("missing abi artifact for {contract}: {}", .path.display())]
    MissingArtifact { contract: String, path: PathBuf },

    #[error("malformed abi artifact for {contract}: {reason}")]
    MalformedArtifact { contract: String, reason: String },

    #[error("invalid {field} address: {reason}")]
    InvalidAddress { field: String, reason: String },

    #[error("invalid selector {value}: {reason}")]
    InvalidSelector { value: String, reason: String },

    #[error("feature {feature} is not registered in the catalog")]
    UnknownFeature { feature: String },

    #[error("invalid initializer args for {facet}: {reason}")]
    InvalidInitializerArgs { facet: String, reason: String },

    #[error("no selectors resolved for facet {facet}")]
    EmptySelectors { facet: String },

    /// The cut entrypoint port rejected the submission; the underlying
    /// message passes through unmodified.
    #[error("{0}")]
    Submission(String),
}

/// Identity of a failed orchestration stage. `Display` renders the exact
/// string recorded on the deployment result's `error` field.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StageError {
    #[error("Failed to deploy {0}")]
    Deployment(String),

    #[error("Failed to attach {0}")]
    Attachment(String),

    #[error("Failed to verify Diamond Facets")]
    Verification,
}
