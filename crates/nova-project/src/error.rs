use std::path::PathBuf;

use nova_core::{DocumentId, ProjectId};

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("project {project} has an empty {field}")]
    EmptyField {
        project: ProjectId,
        field: &'static str,
    },

    #[error("project {project} contains {document} more than once")]
    DuplicateDocument {
        project: ProjectId,
        document: DocumentId,
    },

    #[error("project {project} references itself")]
    SelfReference { project: ProjectId },

    #[error("project {project} references {reference} more than once")]
    DuplicateProjectReference {
        project: ProjectId,
        reference: ProjectId,
    },

    #[error("project {project} references metadata `{name}` more than once")]
    DuplicateMetadataReference { project: ProjectId, name: String },

    #[error("solution contains {project} more than once")]
    DuplicateProject { project: ProjectId },

    #[error("project {project} references {reference}, which is not part of the solution")]
    UnknownProjectReference {
        project: ProjectId,
        reference: ProjectId,
    },

    #[error("{0} is not part of the solution")]
    UnknownProject(ProjectId),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse solution file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
