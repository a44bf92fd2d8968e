use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use nova_core::{Fingerprint, FingerprintBuilder, ProjectId};
use serde::{Deserialize, Serialize};

use crate::{Declaration, Document, MetadataReference, ProjectError};

/// Everything needed to create a [`Project`].
///
/// Constructed through [`ProjectInfo::new`] and the `with_*` builders, which
/// validate as they go; deserialized values are validated when they enter a
/// [`crate::Solution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: ProjectId,
    pub name: String,
    pub assembly_name: String,
    pub language: String,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub project_references: Vec<ProjectId>,
    #[serde(default)]
    pub metadata_references: Vec<MetadataReference>,
}

impl ProjectInfo {
    pub fn new(
        id: ProjectId,
        name: impl Into<String>,
        assembly_name: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, ProjectError> {
        let info = Self {
            id,
            name: name.into(),
            assembly_name: assembly_name.into(),
            language: language.into(),
            documents: Vec::new(),
            project_references: Vec::new(),
            metadata_references: Vec::new(),
        };
        info.validate()?;
        Ok(info)
    }

    pub fn with_documents(
        mut self,
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<Self, ProjectError> {
        self.documents = documents.into_iter().collect();
        check_documents(self.id, &self.documents)?;
        Ok(self)
    }

    pub fn with_project_references(
        mut self,
        references: impl IntoIterator<Item = ProjectId>,
    ) -> Result<Self, ProjectError> {
        self.project_references = references.into_iter().collect();
        check_project_references(self.id, &self.project_references)?;
        Ok(self)
    }

    pub fn with_metadata_references(
        mut self,
        references: impl IntoIterator<Item = MetadataReference>,
    ) -> Result<Self, ProjectError> {
        self.metadata_references = references.into_iter().collect();
        check_metadata_references(self.id, &self.metadata_references)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ProjectError> {
        for (field, value) in [
            ("name", &self.name),
            ("assembly name", &self.assembly_name),
            ("language", &self.language),
        ] {
            if value.trim().is_empty() {
                return Err(ProjectError::EmptyField {
                    project: self.id,
                    field,
                });
            }
        }
        check_documents(self.id, &self.documents)?;
        check_project_references(self.id, &self.project_references)?;
        check_metadata_references(self.id, &self.metadata_references)
    }
}

fn check_documents(project: ProjectId, documents: &[Document]) -> Result<(), ProjectError> {
    let mut seen = HashSet::with_capacity(documents.len());
    for doc in documents {
        if !seen.insert(doc.id) {
            return Err(ProjectError::DuplicateDocument {
                project,
                document: doc.id,
            });
        }
    }
    Ok(())
}

fn check_project_references(
    project: ProjectId,
    references: &[ProjectId],
) -> Result<(), ProjectError> {
    let mut seen = HashSet::with_capacity(references.len());
    for &reference in references {
        if reference == project {
            return Err(ProjectError::SelfReference { project });
        }
        if !seen.insert(reference) {
            return Err(ProjectError::DuplicateProjectReference { project, reference });
        }
    }
    Ok(())
}

fn check_metadata_references(
    project: ProjectId,
    references: &[MetadataReference],
) -> Result<(), ProjectError> {
    let mut seen = HashSet::with_capacity(references.len());
    for reference in references {
        if !seen.insert(reference.name.as_str()) {
            return Err(ProjectError::DuplicateMetadataReference {
                project,
                name: reference.name.clone(),
            });
        }
    }
    Ok(())
}

/// Immutable project snapshot. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Project {
    inner: Arc<ProjectInner>,
}

#[derive(Debug)]
struct ProjectInner {
    info: ProjectInfo,
    fingerprint: OnceLock<Fingerprint>,
}

impl Project {
    pub(crate) fn new(info: ProjectInfo) -> Self {
        Self {
            inner: Arc::new(ProjectInner {
                info,
                fingerprint: OnceLock::new(),
            }),
        }
    }

    pub fn id(&self) -> ProjectId {
        self.inner.info.id
    }

    pub fn name(&self) -> &str {
        &self.inner.info.name
    }

    pub fn assembly_name(&self) -> &str {
        &self.inner.info.assembly_name
    }

    pub fn language(&self) -> &str {
        &self.inner.info.language
    }

    pub fn documents(&self) -> &[Document] {
        &self.inner.info.documents
    }

    pub fn project_references(&self) -> &[ProjectId] {
        &self.inner.info.project_references
    }

    pub fn metadata_references(&self) -> &[MetadataReference] {
        &self.inner.info.metadata_references
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.inner.info
    }

    /// Checksum of the project's declaration-relevant content.
    ///
    /// Covers every declaration in document order (name, kind, accessibility,
    /// arity, parameters, range) and the declarations of metadata references.
    /// Document names, project references and anything else that cannot
    /// change a search result are left out. Computed once per snapshot.
    pub fn content_fingerprint(&self) -> Fingerprint {
        *self
            .inner
            .fingerprint
            .get_or_init(|| compute_content_fingerprint(&self.inner.info))
    }

    /// Whether two handles point at the same snapshot.
    pub fn ptr_eq(&self, other: &Project) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn compute_content_fingerprint(info: &ProjectInfo) -> Fingerprint {
    let mut builder = FingerprintBuilder::new();
    builder.u64(info.documents.len() as u64);
    for doc in &info.documents {
        builder.u32(doc.id.to_raw());
        hash_declarations(&mut builder, &doc.declarations);
    }
    builder.u64(info.metadata_references.len() as u64);
    for reference in &info.metadata_references {
        builder.str(&reference.name);
        hash_declarations(&mut builder, &reference.declarations);
    }
    builder.finish()
}

fn hash_declarations(builder: &mut FingerprintBuilder, declarations: &[Declaration]) {
    builder.u64(declarations.len() as u64);
    for decl in declarations {
        builder
            .str(&decl.name)
            .u8(decl.kind.tag())
            .u8(decl.accessibility.tag())
            .u32(decl.arity)
            .u64(decl.parameters.len() as u64);
        for param in &decl.parameters {
            builder.str(param);
        }
        builder
            .u32(decl.range.start().into())
            .u32(decl.range.end().into());
        hash_declarations(builder, &decl.children);
    }
}
