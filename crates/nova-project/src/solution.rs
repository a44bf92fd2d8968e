use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use nova_core::{Fingerprint, FingerprintBuilder, ProjectId};

use crate::{Document, Project, ProjectError, ProjectInfo};

/// Read-only view of a project graph, as consumed by declaration search.
pub trait ProjectGraph: Send + Sync {
    /// Project ids in the graph's stable order.
    fn project_ids(&self) -> Vec<ProjectId>;

    fn project(&self, id: ProjectId) -> Option<Project>;

    /// Identifies this snapshot across a process boundary.
    fn checksum(&self) -> Fingerprint;
}

/// An immutable, ordered set of projects.
///
/// Every mutation returns a new snapshot; unchanged projects are shared
/// between snapshots, so their content fingerprints are not recomputed.
#[derive(Debug, Clone)]
pub struct Solution {
    inner: Arc<SolutionInner>,
}

#[derive(Debug)]
struct SolutionInner {
    projects: Vec<Project>,
    by_id: HashMap<ProjectId, usize>,
    checksum: OnceLock<Fingerprint>,
}

impl Default for Solution {
    fn default() -> Self {
        Self::from_projects(Vec::new())
    }
}

impl Solution {
    pub fn new(infos: impl IntoIterator<Item = ProjectInfo>) -> Result<Self, ProjectError> {
        let mut projects = Vec::new();
        for info in infos {
            info.validate()?;
            projects.push(Project::new(info));
        }
        let solution = Self::from_projects(projects);
        solution.check_graph()?;
        Ok(solution)
    }

    fn from_projects(projects: Vec<Project>) -> Self {
        let by_id = projects
            .iter()
            .enumerate()
            .map(|(idx, project)| (project.id(), idx))
            .collect();
        Self {
            inner: Arc::new(SolutionInner {
                projects,
                by_id,
                checksum: OnceLock::new(),
            }),
        }
    }

    fn check_graph(&self) -> Result<(), ProjectError> {
        if self.inner.by_id.len() != self.inner.projects.len() {
            let mut seen = std::collections::HashSet::new();
            for project in &self.inner.projects {
                if !seen.insert(project.id()) {
                    return Err(ProjectError::DuplicateProject {
                        project: project.id(),
                    });
                }
            }
        }
        for project in &self.inner.projects {
            for &reference in project.project_references() {
                if !self.inner.by_id.contains_key(&reference) {
                    return Err(ProjectError::UnknownProjectReference {
                        project: project.id(),
                        reference,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn projects(&self) -> &[Project] {
        &self.inner.projects
    }

    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.inner
            .by_id
            .get(&id)
            .map(|&idx| &self.inner.projects[idx])
    }

    pub fn len(&self) -> usize {
        self.inner.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.projects.is_empty()
    }

    /// Adds `info` at the end, or replaces the project with the same id in place.
    pub fn with_project(&self, info: ProjectInfo) -> Result<Self, ProjectError> {
        info.validate()?;
        let mut projects = self.inner.projects.clone();
        match self.inner.by_id.get(&info.id) {
            Some(&idx) => projects[idx] = Project::new(info),
            None => projects.push(Project::new(info)),
        }
        let solution = Self::from_projects(projects);
        solution.check_graph()?;
        Ok(solution)
    }

    pub fn without_project(&self, id: ProjectId) -> Result<Self, ProjectError> {
        if !self.inner.by_id.contains_key(&id) {
            return Err(ProjectError::UnknownProject(id));
        }
        let projects = self
            .inner
            .projects
            .iter()
            .filter(|p| p.id() != id)
            .cloned()
            .collect();
        let solution = Self::from_projects(projects);
        solution.check_graph()?;
        Ok(solution)
    }

    /// Adds `document` to `project`, or replaces the document with the same id.
    pub fn with_document(&self, project: ProjectId, document: Document) -> Result<Self, ProjectError> {
        let current = self
            .get(project)
            .ok_or(ProjectError::UnknownProject(project))?;
        let mut info = current.info().clone();
        match info.documents.iter_mut().find(|d| d.id == document.id) {
            Some(slot) => *slot = document,
            None => info.documents.push(document),
        }
        self.with_project(info)
    }
}

impl ProjectGraph for Solution {
    fn project_ids(&self) -> Vec<ProjectId> {
        self.inner.projects.iter().map(Project::id).collect()
    }

    fn project(&self, id: ProjectId) -> Option<Project> {
        self.get(id).cloned()
    }

    fn checksum(&self) -> Fingerprint {
        *self.inner.checksum.get_or_init(|| {
            let mut builder = FingerprintBuilder::new();
            builder.u64(self.inner.projects.len() as u64);
            for project in &self.inner.projects {
                builder
                    .u32(project.id().to_raw())
                    .str(project.name())
                    .fingerprint(&project.content_fingerprint());
            }
            builder.finish()
        })
    }
}
