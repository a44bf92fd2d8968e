use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ProjectError, ProjectInfo, Solution};

/// On-disk description of a solution: an ordered list of projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionFile {
    #[serde(default)]
    pub projects: Vec<ProjectInfo>,
}

impl SolutionFile {
    pub fn into_solution(self) -> Result<Solution, ProjectError> {
        Solution::new(self.projects)
    }
}

impl From<&Solution> for SolutionFile {
    fn from(solution: &Solution) -> Self {
        Self {
            projects: solution.projects().iter().map(|p| p.info().clone()).collect(),
        }
    }
}

/// Loads and validates a JSON solution file.
pub fn load_solution(path: impl AsRef<Path>) -> Result<Solution, ProjectError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: SolutionFile = serde_json::from_str(&text).map_err(|source| ProjectError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let solution = file.into_solution()?;
    tracing::debug!(
        target = "nova.project",
        path = %path.display(),
        projects = solution.len(),
        "loaded solution"
    );
    Ok(solution)
}
