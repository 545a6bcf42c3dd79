//! Operation names understood by the endpoint, split by call class.

use serde::Deserialize;

/// Read-only operations; their results are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAction {
  ListProjects,
  GetProject,
  ListCatalogs,
}

impl QueryAction {
  pub fn as_str(&self) -> &'static str {
    match self {
      QueryAction::ListProjects => "listProjects",
      QueryAction::GetProject => "getProject",
      QueryAction::ListCatalogs => "listCatalogs",
    }
  }
}

/// Authenticated writes; a success invalidates cached queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutateAction {
  CreateProject,
  UpdateProject,
  DeleteProject,
  UploadProjectImages,
  UploadCatalog,
  DeleteCatalog,
}

impl MutateAction {
  pub fn as_str(&self) -> &'static str {
    match self {
      MutateAction::CreateProject => "createProject",
      MutateAction::UpdateProject => "updateProject",
      MutateAction::DeleteProject => "deleteProject",
      MutateAction::UploadProjectImages => "uploadProjectImages",
      MutateAction::UploadCatalog => "uploadCatalog",
      MutateAction::DeleteCatalog => "deleteCatalog",
    }
  }

  /// Query families whose results this mutation can change.
  pub fn affects(&self) -> &'static [QueryAction] {
    match self {
      MutateAction::CreateProject
      | MutateAction::UpdateProject
      | MutateAction::DeleteProject
      | MutateAction::UploadProjectImages => {
        &[QueryAction::ListProjects, QueryAction::GetProject]
      }
      MutateAction::UploadCatalog | MutateAction::DeleteCatalog => &[QueryAction::ListCatalogs],
    }
  }
}

/// How much of the cache a successful mutation discards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Invalidation {
  /// Every cached entry, whatever the mutation touched
  #[default]
  All,
  /// Only the query families listed by [`MutateAction::affects`]
  Scoped,
}
