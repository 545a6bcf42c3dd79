//! Command-line surface.

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::api::types::{Category, Project, ProjectFilters, SystemType};
use crate::api::PortfolioClient;
use crate::cache::KeyValueStorage;
use crate::config::Config;
use crate::upload::{encode_cover, encode_file};

#[derive(Parser, Debug)]
#[command(name = "damon")]
#[command(about = "Browse and manage the Damon HVAC project portfolio")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/damon/config.yaml)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// List projects
  Projects {
    #[arg(long)]
    category: Option<Category>,
    #[arg(long)]
    system_type: Option<SystemType>,
    /// Free-text search
    #[arg(long)]
    q: Option<String>,
    /// Bypass the cache
    #[arg(long)]
    refresh: bool,
  },
  /// Show one project
  Project {
    id: String,
    #[arg(long)]
    refresh: bool,
  },
  /// Create a project from a JSON file
  CreateProject { file: PathBuf },
  /// Replace a project's fields from a JSON file
  UpdateProject { id: String, file: PathBuf },
  DeleteProject { id: String },
  /// Attach images to a project
  UploadImages {
    id: String,
    /// Image to use as the cover
    #[arg(long)]
    cover: Option<PathBuf>,
    /// Gallery images
    files: Vec<PathBuf>,
  },
  /// List catalogs
  Catalogs {
    #[arg(long)]
    refresh: bool,
  },
  /// Upload a PDF catalog
  UploadCatalog { file: PathBuf },
  DeleteCatalog { id: String },
  /// Log in as admin (password from DAMON_PASSWORD)
  Login {
    #[arg(short, long)]
    username: Option<String>,
  },
  Logout,
  /// Drop every cached response
  ClearCache,
  /// Prefetch the project and catalog lists
  Warm,
}

/// Execute `command`, printing results as JSON on stdout.
pub async fn run<S: KeyValueStorage>(client: &PortfolioClient<S>, command: Command) -> Result<()> {
  match command {
    Command::Projects {
      category,
      system_type,
      q,
      refresh,
    } => {
      let filters = ProjectFilters {
        category,
        system_type,
        q,
      };
      print_json(&client.list_projects(&filters, refresh).await?)
    }
    Command::Project { id, refresh } => print_json(&client.get_project(&id, refresh).await?),
    Command::CreateProject { file } => {
      let project = read_project(&file)?;
      print_json(&client.create_project(&project).await?)
    }
    Command::UpdateProject { id, file } => {
      let project = read_project(&file)?;
      print_json(&client.update_project(&id, &project).await?)
    }
    Command::DeleteProject { id } => print_json(&client.delete_project(&id).await?),
    Command::UploadImages { id, cover, files } => {
      let mut payloads = Vec::with_capacity(files.len() + 1);
      if let Some(cover) = cover {
        payloads.push(encode_cover(&cover)?);
      }
      for file in &files {
        payloads.push(encode_file(file)?);
      }
      if payloads.is_empty() {
        return Err(eyre!("Nothing to upload"));
      }
      print_json(&client.upload_project_images(&id, &payloads).await?)
    }
    Command::Catalogs { refresh } => print_json(&client.list_catalogs(refresh).await?),
    Command::UploadCatalog { file } => {
      let payload = encode_file(&file)?;
      print_json(&client.upload_catalog(&payload).await?)
    }
    Command::DeleteCatalog { id } => print_json(&client.delete_catalog(&id).await?),
    Command::Login { username } => {
      let username = match username {
        Some(u) => u,
        None => Config::get_username()?,
      };
      let password = Config::get_password()?;
      let auth = client.login(&username, &password).await?;
      println!("Logged in until {}", auth.expires_at);
      Ok(())
    }
    Command::Logout => {
      client.logout()?;
      println!("Logged out");
      Ok(())
    }
    Command::ClearCache => {
      let removed = client.cache().clear_all();
      println!("Removed {} cached responses", removed);
      Ok(())
    }
    Command::Warm => {
      let filters = ProjectFilters::default();
      let (projects, catalogs) = futures::try_join!(
        client.list_projects(&filters, true),
        client.list_catalogs(true)
      )?;
      println!(
        "Cached {} projects and {} catalogs",
        projects.len(),
        catalogs.len()
      );
      Ok(())
    }
  }
}

fn read_project(path: &Path) -> Result<Project> {
  let contents = std::fs::read_to_string(path)
    .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;
  serde_json::from_str(&contents)
    .map_err(|e| eyre!("Failed to parse project {}: {}", path.display(), e))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
