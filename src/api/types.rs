//! Records exchanged with the portfolio endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market segment of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
  Residential,
  Commercial,
  Industrial,
  ITCooling,
  Government,
}

impl Category {
  pub const ALL: [Category; 5] = [
    Category::Residential,
    Category::Commercial,
    Category::Industrial,
    Category::ITCooling,
    Category::Government,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Category::Residential => "Residential",
      Category::Commercial => "Commercial",
      Category::Industrial => "Industrial",
      Category::ITCooling => "ITCooling",
      Category::Government => "Government",
    }
  }
}

/// Installed HVAC system family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemType {
  Chiller,
  #[serde(rename = "VRF")]
  Vrf,
  DuctSplit,
  LightSystems,
}

impl SystemType {
  pub const ALL: [SystemType; 4] = [
    SystemType::Chiller,
    SystemType::Vrf,
    SystemType::DuctSplit,
    SystemType::LightSystems,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      SystemType::Chiller => "Chiller",
      SystemType::Vrf => "VRF",
      SystemType::DuctSplit => "DuctSplit",
      SystemType::LightSystems => "LightSystems",
    }
  }
}

macro_rules! str_enum_impls {
  ($ty:ty, $what:literal) => {
    impl fmt::Display for $ty {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
      }
    }

    impl FromStr for $ty {
      type Err = String;

      /// Case-insensitive match on the wire name.
      fn from_str(s: &str) -> Result<Self, Self::Err> {
        <$ty>::ALL
          .into_iter()
          .find(|v| v.as_str().eq_ignore_ascii_case(s))
          .ok_or_else(|| {
            let known: Vec<&str> = <$ty>::ALL.iter().map(|v| v.as_str()).collect();
            format!("unknown {} '{}' (expected one of {})", $what, s, known.join(", "))
          })
      }
    }
  };
}

str_enum_impls!(Category, "category");
str_enum_impls!(SystemType, "system type");

/// Full project record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  /// Empty for a project that has not been created yet
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  pub title: String,
  pub category: Category,
  pub system_type: SystemType,
  #[serde(default)]
  pub brand: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub employer_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub address_full: Option<String>,
  #[serde(default)]
  pub city: String,
  #[serde(default)]
  pub province: String,
  #[serde(default)]
  pub year_completed: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub capacity_summary: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub system_model: Option<String>,
  #[serde(default)]
  pub advantages: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover_image_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cover_image_file_id: Option<String>,
  #[serde(default)]
  pub gallery_image_urls: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub gallery_image_file_ids: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub catalog_download_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub catalog_file_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub view_count: Option<u64>,
  /// Display ordering weight, higher first
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub priority: Option<i64>,
}

/// Downloadable PDF catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
  pub id: String,
  pub name: String,
  pub file_id: String,
  pub download_url: String,
  pub created_at: String,
}

/// Filters accepted by the project listing.
///
/// Unset filters are omitted from the request and from the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFilters {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<Category>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub system_type: Option<SystemType>,
  /// Free-text search
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub q: Option<String>,
}

/// One file in an upload request, base64-encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
  pub name: String,
  #[serde(rename = "type")]
  pub mime_type: String,
  pub base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedProject {
  pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
  #[serde(rename = "fileId")]
  pub file_id: String,
  pub url: String,
}

/// Result of attaching images to a project.
///
/// The id and url lists come back as the comma-joined strings the backend stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
  pub uploaded: Vec<UploadedFile>,
  #[serde(default)]
  pub gallery_image_file_ids: String,
  #[serde(default)]
  pub gallery_image_urls: String,
}
