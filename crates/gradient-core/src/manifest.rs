//! Service manifest loading.
//!
//! A manifest is the desired `Service` serialized as JSON, checked into
//! the application directory. The engine loads it, applies the configured
//! image override, and hands the result to the platform unchanged.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Service;

/// Template label that carries the service name when the application
/// config does not set one explicitly.
pub const APP_LABEL: &str = "app";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read service manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse service manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load a service manifest from a JSON file.
pub fn load(path: &Path) -> Result<Service, ManifestError> {
    let data = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a service manifest from an application directory and a relative path.
pub fn load_from_dir(app_dir: &Path, manifest_path: &str) -> Result<Service, ManifestError> {
    load(&app_dir.join(manifest_path))
}

/// Override the image of every container in the template.
/// An empty override leaves the manifest untouched.
pub fn apply_image_override(service: &mut Service, image: &str) {
    if image.is_empty() {
        return;
    }
    for container in &mut service.template.containers {
        container.image = image.to_string();
    }
}

/// Service name carried by the template's `app` label, if present.
pub fn service_name_from_labels(service: &Service) -> Option<&str> {
    service
        .template
        .labels
        .get(APP_LABEL)
        .map(String::as_str)
        .filter(|name| !name.is_empty())
}
