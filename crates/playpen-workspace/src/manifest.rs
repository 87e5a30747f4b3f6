use std::collections::HashSet;

use playpen_source::FRAMEWORK_RUNTIME_SCRIPTS;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::files::FileSet;
use crate::store::{GistStore, StorageError};

/// The playground manifest: external script and style dependencies, in load
/// order, serialized as JSON under the well-known manifest file name.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Manifest {
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Append any missing framework runtime packages, then deduplicate
    /// `scripts` preserving first-seen order. Returns whether anything was
    /// appended.
    pub fn ensure_framework_runtime(&mut self) -> bool {
        let mut changed = false;
        for required in FRAMEWORK_RUNTIME_SCRIPTS {
            if !self.scripts.iter().any(|entry| entry.as_str() == *required) {
                self.scripts.push((*required).to_string());
                changed = true;
            }
        }
        if changed {
            let mut seen = HashSet::new();
            self.scripts.retain(|entry| seen.insert(entry.clone()));
        }
        changed
    }
}

/// Outcome of manifest resolution. The content is authoritative for
/// rendering even when the write-back failed; the error is surfaced once by
/// the caller and not retried.
#[derive(Debug)]
pub struct ManifestResolution {
    pub content: String,
    pub write_error: Option<StorageError>,
}

impl ManifestResolution {
    fn clean(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            write_error: None,
        }
    }
}

/// Resolve the manifest text for the given file set.
///
/// Without a manifest file this yields an empty string and no manifest
/// semantics apply downstream. When a framework-authoring file is present
/// and the manifest misses any required runtime package, the manifest is
/// corrected in memory, written back through the storage collaborator, and
/// the corrected text returned. Reading may therefore write.
pub async fn resolve_manifest_content(
    files: &mut FileSet,
    store: &dyn GistStore,
    gist_id: &str,
) -> ManifestResolution {
    let Some(name) = files.manifest_name().map(ToString::to_string) else {
        return ManifestResolution::clean(String::new());
    };
    let text = files.content(&name).unwrap_or_default().to_string();

    if !files.has_framework_authoring_file() {
        return ManifestResolution::clean(text);
    }

    let mut manifest = match Manifest::parse(&text) {
        Ok(manifest) => manifest,
        Err(error) => {
            warn!(%error, file = %name, "manifest is not valid JSON; leaving it alone");
            return ManifestResolution::clean(text);
        }
    };

    if !manifest.ensure_framework_runtime() {
        return ManifestResolution::clean(text);
    }

    let updated = manifest.to_pretty_json();
    files.set_content(&name, &updated);

    let write_error = store.write_file(gist_id, &name, &updated).await.err();
    if let Some(error) = &write_error {
        warn!(%error, file = %name, "failed to push manifest correction to storage");
    }

    ManifestResolution {
        content: updated,
        write_error,
    }
}
