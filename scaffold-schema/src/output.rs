//! Output path resolution and the artifact writer

use crate::model::EntityModel;
use crate::{Result, ScaffoldError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

pub const ROOT_TOKEN: &str = "[rootprj]";
pub const TABLE_TOKEN: &str = "[table]";
pub const ENTITY_TOKEN: &str = "[entity]";

/// Token in a template name replaced by the entity name in the artifact file name
pub const TEMPLATE_ENTITY_TOKEN: &str = "entity";

pub const DEFAULT_PATH_TEMPLATE: &str = "[rootprj]/[table]";

/// Artifact file type; decides the extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FileType {
    Yaml,
    Json,
    Custom(String),
}

impl FileType {
    pub fn extension(&self) -> &str {
        match self {
            FileType::Yaml => "yaml",
            FileType::Json => "json",
            FileType::Custom(ext) => ext,
        }
    }
}

impl From<&str> for FileType {
    fn from(value: &str) -> Self {
        let ext = value.trim().trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "" | "yaml" | "yml" => FileType::Yaml,
            "json" => FileType::Json,
            _ => FileType::Custom(ext),
        }
    }
}

impl From<String> for FileType {
    fn from(value: String) -> Self {
        FileType::from(value.as_str())
    }
}

impl From<FileType> for String {
    fn from(value: FileType) -> Self {
        value.extension().to_string()
    }
}

impl FromStr for FileType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(FileType::from(s))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl Default for FileType {
    fn default() -> Self {
        FileType::Yaml
    }
}

/// Maps (entity, template) pairs to artifact paths under one root
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    path_template: String,
    file_type: FileType,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, file_type: FileType) -> Self {
        Self {
            root: root.into(),
            path_template: DEFAULT_PATH_TEMPLATE.to_string(),
            file_type,
        }
    }

    /// Directory template using `[rootprj]`, `[table]` and `[entity]`
    pub fn with_path_template(mut self, template: impl Into<String>) -> Self {
        self.path_template = template.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_type(&self) -> &FileType {
        &self.file_type
    }

    /// `entity_new` + `user` -> `user_new.yaml`
    pub fn file_name(&self, template_name: &str, entity_name: &str) -> String {
        let base = template_name.replacen(TEMPLATE_ENTITY_TOKEN, entity_name, 1);
        format!("{}.{}", base, self.file_type.extension())
    }

    /// Resolve the artifact path, rejecting anything outside the root
    pub fn resolve(&self, model: &EntityModel, template_name: &str) -> Result<PathBuf> {
        let root = self.root.to_string_lossy();
        let root = if root.is_empty() { "." } else { root.as_ref() };
        let dir = self
            .path_template
            .replace(ROOT_TOKEN, root)
            .replace(TABLE_TOKEN, &model.table_name_lower)
            .replace(ENTITY_TOKEN, &model.entity_name);

        let mut path = PathBuf::from(dir);
        if !self.path_template.contains(ROOT_TOKEN) && path.is_relative() {
            path = self.root.join(path);
        }
        path.push(self.file_name(template_name, &model.entity_name));

        self.contain(&path)
    }

    /// Lexically normalize `path` and make sure it stays under the root
    ///
    /// Relative paths are compared from the current directory, so a root of
    /// `.` still rejects anything reaching above it.
    pub fn contain(&self, path: &Path) -> Result<PathBuf> {
        let cwd = env::current_dir()?;
        let root = normalize(&cwd.join(&self.root));
        let anchored = normalize(&cwd.join(path));

        if anchored == root || !anchored.starts_with(&root) {
            return Err(ScaffoldError::PathTraversal {
                path: path.to_path_buf(),
                root: self.root.clone(),
            });
        }
        Ok(normalize(path))
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Outcome of one successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    pub path: PathBuf,
    /// Where the previous file went, if there was one
    pub backup: Option<PathBuf>,
    pub bytes: usize,
}

/// Persists artifacts, moving any existing file to `<path>.<timestamp>.bak`
#[derive(Debug, Default, Clone)]
pub struct ArtifactWriter;

impl ArtifactWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write(&self, path: &Path, content: &str) -> Result<WriteResult> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let backup = if path.exists() {
            Some(self.backup(path)?)
        } else {
            None
        };

        fs::write(path, content)?;
        log::debug!("Wrote {} ({} bytes)", path.display(), content.len());

        Ok(WriteResult {
            path: path.to_path_buf(),
            backup,
            bytes: content.len(),
        })
    }

    fn backup(&self, path: &Path) -> Result<PathBuf> {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();

        let mut candidate = backup_path(path, &timestamp);
        let mut attempt = 1;
        while candidate.exists() {
            candidate = backup_path(path, &format!("{}-{}", timestamp, attempt));
            attempt += 1;
        }

        fs::rename(path, &candidate)?;
        log::info!("Backed up {} to {}", path.display(), candidate.display());
        Ok(candidate)
    }
}

fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}.bak", stamp));
    PathBuf::from(name)
}
