//! Template lookup with a built-in, embedded default catalogue
//!
//! Templates live as `<name>.hbs` files in a project directory. A name that is
//! missing there but present in the embedded catalogue is copied out on first
//! use, so a fresh project renders without any setup.

use crate::{Result, ScaffoldError};
use once_cell::sync::Lazy;
use rust_embed::RustEmbed;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const TEMPLATE_EXTENSION: &str = "hbs";

#[derive(RustEmbed)]
#[folder = "templates/"]
struct DefaultTemplates;

static BUILTIN_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut names: Vec<String> = DefaultTemplates::iter()
        .filter_map(|file| {
            file.strip_suffix(&format!(".{}", TEMPLATE_EXTENSION))
                .map(str::to_string)
        })
        .collect();
    names.sort();
    names
});

/// Where a template name can currently be resolved from
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TemplateEntry {
    pub name: String,
    pub on_disk: bool,
    pub builtin: bool,
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the embedded defaults, sorted
    pub fn builtin_names() -> &'static [String] {
        &BUILTIN_NAMES
    }

    pub fn builtin_source(name: &str) -> Option<String> {
        DefaultTemplates::get(&file_name(name))
            .map(|file| String::from_utf8_lossy(&file.data).into_owned())
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(file_name(name))
    }

    /// Source for `name`, copying the built-in default out first if the
    /// project does not have one yet
    pub fn load(&self, name: &str) -> Result<String> {
        let path = self.path_for(name);
        if !path.exists() {
            if Self::builtin_source(name).is_none() {
                return Err(ScaffoldError::TemplateNotFound(path.display().to_string()));
            }
            self.materialize(name, false)?;
        }

        Ok(fs::read_to_string(&path)?)
    }

    /// Write the built-in default for `name` into the template directory
    ///
    /// Returns `false` when a file was already there and `overwrite` is off.
    /// Concurrent callers racing on the same name are safe: only one creates
    /// the file, the others see it as already present.
    pub fn materialize(&self, name: &str, overwrite: bool) -> Result<bool> {
        let source = Self::builtin_source(name)
            .ok_or_else(|| ScaffoldError::TemplateNotFound(name.to_string()))?;

        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);

        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        match options.open(&path) {
            Ok(mut file) => {
                file.write_all(source.as_bytes())?;
                log::info!("Wrote default template {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy every built-in template out; returns the paths written
    pub fn init(&self, overwrite: bool) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for name in Self::builtin_names() {
            if self.materialize(name, overwrite)? {
                written.push(self.path_for(name));
            }
        }
        Ok(written)
    }

    /// Built-in names plus any extra `.hbs` files found on disk
    pub fn list(&self) -> Result<Vec<TemplateEntry>> {
        let mut names: Vec<String> = Self::builtin_names().to_vec();

        if self.dir.is_dir() {
            for entry in fs::read_dir(&self.dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !names.iter().any(|n| n == stem) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| TemplateEntry {
                on_disk: self.path_for(&name).is_file(),
                builtin: Self::builtin_source(&name).is_some(),
                name,
            })
            .collect())
    }
}

fn file_name(name: &str) -> String {
    format!("{}.{}", name, TEMPLATE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalogue_has_all_operations() {
        assert_eq!(
            TemplateStore::builtin_names(),
            ["entity_delete", "entity_get", "entity_list", "entity_new", "entity_update"]
        );
    }

    #[test]
    fn unknown_builtin_is_none() {
        assert!(TemplateStore::builtin_source("entity_archive").is_none());
        assert!(TemplateStore::builtin_source("entity_get").is_some());
    }
}
