//! Project configuration
//!
//! Sources, lowest priority first: built-in defaults, `scaffold.toml`, the
//! `DB_*` / `PROJECT_*` environment variables, then command-line flags.

use scaffold_schema::generator::DEFAULT_TEMPLATES;
use scaffold_schema::{FileType, GenerationRequest, Result, ScaffoldError, Selection};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "scaffold.toml";

/// Supported database backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
}

impl Dialect {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "" => Err(ScaffoldError::Configuration(
                "no database dialect configured (set connection.dialect or DB_DRIVER)".to_string(),
            )),
            other => Err(ScaffoldError::Configuration(format!(
                "unsupported dialect '{}'. Supported: postgres, mysql",
                other
            ))),
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Dialect::Postgres => 5432,
            Dialect::MySql => 3306,
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
        }
    }

    /// Connection-string parameter carrying the TLS mode
    fn ssl_param(self, mode: &str) -> Option<(&'static str, &'static str)> {
        let mode = mode.trim().to_lowercase();
        match self {
            Dialect::Postgres => {
                let value = match mode.as_str() {
                    "disable" | "false" => "disable",
                    "allow" => "allow",
                    "prefer" => "prefer",
                    "require" | "true" => "require",
                    "verify-ca" => "verify-ca",
                    "verify-full" => "verify-full",
                    _ => return None,
                };
                Some(("sslmode", value))
            }
            Dialect::MySql => {
                let value = match mode.as_str() {
                    "disable" | "disabled" | "false" => "DISABLED",
                    "prefer" | "preferred" => "PREFERRED",
                    "require" | "required" | "true" => "REQUIRED",
                    "verify-ca" | "verify_ca" => "VERIFY_CA",
                    "verify-full" | "verify_identity" => "VERIFY_IDENTITY",
                    _ => return None,
                };
                Some(("ssl-mode", value))
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// `[connection]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub dialect: String,
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub database: String,
    pub schema: String,
    pub ssl_mode: String,
    pub timezone: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            dialect: String::new(),
            host: "localhost".to_string(),
            port: None,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            schema: "public".to_string(),
            ssl_mode: "disable".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Check everything needed to connect; no I/O happens here
    pub fn validate(&self) -> Result<Dialect> {
        let dialect = Dialect::parse(&self.dialect)?;

        for (field, value) in [
            ("host", &self.host),
            ("database", &self.database),
            ("username", &self.username),
        ] {
            if value.trim().is_empty() {
                return Err(ScaffoldError::Configuration(format!(
                    "connection.{} is required",
                    field
                )));
            }
        }

        if dialect.ssl_param(&self.ssl_mode).is_none() {
            return Err(ScaffoldError::Configuration(format!(
                "ssl_mode '{}' is not supported by {}",
                self.ssl_mode, dialect
            )));
        }

        Ok(dialect)
    }

    pub fn port_for(&self, dialect: Dialect) -> u16 {
        self.port.unwrap_or_else(|| dialect.default_port())
    }

    /// Connection URL with credentials percent-encoded
    pub fn url(&self) -> Result<Url> {
        let dialect = self.validate()?;
        let invalid = |what: &str| ScaffoldError::Configuration(format!("invalid {} in connection settings", what));

        let mut url = Url::parse(&format!("{}://localhost", dialect.scheme()))
            .map_err(|_| invalid("scheme"))?;
        url.set_host(Some(self.host.trim())).map_err(|_| invalid("host"))?;
        url.set_port(Some(self.port_for(dialect)))
            .map_err(|_| invalid("port"))?;
        url.set_username(&self.username)
            .map_err(|_| invalid("username"))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| invalid("password"))?;
        }
        url.set_path(self.database.trim());

        if let Some((key, value)) = dialect.ssl_param(&self.ssl_mode) {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url)
    }

    /// Schema the scanner reads; on MySQL that is the database unless set
    pub fn scan_schema(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::Postgres if self.schema.trim().is_empty() => "public".to_string(),
            Dialect::Postgres => self.schema.trim().to_string(),
            Dialect::MySql if self.schema.trim().is_empty() || self.schema == "public" => {
                self.database.trim().to_string()
            }
            Dialect::MySql => self.schema.trim().to_string(),
        }
    }
}

/// `[project]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub output_dir: PathBuf,
    pub file_type: String,
    /// Table filter: `*` or a comma-separated list
    pub tables: String,
    /// Tables whose artifacts include relations: `*`, a list, or empty for none
    pub relations: String,
    pub templates_dir: PathBuf,
    pub path_template: String,
    pub templates: Vec<String>,
    /// Overrides `connection.schema` for generation
    pub schema: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./apis/"),
            file_type: "yaml".to_string(),
            tables: "*".to_string(),
            relations: String::new(),
            templates_dir: PathBuf::from("templates"),
            path_template: scaffold_schema::output::DEFAULT_PATH_TEMPLATE.to_string(),
            templates: DEFAULT_TEMPLATES.iter().map(|t| t.to_string()).collect(),
            schema: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldConfig {
    pub connection: ConnectionConfig,
    pub project: ProjectConfig,
}

impl ScaffoldConfig {
    /// Load from `path`, or `scaffold.toml` when present, then apply the
    /// environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => {
                log::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                return Self::from_env();
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| {
            ScaffoldError::Configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: ScaffoldConfig = toml::from_str(&content).map_err(|e| {
            ScaffoldError::Configuration(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply `DB_*` / `PROJECT_*` overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connection = &mut self.connection;
        for (key, target) in [
            ("DB_DRIVER", &mut connection.dialect),
            ("DB_HOST", &mut connection.host),
            ("DB_USERNAME", &mut connection.username),
            ("DB_PASSWORD", &mut connection.password),
            ("DB_NAME", &mut connection.database),
            ("DB_SCHEMA", &mut connection.schema),
            ("DB_SSL_MODE", &mut connection.ssl_mode),
            ("DB_TIMEZONE", &mut connection.timezone),
        ] {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        }

        if let Some(port) = lookup("DB_PORT").filter(|p| !p.trim().is_empty()) {
            connection.port = Some(port.trim().parse().map_err(|_| {
                ScaffoldError::Configuration(format!("invalid DB_PORT value '{}'", port))
            })?);
        }

        let project = &mut self.project;
        if let Some(dir) = lookup("PROJECT_DIR") {
            project.output_dir = PathBuf::from(dir);
        }
        for (key, target) in [
            ("PROJECT_FILE_TYPES", &mut project.file_type),
            ("PROJECT_TABLES", &mut project.tables),
            ("PROJECT_RELATIONS", &mut project.relations),
        ] {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        }
        if let Some(schema) = lookup("PROJECT_SCHEMA").filter(|s| !s.trim().is_empty()) {
            project.schema = Some(schema);
        }

        Ok(())
    }

    /// Schema to scan and generate from
    pub fn schema(&self, dialect: Dialect) -> String {
        match &self.project.schema {
            Some(schema) => schema.trim().to_string(),
            None => self.connection.scan_schema(dialect),
        }
    }

    pub fn generation_request(&self, schema: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(&self.project.output_dir)
            .with_schema(schema)
            .with_tables(Selection::parse(&self.project.tables))
            .with_relations(Selection::parse_relations(&self.project.relations))
            .with_file_type(FileType::from(self.project.file_type.as_str()))
            .with_path_template(self.project.path_template.clone())
            .with_templates(self.project.templates.iter().cloned())
    }
}
