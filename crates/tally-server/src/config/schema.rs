use serde::Deserialize;
use tally_core::error::{Result, TallyError};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub app: AppSection,

    #[serde(default)]
    pub log: LogSection,

    #[serde(default)]
    pub cors: CorsSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            app: AppSection::default(),
            log: LogSection::default(),
            cors: CorsSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TallyError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.app.port == 0 {
            return Err(TallyError::BadRequest("app.port must not be 0".into()));
        }
        self.log.validate()?;
        self.metrics.validate()?;
        Ok(())
    }

    /// Apply environment overrides. Empty values count as unset.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "APP_NAME" => self.app.name = value,
                "APP_ENV" => self.app.env = value,
                "HOST" => self.app.host = value,
                "PORT" => {
                    self.app.port = value
                        .parse()
                        .map_err(|_| TallyError::BadRequest(format!("PORT is not a port: {value}")))?;
                }
                "LOG_LEVEL" => self.log.level = Some(value.to_ascii_lowercase()),
                "LOG_DIR" => self.log.dir = value,
                "URL_DEVELOPMENT" => self.cors.development_url = value,
                "URL_PRODUCTION" => self.cors.production_url = Some(value),
                "METRICS_PATH" => self.metrics.path = value,
                _ => {}
            }
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.app.env == "development"
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }

    /// Explicit level, else `debug` in development and `info` elsewhere.
    pub fn log_level(&self) -> &str {
        match &self.log.level {
            Some(level) => level,
            None if self.is_development() => "debug",
            None => "info",
        }
    }

    /// Allowlist plus the development and production URLs, de-duplicated.
    pub fn cors_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        let extra = [
            Some(&self.cors.development_url),
            self.cors.production_url.as_ref(),
        ];
        for o in self.cors.allowlist.iter().chain(extra.into_iter().flatten()) {
            if !o.is_empty() && !origins.contains(o) {
                origins.push(o.clone());
            }
        }
        origins
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            env: default_app_env(),
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default = "default_log_dir")]
    pub dir: String,

    /// Write rolling `app` and `error` files under `dir`.
    #[serde(default = "default_true")]
    pub files: bool,

    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: None,
            dir: default_log_dir(),
            files: true,
            max_files: default_max_files(),
        }
    }
}

impl LogSection {
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = &self.level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(TallyError::BadRequest(format!(
                    "log.level must be one of {LOG_LEVELS:?}, got {level}"
                )));
            }
        }
        if self.max_files == 0 {
            return Err(TallyError::BadRequest("log.max_files must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsSection {
    #[serde(default = "default_allowlist")]
    pub allowlist: Vec<String>,

    #[serde(default = "default_development_url")]
    pub development_url: String,

    #[serde(default)]
    pub production_url: Option<String>,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            allowlist: default_allowlist(),
            development_url: default_development_url(),
            production_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') {
            return Err(TallyError::BadRequest("metrics.path must start with '/'".into()));
        }
        // Route syntax characters (`:`, `*`, `{`) would make the router panic.
        if let Some(c) = self
            .path
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '.' | '-')))
        {
            return Err(TallyError::BadRequest(format!(
                "metrics.path may only contain [A-Za-z0-9/_.-], found {c:?}"
            )));
        }
        if self.path == crate::router::HEALTH_PATH {
            return Err(TallyError::BadRequest(
                "metrics.path must not shadow the health route".into(),
            ));
        }
        Ok(())
    }
}

fn default_app_name() -> String {
    "App".into()
}
fn default_app_env() -> String {
    "development".into()
}
fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    3000
}
fn default_log_dir() -> String {
    "./storage/logs".into()
}
fn default_max_files() -> usize {
    90
}
fn default_allowlist() -> Vec<String> {
    vec!["http://127.0.0.1:3000".into()]
}
fn default_development_url() -> String {
    "http://localhost:3000".into()
}
fn default_metrics_path() -> String {
    "/metrics".into()
}
fn default_true() -> bool {
    true
}
