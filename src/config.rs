use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(about = "Runs the bookshelf service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    /// Overrides `app.port` from the config file.
    #[arg(short = 'p', long = "port")]
    pub port: Option<i32>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".bookshelf")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_port")]
    port: i32,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_database() -> String {
    "bookshelf.db".to_string()
}

fn default_port() -> i32 {
    3000
}

fn default_sync_interval() -> u64 {
    60
}

impl Default for App {
    fn default() -> Self {
        App {
            database: default_database(),
            port: default_port(),
            turso_url: None,
            turso_auth_token: None,
            sync_interval_seconds: default_sync_interval(),
        }
    }
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> i32 {
        self.port
    }

    pub fn set_port(&mut self, port: i32) {
        self.port = port;
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        Config::parse(&yaml_str)
    }

    pub fn parse(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let cfg = Config::parse(
            r#"
app:
  database: books.db
  port: 8080
  turso_url: libsql://example.turso.io
  turso_auth_token: secret
  sync_interval_seconds: 15
"#,
        )
        .unwrap();

        assert_eq!(cfg.app.get_db(), "books.db");
        assert_eq!(cfg.app.get_port(), 8080);
        assert_eq!(cfg.app.turso_url.as_deref(), Some("libsql://example.turso.io"));
        assert_eq!(cfg.app.turso_auth_token.as_deref(), Some("secret"));
        assert_eq!(cfg.app.sync_interval_seconds, 15);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg = Config::parse("app: {}\n").unwrap();
        assert_eq!(cfg.app.get_db(), "bookshelf.db");
        assert_eq!(cfg.app.get_port(), 3000);
        assert_eq!(cfg.app.turso_url, None);
        assert_eq!(cfg.app.sync_interval_seconds, 60);
    }

    #[test]
    fn substitutes_defaults_for_unset_variables() {
        let cfg = Config::parse(
            "app:\n  database: ${BOOKSHELF_TEST_UNSET_DB:-fallback.db}\n  port: ${BOOKSHELF_TEST_UNSET_PORT:-4242}\n",
        )
        .unwrap();
        assert_eq!(cfg.app.get_db(), "fallback.db");
        assert_eq!(cfg.app.get_port(), 4242);
    }

    #[test]
    fn substitutes_set_variables() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("BOOKSHELF_TEST_SET_DB", "from-env.db") };
        let out = Config::substitute_env_vars("database: ${BOOKSHELF_TEST_SET_DB:-other.db}").unwrap();
        assert_eq!(out, "database: from-env.db");
    }

    #[test]
    fn unterminated_placeholder_is_left_alone() {
        let out = Config::substitute_env_vars("database: ${OOPS").unwrap();
        assert_eq!(out, "database: ${OOPS");
    }
}
