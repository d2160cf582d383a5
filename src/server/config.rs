use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,

    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_email_from")]
    pub email_from: String,

    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_from_number: Option<String>,

    #[serde(default = "default_check_worker_count")]
    pub check_worker_count: usize,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
    email_from: Option<String>,
    twilio_account_sid: Option<String>,
    twilio_auth_token: Option<String>,
    twilio_from_number: Option<String>,
    check_worker_count: Option<usize>,
    log_dir: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_email_from() -> String {
    "alerts@pulsewatch.local".to_string()
}

fn default_check_worker_count() -> usize {
    4
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        let final_config = ServerConfig {
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            smtp_host: env_config.smtp_host.or(file_config.smtp_host),
            smtp_port: env_config
                .smtp_port
                .or(file_config.smtp_port)
                .unwrap_or_else(default_smtp_port),
            smtp_username: env_config.smtp_username.or(file_config.smtp_username),
            smtp_password: env_config.smtp_password.or(file_config.smtp_password),
            email_from: env_config
                .email_from
                .or(file_config.email_from)
                .unwrap_or_else(default_email_from),
            twilio_account_sid: env_config
                .twilio_account_sid
                .or(file_config.twilio_account_sid),
            twilio_auth_token: env_config
                .twilio_auth_token
                .or(file_config.twilio_auth_token),
            twilio_from_number: env_config
                .twilio_from_number
                .or(file_config.twilio_from_number),
            check_worker_count: env_config
                .check_worker_count
                .or(file_config.check_worker_count)
                .unwrap_or_else(default_check_worker_count),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
        };

        Ok(final_config)
    }
}
