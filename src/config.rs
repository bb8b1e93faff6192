use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub verifier: VerifierConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// How submissions are verified against the AI classifier.
///
/// `Async` starts a remote workflow and leaves the submission `pending` until
/// the client polls the status endpoint. `Blocking` is the legacy mode that
/// polls the classifier inside the submit request under a wall-clock budget
/// and resolves the submission immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    #[default]
    Async,
    Blocking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Workflow start endpoint, e.g.
    /// https://ai-core.example.com/trigger/start/QZ-3DDP/16qObTjWO/production
    pub start_url: String,
    pub api_key: String,
    #[serde(default)]
    pub mode: VerificationMode,
    /// Wall-clock budget for blocking verification (milliseconds).
    #[serde(default = "default_poll_budget_ms")]
    pub poll_budget_ms: u64,
}

fn default_poll_budget_ms() -> u64 {
    45_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 读取配置文件；不存在时完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse config: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    verifier: VerifierConfig {
                        start_url: get_env("AI_VERIFIER_START_URL").unwrap_or_default(),
                        api_key: get_env("AI_VERIFIER_API_KEY").unwrap_or_default(),
                        mode: match get_env("AI_VERIFIER_MODE").as_deref() {
                            Some("blocking") => VerificationMode::Blocking,
                            _ => VerificationMode::Async,
                        },
                        poll_budget_ms: get_env_parse("AI_VERIFIER_POLL_BUDGET_MS", 45_000u64),
                    },
                    storage: StorageConfig {
                        base_url: get_env("STORAGE_BASE_URL").unwrap_or_default(),
                        service_key: get_env("STORAGE_SERVICE_KEY").unwrap_or_default(),
                        bucket: get_env("STORAGE_BUCKET")
                            .unwrap_or_else(|| "proof-images".to_string()),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("AI_VERIFIER_START_URL") {
            config.verifier.start_url = v;
        }
        if let Ok(v) = env::var("AI_VERIFIER_API_KEY") {
            config.verifier.api_key = v;
        }
        if let Ok(v) = env::var("AI_VERIFIER_MODE") {
            config.verifier.mode = match v.as_str() {
                "blocking" => VerificationMode::Blocking,
                _ => VerificationMode::Async,
            };
        }
        if let Ok(v) = env::var("AI_VERIFIER_POLL_BUDGET_MS")
            && let Ok(n) = v.parse()
        {
            config.verifier.poll_budget_ms = n;
        }
        if let Ok(v) = env::var("STORAGE_BASE_URL") {
            config.storage.base_url = v;
        }
        if let Ok(v) = env::var("STORAGE_SERVICE_KEY") {
            config.storage.service_key = v;
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            config.storage.bucket = v;
        }

        Ok(config)
    }
}
