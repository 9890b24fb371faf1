use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gacha: GachaConfig,
    /// 角色表为空时写入的初始角色
    #[serde(default)]
    pub characters: Vec<CharacterSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许跨域的来源，空表示不限制
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// sea-orm `sheet_rows` 表
    #[default]
    Sheet,
    /// 进程内存（重启即丢失）
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sheet" => Ok(StoreKind::Sheet),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("未知的 TABLE_STORE: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(default)]
    pub store: StoreKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GachaConfig {
    /// 新用户初始票数
    #[serde(default = "default_starting_tickets")]
    pub starting_tickets: i64,
    /// 全局事务锁最长等待时间 (ms)
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_starting_tickets() -> i64 {
    10
}

fn default_lock_timeout_ms() -> u64 {
    10_000
}

impl Default for GachaConfig {
    fn default() -> Self {
        Self {
            starting_tickets: default_starting_tickets(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSeed {
    pub char_id: String,
    pub name: String,
    pub rarity: String,
    pub weight: f64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                        cors_allowed_origins: Vec::new(),
                    },
                    database: DatabaseConfig {
                        url: get_env("DATABASE_URL")
                            .unwrap_or_else(|| "sqlite://gacha.db?mode=rwc".to_string()),
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 5u32),
                        store: get_env_parse("TABLE_STORE", StoreKind::Sheet),
                    },
                    gacha: GachaConfig::default(),
                    characters: Vec::new(),
                }
            }
            Err(e) => {
                return Err(format!("无法读取配置文件 {config_path}: {e}").into());
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
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGINS") {
            config.server.cors_allowed_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("TABLE_STORE") {
            config.database.store = v.parse()?;
        }
        if let Ok(v) = env::var("GACHA_STARTING_TICKETS")
            && let Ok(n) = v.parse()
        {
            config.gacha.starting_tickets = n;
        }
        if let Ok(v) = env::var("GACHA_LOCK_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            config.gacha.lock_timeout_ms = n;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config =
            toml::from_str(config_str).map_err(|e| format!("解析配置文件失败: {e}"))?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.gacha.starting_tickets < 0 {
            return Err("gacha.starting_tickets 不能为负数".into());
        }
        if let Some(bad) = self
            .characters
            .iter()
            .find(|c| !(c.weight.is_finite() && c.weight > 0.0))
        {
            return Err(format!("角色 {} 的 weight 必须为正数", bad.char_id).into());
        }
        Ok(())
    }
}
