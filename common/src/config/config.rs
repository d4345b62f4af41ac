use anyhow::{Result, anyhow};
use config::Config;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::sync::Arc;
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    pub server: Option<ServerConfig>,
    pub sys: Option<SysConfig>,
    pub flash: Option<FlashConfig>,
}
impl AppConfig {
    /// 读取配置文件，`APP_` 前缀的环境变量可覆盖文件中的值，如 `APP_SYS__LOG_LEVEL`
    pub fn new(file: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(config::File::with_name(file).required(true))
            .add_source(config::Environment::with_prefix("APP").prefix_separator("_").separator("__").try_parsing(true))
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;
        let cfg = config
            .try_deserialize::<AppConfig>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;
        Ok(cfg)
    }
    pub fn init(file: &str) -> Result<()> {
        let instance = Self::new(file)?;
        INSTANCE.set(Arc::new(instance)).map_err(|_| anyhow!("INSTANCE already initialized"))
    }

    pub fn get_database(&self) -> DatabaseConfig {
        self.database.clone().unwrap_or_default()
    }
    pub fn get_server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }
    pub fn get_sys(&self) -> SysConfig {
        self.sys.clone().unwrap_or_default()
    }
    pub fn get_flash(&self) -> FlashConfig {
        self.flash.clone().unwrap_or_default()
    }
    /// 获取单例
    pub fn get() -> Arc<Self> {
        INSTANCE.get().cloned().unwrap_or_default()
    }
}
static INSTANCE: OnceCell<Arc<AppConfig>> = OnceCell::new();
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: String,
    pub db_name: String,
}
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SysConfig {
    //全局日志级别
    pub log_level: String,
}
impl Default for SysConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

/// 一次性提示消息（flash）缓存
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FlashConfig {
    /// 消息存活秒数，过期未读即丢弃
    pub ttl_secs: u64,
    pub max_capacity: u64,
}
impl Default for FlashConfig {
    fn default() -> Self {
        Self { ttl_secs: 60, max_capacity: 10_000 }
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use std::io::Write;

    #[test]
    fn test_load_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin-config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[database]\nurl = \"mongodb://localhost:27017\"\ndb_name = \"cms\"\n[server]\nport = 9000").unwrap();

        let cfg = AppConfig::new(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.get_database().db_name, "cms");
        assert_eq!(cfg.get_server().port, 9000);
        assert_eq!(cfg.get_server().host, "127.0.0.1");
        assert_eq!(cfg.get_sys().log_level, "info");
        assert_eq!(cfg.get_flash().ttl_secs, 60);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::new("/nonexistent/admin-config.toml").is_err());
    }
}
