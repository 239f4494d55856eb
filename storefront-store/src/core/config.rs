use crate::bus::DEFAULT_EVENT_CAPACITY;
use crate::storage::sync::DEFAULT_SYNC_CAPACITY;
use std::path::PathBuf;

/// 存储配置 - 一个安装实例的所有配置项
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 |
/// | DB_FILE | storefront.redb | 数据库文件名 (相对 WORK_DIR) |
/// | IN_MEMORY | false | 使用内存后端，不落盘 |
/// | RESTAURANT_ID | default | 餐厅 ID |
/// | SEED_DEFAULTS | true | 首次启动写入默认菜单 |
/// | SYNC_CHANNEL_CAPACITY | 256 | 跨标签页同步通道容量 |
/// | EVENT_CHANNEL_CAPACITY | 256 | 事件总线广播容量 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | 生产环境 true，否则 false | JSON 格式日志 |
/// | LOG_DIR | (空) | 日志目录，空则只输出到控制台 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/tmp/shop RESTAURANT_ID=r1 cargo run -- summary
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// 工作目录，存放数据库文件
    pub work_dir: String,
    pub db_file: String,
    /// 内存模式 (测试、临时会话)
    pub in_memory: bool,
    pub restaurant_id: String,
    pub seed_defaults: bool,
    pub sync_channel_capacity: usize,
    pub event_channel_capacity: usize,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

fn is_production(environment: &str) -> bool {
    environment.eq_ignore_ascii_case("production")
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl StoreConfig {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "storefront.redb".into()),
            in_memory: env_or("IN_MEMORY", false),
            restaurant_id: std::env::var("RESTAURANT_ID").unwrap_or_else(|_| "default".into()),
            seed_defaults: env_or("SEED_DEFAULTS", true),
            sync_channel_capacity: env_or("SYNC_CHANNEL_CAPACITY", DEFAULT_SYNC_CAPACITY),
            event_channel_capacity: env_or("EVENT_CHANNEL_CAPACITY", DEFAULT_EVENT_CAPACITY),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", is_production(&environment)),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            environment,
        }
    }

    /// 内存实例，常用于测试场景
    pub fn in_memory(restaurant_id: impl Into<String>, seed_defaults: bool) -> Self {
        let mut config = Self::from_env();
        config.in_memory = true;
        config.restaurant_id = restaurant_id.into();
        config.seed_defaults = seed_defaults;
        config
    }

    /// 数据库文件完整路径
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        is_production(&self.environment)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
