use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::feed::ColumnLayout;

/// 配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "STOCKTAKE_CONFIG";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub feed: FeedConfig,
    pub import: ImportConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 上传主数据文件的请求体上限
    pub max_body_bytes: usize,
    /// 会话空闲多久后被清理 (秒), 0 表示不清理
    pub session_ttl_secs: u64,
    /// 清理任务的执行间隔 (秒)
    pub sweep_interval_secs: u64,
}

/// 主数据文件 (商品マスタ / 在庫一覧) 的编码与列布局
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub encoding: String,
    pub master: ColumnLayout,
    pub snapshot: ColumnLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// EC 表格导入的固定部门标签
    pub department: String,
    /// 表格没有名称时使用的标签
    pub default_sheet_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_body_bytes: 32 * 1024 * 1024,
                session_ttl_secs: 8 * 60 * 60,
                sweep_interval_secs: 5 * 60,
            },
            feed: FeedConfig {
                encoding: "Shift_JIS".to_string(),
                master: ColumnLayout::product_master(),
                snapshot: ColumnLayout::inventory_snapshot(),
            },
            import: ImportConfig {
                department: "EC".to_string(),
                default_sheet_label: "Excel".to_string(),
            },
            log: LogConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 加载配置: 内置默认值 -> stocktake.toml (可选) -> STOCKTAKE_* 环境变量
    pub fn load() -> AppResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "stocktake".to_string());
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> AppResult<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("STOCKTAKE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
