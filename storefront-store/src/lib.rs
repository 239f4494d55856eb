//! Storefront Store - 餐厅店面的嵌入式数据存储
//!
//! # 架构概述
//!
//! 每个标签页 (UI 会话) 持有一个 [`StorefrontState`]：
//!
//! - **持久化存储** (`storage`): redb 键值存储 + 跨标签页变更通道
//! - **领域仓库** (`repository`): 分类、菜品、订单、设置的类型化 CRUD
//! - **事件总线** (`bus`): 进程内发布/订阅
//! - **订单状态机** (`shared::order`) 与统计 (`statistics`)
//!
//! 写入流程：仓库方法 → 读取集合 (带版本号) → 校验 → 修改 → 带版本号写回
//! → 事件总线通知 → 同步通道通知其他标签页。
//!
//! # 模块结构
//!
//! ```text
//! storefront-store/src/
//! ├── core/          # 配置、状态
//! ├── storage/       # redb 键值存储、信封格式、同步通道
//! ├── repository/    # 领域仓库
//! ├── bus/           # 事件总线
//! ├── statistics.rs  # 订单统计
//! ├── seed.rs        # 默认菜单
//! └── utils/         # 日志、金额、时间
//! ```

pub mod bus;
pub mod core;
pub mod repository;
pub mod seed;
pub mod statistics;
pub mod storage;
pub mod utils;

// Re-export 公共类型
pub use bus::{Channel, EventBus, ListenerId};
pub use core::{StoreConfig, StoreSummary, StorefrontState};
pub use repository::{RepoError, RepoResult};
pub use statistics::{DailyRevenue, OrdersStatistics};
pub use storage::{KvStore, StorageChange, StorageError, SyncChannel};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv, 日志)
///
/// 返回加载好的配置。
pub fn setup_environment() -> anyhow::Result<StoreConfig> {
    dotenv::dotenv().ok();
    let config = StoreConfig::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    tracing::info!(
        environment = %config.environment,
        production = config.is_production(),
        "Environment ready"
    );
    Ok(config)
}

pub fn print_banner() {
    eprintln!(
        r#"
   _____ __                  ____                 __
  / ___// /_____  ________  / __/________  ____  / /_
  \__ \/ __/ __ \/ ___/ _ \/ /_/ ___/ __ \/ __ \/ __/
 ___/ / /_/ /_/ / /  /  __/ __/ /  / /_/ / / / / /_
/____/\__/\____/_/   \___/_/ /_/   \____/_/ /_/\__/
    "#
    );
}
