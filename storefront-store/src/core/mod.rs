//! 核心模块 - 配置和状态
//!
//! - [`StoreConfig`] - 存储配置
//! - [`StorefrontState`] - 一个标签页的存储、事件总线和仓库

pub mod config;
pub mod state;

pub use config::StoreConfig;
pub use state::{StoreSummary, StorefrontState};
