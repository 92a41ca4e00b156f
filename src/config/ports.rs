use std::io;

use crate::config::config::{OutputFormat, Strategy};

// 應用配置結構體，封裝一次轉換流程所需的全部參數
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inputs: Vec<String>,
    pub output: String,
    pub format: OutputFormat,
    pub strategy: Strategy,
    pub api_base: String,
    pub timeout_secs: u64,
    pub no_progress: bool,
}

// 配置來源的 Port
pub trait ConfigPort {
    fn get_config(&self) -> io::Result<AppConfig>;
}

// 鍵值偏好儲存的 Port（互動模式記住上次選擇）
pub trait PreferenceStorePort: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
}
