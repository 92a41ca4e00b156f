use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::config::config::Cli;
use crate::config::ports::{AppConfig, ConfigPort, PreferenceStorePort};

// 未指定伺服器時使用的正式站來源
pub const DEFAULT_BACKEND_URL: &str = "https://heicconverter.online";
pub const BACKEND_URL_ENV: &str = "HEIC_BACKEND_URL";

// 配置服務，負責選擇適當的配置適配器
pub struct ConfigService {
    config_port: Box<dyn ConfigPort>,
}

impl ConfigService {
    pub fn new(config_port: Box<dyn ConfigPort>) -> Self {
        ConfigService { config_port }
    }

    pub fn get_config(&self) -> io::Result<AppConfig> {
        self.config_port.get_config()
    }
}

// 後端來源解析順序：--server、HEIC_BACKEND_URL、正式站預設，API 根為 <來源>/api
pub fn resolve_api_base(server: Option<&str>) -> String {
    let origin = server
        .map(str::to_string)
        .or_else(|| std::env::var(BACKEND_URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    format!("{}/api", origin.trim_end_matches('/'))
}

// CLI 參數配置適配器
pub struct CliConfigAdapter {
    cli: Cli,
}

impl CliConfigAdapter {
    pub fn new(cli: Cli) -> Self {
        CliConfigAdapter { cli }
    }
}

impl ConfigPort for CliConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        Ok(AppConfig {
            inputs: self.cli.inputs.clone(),
            output: self.cli.output.clone(),
            format: self.cli.format,
            strategy: self.cli.strategy,
            api_base: resolve_api_base(self.cli.server.as_deref()),
            timeout_secs: self.cli.timeout,
            no_progress: self.cli.no_progress,
        })
    }
}

// JSON 檔案偏好儲存（互動模式記住上次輸出格式）
pub struct JsonPreferenceStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonPreferenceStore {
    pub fn new(path: PathBuf) -> Self {
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        JsonPreferenceStore {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("HEIC_CONVERT_PREFS") {
            return PathBuf::from(path);
        }
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".heic_convert.json")
    }
}

impl PreferenceStorePort for JsonPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let serialized = {
            let mut values = self
                .values
                .lock()
                .map_err(|_| io::Error::other("偏好儲存鎖定失敗"))?;
            values.insert(key.to_string(), value.to_string());
            serde_json::to_string_pretty(&*values)?
        };
        fs::write(&self.path, serialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_base_is_rooted_at_api() {
        assert_eq!(
            resolve_api_base(Some("http://localhost:8000")),
            "http://localhost:8000/api"
        );
        assert_eq!(
            resolve_api_base(Some("http://localhost:8000/")),
            "http://localhost:8000/api"
        );
    }

    #[test]
    fn preference_store_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "heic_convert_prefs_test_{}.json",
            std::process::id()
        ));
        let store = JsonPreferenceStore::new(path.clone());
        assert_eq!(store.get("output_format"), None);
        store.set("output_format", "png").unwrap();
        assert_eq!(store.get("output_format"), Some("png".to_string()));

        // 重新載入後仍保留
        let reloaded = JsonPreferenceStore::new(path.clone());
        assert_eq!(reloaded.get("output_format"), Some("png".to_string()));
        let _ = fs::remove_file(path);
    }
}
