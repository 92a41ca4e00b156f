use std::io;
use std::path::Path;

use dialoguer::{Confirm, Input, Select};

use crate::config::config::{OutputFormat, Strategy};
use crate::config::ports::{AppConfig, PreferenceStorePort};
use crate::service::config_service::{resolve_api_base, JsonPreferenceStore};
use crate::utils::utils::setup_logging;

const FORMAT_PREF_KEY: &str = "output_format";

pub async fn process_interactive_mode() -> io::Result<String> {
    println!("=== 歡迎使用互動模式 ===");
    let prefs = JsonPreferenceStore::new(JsonPreferenceStore::default_path());

    let inputs = get_input_paths()?;
    let output = get_output_path()?;
    let format = get_output_format(&prefs)?;
    let strategy = get_strategy()?;
    let no_progress = !get_progress_option()?;
    let log_level = get_log_level_option()?;

    setup_logging(&log_level)?;
    let config = AppConfig {
        inputs,
        output,
        format,
        strategy,
        api_base: resolve_api_base(None),
        timeout_secs: 120,
        no_progress,
    };
    crate::action::cli::run_conversion(config).await
}

pub fn get_input_paths() -> io::Result<Vec<String>> {
    let raw: String = Input::new()
        .with_prompt("請輸入檔案或目錄路徑（多個以逗號分隔，例如：./photo.heic,./photos）")
        .validate_with(|input: &String| -> Result<(), String> {
            for part in input.split(',') {
                let part = part.trim();
                if !Path::new(part).exists() {
                    return Err(format!("路徑 '{}' 不存在", part));
                }
            }
            Ok(())
        })
        .interact_text()
        .map_err(|e| io::Error::other(e.to_string()))?;
    Ok(raw
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect())
}

pub fn get_output_path() -> io::Result<String> {
    Input::new()
        .with_prompt("請輸入輸出目錄")
        .default("output".to_string())
        .interact_text()
        .map_err(|e| io::Error::other(e.to_string()))
}

// 輸出格式，預設帶出上次選擇
pub fn get_output_format(prefs: &dyn PreferenceStorePort) -> io::Result<OutputFormat> {
    let formats = [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::Pdf];
    let remembered = prefs
        .get(FORMAT_PREF_KEY)
        .and_then(|value| OutputFormat::from_param(&value))
        .unwrap_or_default();
    let default_index = formats
        .iter()
        .position(|f| *f == remembered)
        .unwrap_or(0);

    let index = Select::new()
        .with_prompt("選擇輸出格式（使用方向鍵選擇，按 Enter 確認）")
        .items(&["JPG", "PNG", "PDF"])
        .default(default_index)
        .interact()
        .map_err(|e| io::Error::other(format!("輸出格式選擇失敗: {}", e)))?;

    let format = formats[index];
    if let Err(err) = prefs.set(FORMAT_PREF_KEY, format.as_param()) {
        log::warn!("無法記住輸出格式偏好：{}", err);
    }
    Ok(format)
}

pub fn get_strategy() -> io::Result<Strategy> {
    let index = Select::new()
        .with_prompt("選擇多檔轉換方式")
        .items(&[
            "批次 - 一次上傳全部，伺服器回傳 ZIP（預設）",
            "逐檔 - 逐一上傳，多個結果在本地打包",
        ])
        .default(0)
        .interact()
        .map_err(|e| io::Error::other(format!("轉換方式選擇失敗: {}", e)))?;
    Ok(if index == 1 {
        Strategy::Single
    } else {
        Strategy::Batch
    })
}

pub fn get_progress_option() -> io::Result<bool> {
    Confirm::new()
        .with_prompt("是否顯示上傳進度條？")
        .default(true)
        .interact()
        .map_err(|e| io::Error::other(e.to_string()))
}

pub fn get_log_level_option() -> io::Result<String> {
    let levels = ["info", "warn", "error"];
    let index = Select::new()
        .with_prompt("選擇日誌層級")
        .items(&levels)
        .default(0)
        .interact()
        .map_err(|e| io::Error::other(format!("日誌層級選擇失敗: {}", e)))?;
    Ok(levels[index].to_string())
}
