use clap::{Parser, ValueEnum};
use std::io;
use std::path::Path;

#[derive(Parser, Clone)]
#[command(
    name = "heic_convert",
    about = "將 HEIC/HEIF 檔案透過轉換服務轉為 JPG、PNG 或 PDF",
    long_about = "一個將 HEIC/HEIF 檔案上傳至轉換服務的命令列工具，支援單檔轉換或多檔批次轉換，\
批次結果可由伺服器端打包，或逐檔轉換後在本地打包成單一 ZIP。\n\
不帶參數執行時進入互動模式。使用 `--help` 查看詳細用法。",
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(required = true)]
    pub inputs: Vec<String>,
    #[arg(short, long, default_value = "output")]
    pub output: String,
    #[arg(long, default_value = "jpeg")]
    pub format: OutputFormat,
    #[arg(long, default_value = "batch")]
    pub strategy: Strategy,
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
    #[arg(long, default_value = "info", value_parser = ["info", "warn", "error"])]
    pub log_level: String,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Pdf,
}

impl OutputFormat {
    // 傳給服務的 output_format 欄位值
    pub fn as_param(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }

    // 下載檔名使用的副檔名，jpeg 對應 jpg
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }

    pub fn expected_mime(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpg",
            OutputFormat::Png => "image/png",
            OutputFormat::Pdf => "application/pdf",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "pdf" => Some(OutputFormat::Pdf),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq, Debug, Default)]
pub enum Strategy {
    // 多檔時使用 /convert-batch，由伺服器回傳 ZIP
    #[default]
    Batch,
    // 逐檔呼叫 /convert，多個結果在本地打包
    Single,
}

pub fn validate_cli_args(cli: &Cli) -> io::Result<()> {
    for input in &cli.inputs {
        validate_input_path(input)?;
    }
    if cli.timeout == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "逾時秒數必須大於 0",
        ));
    }
    if let Some(server) = &cli.server {
        validate_server_origin(server)?;
    }
    Ok(())
}

pub fn validate_input_path(input: &str) -> io::Result<&Path> {
    let path = Path::new(input);
    if !path.exists() {
        log::error!("輸入路徑不存在：{}", input);
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("輸入路徑 '{}' 不存在", input),
        ));
    }
    Ok(path)
}

pub fn validate_server_origin(server: &str) -> io::Result<()> {
    if !server.starts_with("http://") && !server.starts_with("https://") {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("伺服器位址 '{}' 必須以 http:// 或 https:// 開頭", server),
        ));
    }
    Ok(())
}
