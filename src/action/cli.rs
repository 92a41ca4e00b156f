use std::io;

use clap::Parser;
use log::{info, warn};

use crate::config::config::{validate_cli_args, Cli};
use crate::config::ports::AppConfig;
use crate::models::batch::{ArtifactStore, ConversionBatch};
use crate::service::api_client::HttpConversionService;
use crate::service::config_service::{CliConfigAdapter, ConfigService};
use crate::service::download_service::DiskDownloadSink;
use crate::utils::convert::{convert_selected, download_all};
use crate::utils::file::{collect_candidates, load_source_files};
use crate::utils::utils::{format_file_size, setup_logging};

pub async fn process_args(args: Vec<String>) -> io::Result<String> {
    if args.len() == 1 {
        crate::action::interactive::process_interactive_mode().await
    } else {
        process_cli_mode().await
    }
}

pub async fn process_cli_mode() -> io::Result<String> {
    let cli = Cli::parse();
    validate_cli_args(&cli)?;
    setup_logging(&cli.log_level)?;

    let config = ConfigService::new(Box::new(CliConfigAdapter::new(cli))).get_config()?;
    run_conversion(config).await
}

// 共用轉換流程：收集、篩選、上傳、保存，最後釋放所有結果 handle
pub async fn run_conversion(config: AppConfig) -> io::Result<String> {
    info!(
        "開始轉換，輸入：{:?}，輸出目錄：{}，目標格式：{}，服務：{}",
        config.inputs,
        config.output,
        config.format.as_param(),
        config.api_base
    );

    let paths = collect_candidates(&config.inputs)?;
    let candidates = load_source_files(&paths)?;
    let total_size: usize = candidates.iter().map(|c| c.data.len()).sum();

    let mut store = ArtifactStore::new();
    let mut batch = ConversionBatch::new(config.format);
    let skipped = batch.select(candidates, &mut store);
    if skipped > 0 {
        warn!("{} 個非 HEIC/HEIF 檔案已略過", skipped);
    }
    if batch.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "沒有可轉換的 HEIC/HEIF 檔案",
        ));
    }
    info!(
        "共 {} 個檔案待轉換，總大小：{}，批次模式：{}",
        batch.len(),
        format_file_size(total_size),
        batch.is_batch_mode()
    );

    let service = HttpConversionService::new(config.api_base.clone(), config.timeout_secs)?;
    convert_selected(
        &mut batch,
        &mut store,
        &service,
        config.strategy,
        config.no_progress,
    )
    .await?;

    let sink = DiskDownloadSink::new(config.output.clone());
    let saved = download_all(batch.results(), &store, &sink)?;
    for path in &saved {
        println!("已儲存：{}", path.display());
    }

    // 收尾：釋放所有結果 handle
    let revoked = batch.reset(&mut store);
    info!("已釋放 {} 個結果 handle", revoked);

    Ok(config.output)
}
