use std::io;
use std::path::PathBuf;

use log::{error, info};

use crate::config::config::{OutputFormat, Strategy};
use crate::models::batch::{ArtifactStore, ConversionBatch, ConvertedFile};
use crate::models::error::ConvertError;
use crate::service::traits::i_service::{ConversionServiceTrait, DownloadSinkTrait};
use crate::utils::utils::ProgressManager;

// 批次端點回傳的封存檔名（伺服器 Content-Disposition 的名稱）
pub const BATCH_ARCHIVE_NAME: &str = "converted_files.zip";
// 本地打包多個單檔結果時使用的封存檔名
pub const CLIENT_ARCHIVE_NAME: &str = "converted-images.zip";

// 來源檔名換副檔名：去掉 .heic/.heif（大小寫不敏感，保留主檔名大小寫），
// 其他尾端副檔名也一併去除後接上目標副檔名
pub fn derive_output_name(source: &str, format: OutputFormat) -> String {
    let lower = source.to_lowercase();
    let stem = if lower.ends_with(".heic") || lower.ends_with(".heif") {
        &source[..source.len() - 5]
    } else if let Some(dot) = source.rfind('.') {
        &source[..dot]
    } else {
        source
    };
    format!("{}.{}", stem, format.extension())
}

// 驅動一次轉換：依策略走批次端點或逐檔端點，結果存入 ArtifactStore。
// 失敗不動選擇，過期結果（期間發生 reset/select）直接撤銷丟棄。
pub async fn convert_selected<S: ConversionServiceTrait>(
    batch: &mut ConversionBatch,
    store: &mut ArtifactStore,
    service: &S,
    strategy: Strategy,
    no_progress: bool,
) -> Result<(), ConvertError> {
    let token = batch.begin_convert()?;
    let format = batch.format;
    let use_batch_endpoint = batch.is_batch_mode() && strategy == Strategy::Batch;

    let outcome = if use_batch_endpoint {
        let total: u64 = batch.files().iter().map(|f| f.data.len() as u64).sum();
        let progress = ProgressManager::upload(
            total,
            format!("批次上傳 {} 個檔案", batch.len()),
            no_progress,
        );
        batch.mark_processing(token);
        let result = service.convert_batch(batch.files(), format, &progress).await;
        match result {
            Ok(data) => {
                progress.finish("批次轉換完成");
                Ok(vec![(BATCH_ARCHIVE_NAME.to_string(), data)])
            }
            Err(err) => {
                progress.abandon("批次轉換失敗");
                Err(err)
            }
        }
    } else {
        let mut named = Vec::with_capacity(batch.len());
        let mut failure = None;
        let total_files = batch.len();
        batch.mark_processing(token);
        for (index, file) in batch.files().iter().enumerate() {
            let progress = ProgressManager::upload(
                file.data.len() as u64,
                format!("上傳 {}/{}：{}", index + 1, total_files, file.name),
                no_progress,
            );
            match service.convert_single(file, format, &progress).await {
                Ok(data) => {
                    progress.finish("完成");
                    named.push((derive_output_name(&file.name, format), data));
                }
                Err(err) => {
                    progress.abandon("失敗");
                    failure = Some(err);
                    break;
                }
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(named),
        }
    };

    match outcome {
        Ok(named) => {
            let results: Vec<ConvertedFile> = named
                .into_iter()
                .map(|(name, data)| ConvertedFile {
                    handle: store.insert(data),
                    name,
                })
                .collect();
            if let Err(stale) = batch.complete(results, token) {
                info!("轉換完成時狀態已變更，捨棄 {} 個過期結果", stale.len());
                for result in stale {
                    store.revoke(result.handle);
                }
            }
            Ok(())
        }
        Err(err) => {
            error!("轉換失敗：{}", err);
            batch.fail(token);
            Err(err)
        }
    }
}

// 單一結果下載
pub fn download_one(
    file: &ConvertedFile,
    store: &ArtifactStore,
    sink: &dyn DownloadSinkTrait,
) -> io::Result<PathBuf> {
    let data = store.payload(file.handle).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("結果 {} 已被釋放", file.name),
        )
    })?;
    sink.save(&file.name, data)
}

// 全部下載：單一結果等同 download_one；多個結果先在本地打包成單一 ZIP
pub fn download_all(
    files: &[ConvertedFile],
    store: &ArtifactStore,
    sink: &dyn DownloadSinkTrait,
) -> io::Result<Vec<PathBuf>> {
    match files {
        [] => Ok(Vec::new()),
        [single] => Ok(vec![download_one(single, store, sink)?]),
        many => {
            let mut entries = Vec::with_capacity(many.len());
            for file in many {
                let data = store.payload(file.handle).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("結果 {} 已被釋放", file.name),
                    )
                })?;
                entries.push((file.name.clone(), data.to_vec()));
            }
            let archive = crate::utils::zip::bundle_archive(&entries)?;
            Ok(vec![sink.save(CLIENT_ARCHIVE_NAME, &archive)?])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::models::batch::{Phase, SourceFile};

    fn source(name: &str, data: &[u8]) -> SourceFile {
        SourceFile {
            name: name.to_string(),
            data: data.to_vec(),
        }
    }

    #[derive(Default)]
    struct MockService {
        single_calls: Mutex<usize>,
        batch_calls: Mutex<usize>,
        fail_with: Option<String>,
    }

    impl MockService {
        fn failing(detail: &str) -> Self {
            MockService {
                fail_with: Some(detail.to_string()),
                ..MockService::default()
            }
        }

        fn single_calls(&self) -> usize {
            *self.single_calls.lock().unwrap()
        }

        fn batch_calls(&self) -> usize {
            *self.batch_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ConversionServiceTrait for MockService {
        async fn convert_single(
            &self,
            file: &SourceFile,
            _format: OutputFormat,
            _progress: &ProgressManager,
        ) -> Result<Vec<u8>, ConvertError> {
            *self.single_calls.lock().unwrap() += 1;
            if let Some(detail) = &self.fail_with {
                return Err(ConvertError::Service(detail.clone()));
            }
            // 轉換結果以來源內容反轉模擬
            Ok(file.data.iter().rev().copied().collect())
        }

        async fn convert_batch(
            &self,
            files: &[SourceFile],
            format: OutputFormat,
            _progress: &ProgressManager,
        ) -> Result<Vec<u8>, ConvertError> {
            *self.batch_calls.lock().unwrap() += 1;
            if let Some(detail) = &self.fail_with {
                return Err(ConvertError::Service(detail.clone()));
            }
            let entries: Vec<(String, Vec<u8>)> = files
                .iter()
                .map(|f| {
                    (
                        derive_output_name(&f.name, format),
                        f.data.iter().rev().copied().collect(),
                    )
                })
                .collect();
            Ok(crate::utils::zip::bundle_archive(&entries).unwrap())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl MemorySink {
        fn saved(&self) -> Vec<(String, Vec<u8>)> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl DownloadSinkTrait for MemorySink {
        fn save(&self, name: &str, data: &[u8]) -> io::Result<PathBuf> {
            self.saved
                .lock()
                .unwrap()
                .push((name.to_string(), data.to_vec()));
            Ok(PathBuf::from(name))
        }
    }

    #[test]
    fn output_name_replaces_source_extension() {
        assert_eq!(derive_output_name("photo.HEIC", OutputFormat::Jpeg), "photo.jpg");
        assert_eq!(derive_output_name("photo.heic", OutputFormat::Png), "photo.png");
        assert_eq!(derive_output_name("IMG_0001.heif", OutputFormat::Pdf), "IMG_0001.pdf");
        assert_eq!(derive_output_name("Mixed.HeIf", OutputFormat::Jpeg), "Mixed.jpg");
    }

    #[tokio::test]
    async fn empty_batch_issues_no_request() {
        let service = MockService::default();
        let mut store = ArtifactStore::new();
        let mut batch = ConversionBatch::new(OutputFormat::Jpeg);
        let result =
            convert_selected(&mut batch, &mut store, &service, Strategy::Batch, true).await;
        assert!(matches!(result, Err(ConvertError::EmptyBatch)));
        assert_eq!(service.single_calls(), 0);
        assert_eq!(service.batch_calls(), 0);
    }

    #[tokio::test]
    async fn single_file_uses_single_endpoint_and_derives_name() {
        let service = MockService::default();
        let mut store = ArtifactStore::new();
        let mut batch = ConversionBatch::new(OutputFormat::Jpeg);
        batch.select(vec![source("photo.HEIC", &[1, 2, 3])], &mut store);

        convert_selected(&mut batch, &mut store, &service, Strategy::Batch, true)
            .await
            .unwrap();
        assert_eq!(service.single_calls(), 1);
        assert_eq!(service.batch_calls(), 0);
        assert_eq!(batch.phase(), Phase::Complete);
        assert_eq!(batch.results().len(), 1);
        assert_eq!(batch.results()[0].name, "photo.jpg");
        assert_eq!(store.payload(batch.results()[0].handle), Some(&[3u8, 2, 1][..]));
    }

    #[tokio::test]
    async fn batch_strategy_issues_one_request_with_archive_result() {
        let service = MockService::default();
        let mut store = ArtifactStore::new();
        let mut batch = ConversionBatch::new(OutputFormat::Png);
        batch.select(
            vec![source("a.heic", &[1]), source("b.heif", &[2])],
            &mut store,
        );
        assert!(batch.is_batch_mode());

        convert_selected(&mut batch, &mut store, &service, Strategy::Batch, true)
            .await
            .unwrap();
        assert_eq!(service.batch_calls(), 1);
        assert_eq!(service.single_calls(), 0);
        assert_eq!(batch.results().len(), 1);
        assert_eq!(batch.results()[0].name, BATCH_ARCHIVE_NAME);

        // 封存內容須能還原出 a.png 與 b.png
        let archive_bytes = store.payload(batch.results()[0].handle).unwrap().to_vec();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(archive_bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("a.png").is_ok());
        assert!(archive.by_name("b.png").is_ok());
    }

    #[tokio::test]
    async fn single_strategy_issues_one_request_per_file() {
        let service = MockService::default();
        let mut store = ArtifactStore::new();
        let mut batch = ConversionBatch::new(OutputFormat::Png);
        batch.select(
            vec![source("a.heic", &[1]), source("b.heif", &[2])],
            &mut store,
        );

        convert_selected(&mut batch, &mut store, &service, Strategy::Single, true)
            .await
            .unwrap();
        assert_eq!(service.single_calls(), 2);
        assert_eq!(service.batch_calls(), 0);
        let names: Vec<&str> = batch.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[tokio::test]
    async fn service_detail_is_surfaced_and_selection_survives() {
        let service = MockService::failing("corrupt file");
        let mut store = ArtifactStore::new();
        let mut batch = ConversionBatch::new(OutputFormat::Jpeg);
        batch.select(vec![source("photo.heic", &[1])], &mut store);

        let err = convert_selected(&mut batch, &mut store, &service, Strategy::Batch, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "corrupt file");
        assert_eq!(batch.phase(), Phase::Failed);
        assert_eq!(batch.len(), 1);
        assert!(store.is_empty());

        // 失敗後可直接重試
        let retry = MockService::default();
        convert_selected(&mut batch, &mut store, &retry, Strategy::Batch, true)
            .await
            .unwrap();
        assert_eq!(batch.phase(), Phase::Complete);
    }

    #[tokio::test]
    async fn download_all_with_one_result_behaves_like_download_one() {
        let service = MockService::default();
        let mut store = ArtifactStore::new();
        let mut batch = ConversionBatch::new(OutputFormat::Jpeg);
        batch.select(vec![source("photo.heic", &[7, 8])], &mut store);
        convert_selected(&mut batch, &mut store, &service, Strategy::Single, true)
            .await
            .unwrap();

        let sink = MemorySink::default();
        let saved = download_all(batch.results(), &store, &sink).unwrap();
        assert_eq!(saved, vec![PathBuf::from("photo.jpg")]);
        let records = sink.saved();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "photo.jpg");
        assert_eq!(records[0].1, vec![8, 7]);
    }

    #[tokio::test]
    async fn download_all_with_many_results_bundles_one_archive() {
        let service = MockService::default();
        let mut store = ArtifactStore::new();
        let mut batch = ConversionBatch::new(OutputFormat::Png);
        batch.select(
            vec![source("a.heic", &[1, 2]), source("b.heif", &[3])],
            &mut store,
        );
        convert_selected(&mut batch, &mut store, &service, Strategy::Single, true)
            .await
            .unwrap();

        let sink = MemorySink::default();
        download_all(batch.results(), &store, &sink).unwrap();
        let records = sink.saved();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, CLIENT_ARCHIVE_NAME);

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(records[0].1.clone())).unwrap();
        assert_eq!(archive.len(), 2);
        let mut data = Vec::new();
        archive.by_name("a.png").unwrap().read_to_end(&mut data).unwrap();
        assert_eq!(data, vec![2, 1]);
    }

    #[tokio::test]
    async fn teardown_reset_revokes_all_handles() {
        let service = MockService::default();
        let mut store = ArtifactStore::new();
        let mut batch = ConversionBatch::new(OutputFormat::Jpeg);
        batch.select(
            vec![source("a.heic", &[1]), source("b.heic", &[2])],
            &mut store,
        );
        convert_selected(&mut batch, &mut store, &service, Strategy::Single, true)
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(batch.reset(&mut store), 2);
        assert!(store.is_empty());
    }
}
