use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::Deserialize;

use crate::config::config::OutputFormat;
use crate::models::batch::SourceFile;
use crate::models::error::ConvertError;
use crate::service::traits::i_service::ConversionServiceTrait;
use crate::utils::utils::ProgressManager;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;
const GENERIC_FAILURE: &str = "轉換失敗，請稍後再試";

// 服務端錯誤回應的結構，detail 為人類可讀訊息
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    detail: String,
}

pub struct HttpConversionService {
    client: Client,
    api_base: String,
}

impl HttpConversionService {
    pub fn new(api_base: String, timeout_secs: u64) -> Result<Self, ConvertError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(HttpConversionService {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    // 來源檔案包成串流 Part，每送出一塊就回報進度
    fn stream_part(file: &SourceFile, progress: &ProgressManager) -> Result<Part, ConvertError> {
        let size = file.data.len() as u64;
        let chunks: Vec<Result<Bytes, std::io::Error>> = file
            .data
            .chunks(UPLOAD_CHUNK_SIZE)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        let progress = progress.clone();
        let stream = futures::stream::iter(chunks).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                progress.on_chunk_sent(bytes.len() as u64);
            }
        });
        let part = Part::stream_with_length(Body::wrap_stream(stream), size)
            .file_name(file.name.clone())
            .mime_str("application/octet-stream")?;
        Ok(part)
    }

    async fn read_binary(response: Response, expected_mime: &str) -> Result<Vec<u8>, ConvertError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ConvertError::Service(decode_error_detail(
                status.as_u16(),
                &body,
            )));
        }
        if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or("");
            if !content_type.starts_with(expected_mime) {
                warn!("回應內容類型 {} 與預期 {} 不符", content_type, expected_mime);
            }
        }
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

// 錯誤回應可能帶著二進位內容類型，一律先以文字解讀再解析 JSON 取 detail
pub fn decode_error_detail(status: u16, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&text) {
        if !parsed.detail.is_empty() {
            return parsed.detail;
        }
    }
    format!("{}（HTTP {}）", GENERIC_FAILURE, status)
}

#[async_trait]
impl ConversionServiceTrait for HttpConversionService {
    async fn convert_single(
        &self,
        file: &SourceFile,
        format: OutputFormat,
        progress: &ProgressManager,
    ) -> Result<Vec<u8>, ConvertError> {
        let url = self.build_url("/convert");
        info!("單檔上傳：{}，目標格式：{}", file.name, format.as_param());
        let form = Form::new()
            .part("file", Self::stream_part(file, progress)?)
            .text("output_format", format.as_param());
        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_binary(response, format.expected_mime()).await
    }

    async fn convert_batch(
        &self,
        files: &[SourceFile],
        format: OutputFormat,
        progress: &ProgressManager,
    ) -> Result<Vec<u8>, ConvertError> {
        let url = self.build_url("/convert-batch");
        info!("批次上傳 {} 個檔案，目標格式：{}", files.len(), format.as_param());
        let mut form = Form::new();
        for file in files {
            form = form.part("files", Self::stream_part(file, progress)?);
        }
        let form = form.text("output_format", format.as_param());
        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_binary(response, "application/zip").await
    }
}
