use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::config::OutputFormat;
use crate::models::batch::SourceFile;
use crate::models::error::ConvertError;
use crate::utils::utils::ProgressManager;

// 轉換服務接口，對應外部 HTTP 轉換服務的兩個端點
#[async_trait]
pub trait ConversionServiceTrait: Send + Sync {
    /// 單檔轉換
    /// # 參數
    /// - file: 來源檔案（檔名與內容）
    /// - format: 目標格式
    /// - progress: 上傳進度回報
    /// # 回傳
    /// - 成功時返回目標格式的二進位內容，失敗時返回轉換錯誤
    async fn convert_single(
        &self,
        file: &SourceFile,
        format: OutputFormat,
        progress: &ProgressManager,
    ) -> Result<Vec<u8>, ConvertError>;

    /// 批次轉換
    /// # 參數
    /// - files: 全部來源檔案，以重複的 files 欄位一次上傳
    /// # 回傳
    /// - 成功時返回包含所有結果的 ZIP 內容，失敗時返回轉換錯誤
    async fn convert_batch(
        &self,
        files: &[SourceFile],
        format: OutputFormat,
        progress: &ProgressManager,
    ) -> Result<Vec<u8>, ConvertError>;
}

// 下載出口接口：以指定檔名保存結果（注入的環境能力，核心邏輯不直接碰檔案系統）
pub trait DownloadSinkTrait: Send + Sync {
    fn save(&self, name: &str, data: &[u8]) -> io::Result<PathBuf>;
}
