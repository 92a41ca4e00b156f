use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("沒有可轉換的 HEIC/HEIF 檔案")]
    EmptyBatch,

    #[error("已有轉換進行中，請等待完成後再試")]
    Busy,

    #[error("連線轉換服務失敗：{0}")]
    Transport(String),

    // 服務端錯誤，訊息為回應中的 detail 欄位（原文照出）或通用訊息
    #[error("{0}")]
    Service(String),

    #[error("IO 錯誤：{0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ConvertError {
    fn from(err: reqwest::Error) -> Self {
        ConvertError::Transport(err.to_string())
    }
}

// CLI 邊界統一以 io::Result 往外傳
impl From<ConvertError> for std::io::Error {
    fn from(err: ConvertError) -> Self {
        let kind = match &err {
            ConvertError::EmptyBatch | ConvertError::Busy => std::io::ErrorKind::InvalidInput,
            _ => std::io::ErrorKind::Other,
        };
        match err {
            ConvertError::Io(inner) => inner,
            other => std::io::Error::new(kind, other.to_string()),
        }
    }
}
