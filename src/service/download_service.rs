use std::fs;
use std::io;
use std::path::PathBuf;

use log::{info, warn};

use crate::service::traits::i_service::DownloadSinkTrait;

// 磁碟下載出口：寫入輸出目錄；受限環境下寫入失敗時退回系統暫存目錄
pub struct DiskDownloadSink {
    output_dir: PathBuf,
}

impl DiskDownloadSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        DiskDownloadSink {
            output_dir: output_dir.into(),
        }
    }
}

impl DownloadSinkTrait for DiskDownloadSink {
    fn save(&self, name: &str, data: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let target = self.output_dir.join(name);
        match fs::write(&target, data) {
            Ok(()) => {
                info!("已儲存：{}，大小：{} 位元組", target.display(), data.len());
                Ok(target)
            }
            Err(err) => {
                warn!("寫入 {} 失敗（{}），改存至暫存目錄", target.display(), err);
                let fallback = std::env::temp_dir().join(name);
                fs::write(&fallback, data)?;
                info!("已儲存至暫存位置：{}", fallback.display());
                Ok(fallback)
            }
        }
    }
}
