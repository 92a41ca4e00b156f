use std::io;

use indicatif::{ProgressBar, ProgressStyle};

pub fn setup_logging(log_level: &str) -> io::Result<()> {
    let log_level_filter = match log_level {
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(log_level_filter)
        .init();
    Ok(())
}

// 上傳進度條：以位元組計，單調遞增至 100% 後轉為伺服器處理階段
#[derive(Clone)]
pub struct ProgressManager {
    pb: ProgressBar,
    no_progress: bool,
}

impl ProgressManager {
    pub fn upload(total_bytes: u64, message: String, no_progress: bool) -> Self {
        let pb = if no_progress {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total_bytes);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40}] {percent}% ({bytes}/{total_bytes})")
                    .unwrap()
                    .progress_chars("##-"),
            );
            pb
        };
        pb.set_message(message);
        ProgressManager { pb, no_progress }
    }

    pub fn hidden() -> Self {
        ProgressManager {
            pb: ProgressBar::hidden(),
            no_progress: true,
        }
    }

    // 上傳串流每送出一塊呼叫一次；送滿即進入處理階段
    pub fn on_chunk_sent(&self, bytes: u64) {
        if self.no_progress {
            return;
        }
        self.pb.inc(bytes);
        if self.pb.position() >= self.pb.length().unwrap_or(u64::MAX) {
            self.pb.set_message("上傳完成，伺服器處理中");
        }
    }

    pub fn finish(&self, message: &str) {
        if self.no_progress {
            return;
        }
        self.pb.finish_with_message(message.to_string());
    }

    pub fn abandon(&self, message: &str) {
        if self.no_progress {
            return;
        }
        self.pb.abandon_with_message(message.to_string());
    }
}

pub fn format_file_size(size: usize) -> String {
    if size < 1024 * 1024 {
        format!("{:.2} KB", size as f64 / 1024.0)
    } else {
        format!("{:.2} MB", size as f64 / (1024.0 * 1024.0))
    }
}
