use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::models::batch::SourceFile;

// 可接受的來源副檔名，大小寫不敏感
pub fn is_heic_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".heic") || lower.ends_with(".heif")
}

pub fn read_file_content(file_path: &Path) -> io::Result<(Vec<u8>, usize)> {
    let mut file = File::open(file_path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    let file_size = buffer.len();
    Ok((buffer, file_size))
}

// 展開輸入路徑為一般檔案清單，目錄遞迴收集。
// 副檔名篩選交給 ConversionBatch::select，收集階段不過濾。
pub fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    if path.is_file() {
        files.push(path.to_path_buf());
    } else if path.is_dir() {
        for entry in fs::read_dir(path)? {
            collect_files(&entry?.path(), files)?;
        }
    }
    Ok(())
}

pub fn collect_candidates(inputs: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        collect_files(Path::new(input), &mut files)?;
    }
    Ok(files)
}

// 將路徑載入為記憶體中的 SourceFile，檔名取最後一段
pub fn load_source_files(paths: &[PathBuf]) -> io::Result<Vec<SourceFile>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .unwrap_or(std::ffi::OsStr::new("unnamed"))
            .to_string_lossy()
            .to_string();
        let (data, size) = read_file_content(path)?;
        log::info!("讀取檔案：{}，大小：{} 位元組", path.display(), size);
        sources.push(SourceFile { name, data });
    }
    Ok(sources)
}
