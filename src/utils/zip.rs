use std::io::{self, Write};

use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

// 將多個轉換結果打包成單一 ZIP（本地打包路徑，對應多結果下載）
pub fn bundle_archive(entries: &[(String, Vec<u8>)]) -> io::Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut buffer = Vec::new();
    let mut writer = ZipWriter::new(std::io::Cursor::new(&mut buffer));
    for (name, data) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(data)?;
    }
    writer.finish()?;
    log::info!("本地打包 {} 個結果，ZIP 大小：{} 位元組", entries.len(), buffer.len());
    Ok(buffer)
}
