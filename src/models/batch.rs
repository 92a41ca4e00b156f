use std::collections::HashMap;

use crate::config::config::OutputFormat;
use crate::models::error::ConvertError;
use crate::utils::file::is_heic_name;

#[derive(Clone)]
pub struct SourceFile {
    pub name: String,
    pub data: Vec<u8>,
}

pub type ArtifactHandle = u64;

// 轉換結果：衍生檔名加上指向 ArtifactStore 的 handle，handle 必須顯式釋放
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertedFile {
    pub name: String,
    pub handle: ArtifactHandle,
}

// 轉換結果的持有者，對應瀏覽器端的 object URL：建立後需在重置或收尾時撤銷
#[derive(Default)]
pub struct ArtifactStore {
    artifacts: HashMap<ArtifactHandle, Vec<u8>>,
    next: ArtifactHandle,
}

impl ArtifactStore {
    pub fn new() -> Self {
        ArtifactStore::default()
    }

    pub fn insert(&mut self, data: Vec<u8>) -> ArtifactHandle {
        self.next += 1;
        self.artifacts.insert(self.next, data);
        self.next
    }

    pub fn payload(&self, handle: ArtifactHandle) -> Option<&[u8]> {
        self.artifacts.get(&handle).map(|data| data.as_slice())
    }

    pub fn revoke(&mut self, handle: ArtifactHandle) -> bool {
        self.artifacts.remove(&handle).is_some()
    }

    pub fn revoke_all(&mut self) -> usize {
        let revoked = self.artifacts.len();
        self.artifacts.clear();
        revoked
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Selecting,
    Uploading,
    Processing,
    Complete,
    Failed,
}

// 一次轉換批次的狀態機：選擇、批次旗標、進行中守衛與世代計數
pub struct ConversionBatch {
    files: Vec<SourceFile>,
    pub format: OutputFormat,
    batch_mode: bool,
    phase: Phase,
    generation: u64,
    results: Vec<ConvertedFile>,
}

impl ConversionBatch {
    pub fn new(format: OutputFormat) -> Self {
        ConversionBatch {
            files: Vec::new(),
            format,
            batch_mode: false,
            phase: Phase::Idle,
            generation: 0,
            results: Vec::new(),
        }
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn results(&self) -> &[ConvertedFile] {
        &self.results
    }

    pub fn is_batch_mode(&self) -> bool {
        self.batch_mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    // 篩選候選檔案加入選擇，回傳被略過的數量。
    // 任何選擇變動都會使先前的轉換結果失效並撤銷其 handle。
    pub fn select(&mut self, candidates: Vec<SourceFile>, store: &mut ArtifactStore) -> usize {
        let total = candidates.len();
        let before = self.files.len();
        for candidate in candidates {
            if is_heic_name(&candidate.name) {
                self.files.push(candidate);
            } else {
                log::warn!("略過非 HEIC/HEIF 檔案：{}", candidate.name);
            }
        }
        let added = self.files.len() - before;
        self.invalidate_results(store);
        self.after_mutation();
        total - added
    }

    pub fn remove(&mut self, index: usize, store: &mut ArtifactStore) -> Option<SourceFile> {
        if index >= self.files.len() {
            return None;
        }
        let removed = self.files.remove(index);
        self.invalidate_results(store);
        self.after_mutation();
        Some(removed)
    }

    // 進入轉換前的守衛：空選擇為驗證錯誤，進行中則拒絕重入。
    // 回傳的世代 token 供完成時判斷結果是否已過期。
    pub fn begin_convert(&mut self) -> Result<u64, ConvertError> {
        if self.files.is_empty() {
            return Err(ConvertError::EmptyBatch);
        }
        if matches!(self.phase, Phase::Uploading | Phase::Processing) {
            return Err(ConvertError::Busy);
        }
        self.phase = Phase::Uploading;
        Ok(self.generation)
    }

    pub fn mark_processing(&mut self, token: u64) {
        if token == self.generation && self.phase == Phase::Uploading {
            self.phase = Phase::Processing;
        }
    }

    // 完成轉換。token 不符表示期間發生過 reset/select，結果過期，
    // 原樣退還給呼叫端撤銷。
    pub fn complete(
        &mut self,
        results: Vec<ConvertedFile>,
        token: u64,
    ) -> Result<(), Vec<ConvertedFile>> {
        if token != self.generation {
            return Err(results);
        }
        self.results = results;
        self.phase = Phase::Complete;
        Ok(())
    }

    // 失敗時不動選擇，只回到可重試狀態
    pub fn fail(&mut self, token: u64) {
        if token == self.generation {
            self.phase = Phase::Failed;
        }
    }

    // 撤銷所有結果、清空選擇、還原預設格式，回傳撤銷的 handle 數
    pub fn reset(&mut self, store: &mut ArtifactStore) -> usize {
        let revoked = self.invalidate_results(store);
        self.files.clear();
        self.format = OutputFormat::default();
        self.batch_mode = false;
        self.phase = Phase::Idle;
        self.generation += 1;
        revoked
    }

    fn invalidate_results(&mut self, store: &mut ArtifactStore) -> usize {
        let mut revoked = 0;
        for result in self.results.drain(..) {
            if store.revoke(result.handle) {
                revoked += 1;
            }
        }
        revoked
    }

    fn after_mutation(&mut self) {
        self.batch_mode = self.files.len() > 1;
        self.phase = if self.files.is_empty() {
            Phase::Idle
        } else {
            Phase::Selecting
        };
        self.generation += 1;
    }
}
