//! JSONL Source - 从 JSON Lines 日志读取消息
//!
//! 每行一条记录：
//!
//! ```text
//! {"topic": "/imu", "log_time": 1700000000000000000, "message": {...}}
//! ```
//!
//! `log_time` 也可以写作 `timestamp`，单位纳秒。空行跳过。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use contracts::{ContractError, MessageRecord, MessageSource};
use serde::Deserialize;
use tracing::{debug, info};

use crate::convert::json_to_field;
use crate::error::{IngestionError, Result};
use crate::metrics::SourceMetrics;

/// JSONL 中的一条消息记录
#[derive(Debug, Deserialize)]
struct JsonlRecord {
    topic: String,
    #[serde(alias = "timestamp")]
    log_time: u64,
    message: serde_json::Value,
}

/// JSON Lines 消息源
pub struct JsonlSource {
    name: String,
    base_dir: PathBuf,
    reader: Box<dyn BufRead + Send>,
    line: usize,
    buffer: String,
    metrics: Arc<SourceMetrics>,
}

impl JsonlSource {
    /// 打开 JSONL 文件
    ///
    /// `$file` 引用相对于该文件所在目录解析。
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestionError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        info!(path = %path.display(), "Opened JSONL source");

        Ok(Self::from_reader(
            path.display().to_string(),
            BufReader::new(file),
            base_dir,
        ))
    }

    /// 从任意 reader 构建（测试 / 标准输入）
    pub fn from_reader(
        name: impl Into<String>,
        reader: impl BufRead + Send + 'static,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            reader: Box::new(reader),
            line: 0,
            buffer: String::new(),
            metrics: Arc::new(SourceMetrics::new()),
        }
    }

    /// 共享的读取计数
    pub fn metrics(&self) -> Arc<SourceMetrics> {
        Arc::clone(&self.metrics)
    }

    fn read_record(&mut self) -> Result<Option<MessageRecord>> {
        loop {
            self.buffer.clear();
            let read = self
                .reader
                .read_line(&mut self.buffer)
                .map_err(|source| IngestionError::Read {
                    line: self.line + 1,
                    source,
                })?;
            if read == 0 {
                debug!(source = %self.name, lines = self.line, "JSONL source exhausted");
                return Ok(None);
            }
            self.line += 1;

            let text = self.buffer.trim();
            if text.is_empty() {
                self.metrics.record_blank_line();
                continue;
            }

            let record: JsonlRecord =
                serde_json::from_str(text).map_err(|e| IngestionError::Parse {
                    line: self.line,
                    message: e.to_string(),
                })?;
            let payload = json_to_field(record.message, &self.base_dir).map_err(|message| {
                IngestionError::Parse {
                    line: self.line,
                    message,
                }
            })?;

            self.metrics.record_message(read);
            return Ok(Some(MessageRecord::new(
                record.topic,
                record.log_time,
                payload,
            )));
        }
    }
}

impl MessageSource for JsonlSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_message(&mut self) -> std::result::Result<Option<MessageRecord>, ContractError> {
        self.read_record()
            .map_err(|e| e.into_contract(&self.name))
    }
}
