//! Ingestion 错误类型

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 文件无法打开
    #[error("failed to open {}: {source}", path.display())]
    Open {
        /// 文件路径
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 读取失败
    #[error("read error at line {line}: {source}")]
    Read {
        /// 行号 (1-based)
        line: usize,
        #[source]
        source: std::io::Error,
    },

    /// 记录解析失败
    #[error("malformed record at line {line}: {message}")]
    Parse {
        /// 行号 (1-based)
        line: usize,
        /// 错误消息
        message: String,
    },

    /// 不支持的文件格式
    #[error("unsupported source format '{extension}' for {}", path.display())]
    UnsupportedFormat {
        /// 文件路径
        path: PathBuf,
        /// 扩展名
        extension: String,
    },
}

impl IngestionError {
    /// 转换为 `ContractError::Source`
    pub fn into_contract(self, source_name: &str) -> ContractError {
        ContractError::source(source_name, self.to_string())
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
