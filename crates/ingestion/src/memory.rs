//! Memory 消息源
//!
//! 用于测试和嵌入式调用，不依赖任何日志文件。

use std::collections::VecDeque;

use contracts::{ContractError, FieldValue, MessageRecord, MessageSource};

/// 内存消息源
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    messages: VecDeque<MessageRecord>,
    /// 消息耗尽后返回的错误（模拟损坏的日志）
    trailing_error: Option<String>,
}

impl MemorySource {
    /// 创建新的内存消息源
    pub fn new(name: impl Into<String>, messages: impl IntoIterator<Item = MessageRecord>) -> Self {
        Self {
            name: name.into(),
            messages: messages.into_iter().collect(),
            trailing_error: None,
        }
    }

    /// 生成固定频率的消息序列
    ///
    /// 第 i 条消息的时间戳为 `start_ns + i * 1e9 / frequency_hz`，负载由 `payload(i)` 生成。
    pub fn periodic(
        name: impl Into<String>,
        topic: &str,
        start_ns: u64,
        frequency_hz: f64,
        count: usize,
        mut payload: impl FnMut(usize) -> FieldValue,
    ) -> Self {
        let period_ns = 1e9 / frequency_hz;
        let messages = (0..count).map(|i| {
            let timestamp = start_ns + (i as f64 * period_ns).round() as u64;
            MessageRecord::new(topic, timestamp, payload(i))
        });
        Self::new(name, messages.collect::<Vec<_>>())
    }

    /// 消息读完后返回 SourceError
    pub fn with_trailing_error(mut self, message: impl Into<String>) -> Self {
        self.trailing_error = Some(message.into());
        self
    }

    /// 追加一条消息
    pub fn push(&mut self, message: MessageRecord) {
        self.messages.push_back(message);
    }

    /// 剩余消息数
    pub fn remaining(&self) -> usize {
        self.messages.len()
    }
}

impl MessageSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_message(&mut self) -> Result<Option<MessageRecord>, ContractError> {
        match self.messages.pop_front() {
            Some(message) => Ok(Some(message)),
            None => match self.trailing_error.take() {
                Some(message) => Err(ContractError::source(&self.name, message)),
                None => Ok(None),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_timestamps() {
        let mut source =
            MemorySource::periodic("mem", "/imu", 1_000, 100.0, 3, |i| FieldValue::Int(i as i64));
        let stamps: Vec<u64> = std::iter::from_fn(|| source.next_message().unwrap())
            .map(|m| m.timestamp)
            .collect();
        assert_eq!(stamps, vec![1_000, 10_001_000, 20_001_000]);
    }

    #[test]
    fn test_trailing_error() {
        let mut source = MemorySource::new("broken", [MessageRecord::new("/a", 1, FieldValue::Null)])
            .with_trailing_error("truncated chunk");
        assert!(source.next_message().unwrap().is_some());
        let err = source.next_message().unwrap_err();
        assert!(err.to_string().contains("truncated chunk"));
        assert!(source.next_message().unwrap().is_none());
    }
}
