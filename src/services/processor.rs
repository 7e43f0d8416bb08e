// レコード処理の具象実装

use crate::core::error::ProcessError;
use crate::core::RecordProcessor;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// コンソール出力によるレコード処理実装
///
/// 受け取ったペイロードを表示して消費する。verboseモードでは
/// 1バイトずつ内容を表示する。
#[derive(Debug, Default, Clone)]
pub struct ConsoleRecordProcessor {
    verbose: bool,
}

impl ConsoleRecordProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1バイトずつ内容を表示する詳細モード
    pub fn verbose() -> Self {
        Self { verbose: true }
    }
}

#[async_trait]
impl RecordProcessor for ConsoleRecordProcessor {
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessError> {
        if payload.is_empty() {
            return Err(ProcessError::EmptyPayload);
        }

        let preview_length = payload.len().min(16);
        println!(
            "📦 {}バイトを処理: {}",
            payload.len(),
            hex::encode(&payload[..preview_length])
        );

        if self.verbose {
            for (index, byte) in payload.iter().enumerate() {
                if byte.is_ascii_graphic() {
                    println!("   [{index}] {}", *byte as char);
                } else {
                    println!("   [{index}] 0x{byte:02x}");
                }
            }
        }
        Ok(())
    }
}

/// 処理したペイロードをメモリに蓄積する実装（テスト・検証用）
#[derive(Debug, Default, Clone)]
pub struct CollectingRecordProcessor {
    records: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CollectingRecordProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでに処理したペイロードのスナップショットを取得
    pub fn collected(&self) -> Vec<Vec<u8>> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// 処理済み件数を取得
    pub fn count(&self) -> usize {
        self.records
            .lock()
            .map(|records| records.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl RecordProcessor for CollectingRecordProcessor {
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessError> {
        // スライスは保持せずコピーだけを蓄積する
        if let Ok(mut records) = self.records.lock() {
            records.push(payload.to_vec());
        }
        Ok(())
    }
}
