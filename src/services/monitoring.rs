// 進捗監視の具象実装

use crate::core::error::{ProcessError, SourceError};
use crate::core::ProgressReporter;
use async_trait::async_trait;

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_started(&self, producer_count: usize, consumer_count: usize) {
        if !self.quiet {
            println!(
                "🚀 中継開始: producer {producer_count}タスク / consumer {consumer_count}タスク"
            );
        }
    }

    async fn report_source_error(&self, producer_id: usize, error: &SourceError) {
        if !self.quiet {
            eprintln!("❌ ソース読み込み失敗 (producer {producer_id}): {error}");
        }
    }

    async fn report_process_error(&self, consumer_id: usize, sequence: u64, error: &ProcessError) {
        if !self.quiet {
            eprintln!("❌ レコード処理失敗 (consumer {consumer_id}, record #{sequence}): {error}");
        }
    }

    async fn report_completed(&self, total_processed: usize, total_errors: usize) {
        if !self.quiet {
            println!("✅ 完了! 処理済み: {total_processed}, エラー: {total_errors}");
        }
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_started(&self, _producer_count: usize, _consumer_count: usize) {
        // 何もしない
    }

    async fn report_source_error(&self, _producer_id: usize, _error: &SourceError) {
        // 何もしない
    }

    async fn report_process_error(
        &self,
        _consumer_id: usize,
        _sequence: u64,
        _error: &ProcessError,
    ) {
        // 何もしない
    }

    async fn report_completed(&self, _total_processed: usize, _total_errors: usize) {
        // 何もしない
    }
}
