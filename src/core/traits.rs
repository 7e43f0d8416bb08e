// 中継処理システムのトレイト定義
// 全ての抽象化インターフェースを定義

use super::error::{ProcessError, SourceError};
use async_trait::async_trait;
use mockall::automock;
use std::time::Duration;

/// 外部データソースの抽象化トレイト
///
/// Producer Taskからのみ呼び出される。同一タスク内では直列に、
/// タスク間では並行に呼び出されうる。
#[automock]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// 最大max_bytesバイトの1レコード分のデータを取得
    async fn fetch(&self, max_bytes: usize) -> Result<Vec<u8>, SourceError>;
}

/// レコード処理の抽象化トレイト
///
/// Consumer Taskからのみ呼び出される。渡されるスライスは呼び出しの
/// 間だけ有効であり、実装は保持してはならない。
#[automock]
#[async_trait]
pub trait RecordProcessor: Send + Sync {
    /// 1レコード分のペイロードを処理
    async fn process(&self, payload: &[u8]) -> Result<(), ProcessError>;
}

/// 中継処理の設定を抽象化するトレイト
#[automock]
pub trait RelayConfig: Send + Sync {
    /// Producer Task数を取得
    fn producer_count(&self) -> usize;

    /// Consumer Task数を取得
    fn consumer_count(&self) -> usize;

    /// 1レコードの最大バイト数を取得
    fn record_max_bytes(&self) -> usize;

    /// キュー容量上限を取得（Noneで無制限）
    fn queue_capacity(&self) -> Option<usize>;

    /// Producer 1タスクあたりの生産レコード数（Noneで停止まで継続）
    fn records_per_producer(&self) -> Option<usize>;

    /// ソース読み込み失敗時のバックオフ時間を取得
    fn source_retry_delay(&self) -> Duration;

    /// シャットダウン時にバックログを処理し切るかどうか
    fn drain_on_shutdown(&self) -> bool;

    /// 進捗報告を有効にするかどうか
    fn enable_progress_reporting(&self) -> bool;
}

// RelayConfig for Box<dyn RelayConfig>
impl RelayConfig for Box<dyn RelayConfig> {
    fn producer_count(&self) -> usize {
        self.as_ref().producer_count()
    }

    fn consumer_count(&self) -> usize {
        self.as_ref().consumer_count()
    }

    fn record_max_bytes(&self) -> usize {
        self.as_ref().record_max_bytes()
    }

    fn queue_capacity(&self) -> Option<usize> {
        self.as_ref().queue_capacity()
    }

    fn records_per_producer(&self) -> Option<usize> {
        self.as_ref().records_per_producer()
    }

    fn source_retry_delay(&self) -> Duration {
        self.as_ref().source_retry_delay()
    }

    fn drain_on_shutdown(&self) -> bool {
        self.as_ref().drain_on_shutdown()
    }

    fn enable_progress_reporting(&self) -> bool {
        self.as_ref().enable_progress_reporting()
    }
}

/// 進捗報告の抽象化トレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// プール起動時の報告
    async fn report_started(&self, producer_count: usize, consumer_count: usize);

    /// ソース読み込み失敗の報告
    async fn report_source_error(&self, producer_id: usize, error: &SourceError);

    /// レコード処理失敗の報告
    async fn report_process_error(&self, consumer_id: usize, sequence: u64, error: &ProcessError);

    /// 処理完了時の報告
    async fn report_completed(&self, total_processed: usize, total_errors: usize);
}

// ProgressReporter for Box<dyn ProgressReporter>
#[async_trait]
impl ProgressReporter for Box<dyn ProgressReporter> {
    async fn report_started(&self, producer_count: usize, consumer_count: usize) {
        self.as_ref()
            .report_started(producer_count, consumer_count)
            .await
    }

    async fn report_source_error(&self, producer_id: usize, error: &SourceError) {
        self.as_ref().report_source_error(producer_id, error).await
    }

    async fn report_process_error(&self, consumer_id: usize, sequence: u64, error: &ProcessError) {
        self.as_ref()
            .report_process_error(consumer_id, sequence, error)
            .await
    }

    async fn report_completed(&self, total_processed: usize, total_errors: usize) {
        self.as_ref()
            .report_completed(total_processed, total_errors)
            .await
    }
}
