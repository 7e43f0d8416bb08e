// RelayEngine - 依存性注入による中継処理エンジン
// 全ての依存関係がコンストラクタで注入されるDIパターン実装

use super::supervisor::PoolSupervisor;
use crate::core::{
    error::{RelayError, RelayResult},
    traits::{DataSource, ProgressReporter, RecordProcessor, RelayConfig},
    types::RelaySummary,
};
use std::sync::Arc;
use std::time::Duration;

/// 依存性注入による中継処理エンジン
///
/// ソース・プロセッサ・設定・レポーターをコンストラクタで受け取り、
/// タスク間で共有される依存関係はArcで管理する。
pub struct RelayEngine<S, P, C, R> {
    source: Arc<S>,
    processor: Arc<P>,
    config: Arc<C>,
    reporter: Arc<R>,
}

impl<S, P, C, R> RelayEngine<S, P, C, R>
where
    S: DataSource + 'static,
    P: RecordProcessor + 'static,
    C: RelayConfig + 'static,
    R: ProgressReporter + 'static,
{
    /// 新しいエンジンを作成（Constructor Injection）
    pub fn new(source: S, processor: P, config: C, reporter: R) -> Self {
        Self {
            source: Arc::new(source),
            processor: Arc::new(processor),
            config: Arc::new(config),
            reporter: Arc::new(reporter),
        }
    }

    /// レコード数上限つきの実行
    ///
    /// 各producerがrecords_per_producer件を生産し終えるのを待ち、
    /// バックログを処理し切ってから停止する。
    pub async fn run(&self) -> RelayResult<RelaySummary> {
        self.validate_config()?;
        if self.config.records_per_producer().is_none() {
            return Err(RelayError::configuration(
                "run()にはrecords_per_producerの設定が必要です（無期限実行はrun_forを使用）",
            ));
        }

        let mut supervisor = self.supervisor();
        if self.config.enable_progress_reporting() {
            self.reporter
                .report_started(self.config.producer_count(), self.config.consumer_count())
                .await;
        }

        supervisor.start(self.config.producer_count(), self.config.consumer_count())?;
        supervisor.wait_producers_idle().await?;
        // 予定数を生産し終えた後は必ず処理し切ってから止める
        let summary = supervisor.shutdown(true).await?;

        self.report_completed(&summary).await;
        Ok(summary)
    }

    /// 指定時間だけ実行してから停止する
    ///
    /// バックログの扱いは設定のdrain_on_shutdownに従う。
    pub async fn run_for(&self, duration: Duration) -> RelayResult<RelaySummary> {
        self.validate_config()?;

        let mut supervisor = self.supervisor();
        if self.config.enable_progress_reporting() {
            self.reporter
                .report_started(self.config.producer_count(), self.config.consumer_count())
                .await;
        }

        supervisor.start(self.config.producer_count(), self.config.consumer_count())?;
        tokio::time::sleep(duration).await;
        let summary = supervisor.shutdown(self.config.drain_on_shutdown()).await?;

        self.report_completed(&summary).await;
        Ok(summary)
    }

    /// 設定への参照を取得（読み取り専用アクセス）
    pub fn config(&self) -> &C {
        &self.config
    }

    /// レポーターへの参照を取得
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    fn supervisor(&self) -> PoolSupervisor<S, P, C, R> {
        PoolSupervisor::new(
            Arc::clone(&self.source),
            Arc::clone(&self.processor),
            Arc::clone(&self.config),
            Arc::clone(&self.reporter),
        )
    }

    fn validate_config(&self) -> RelayResult<()> {
        if self.config.producer_count() == 0 {
            return Err(RelayError::configuration(
                "producer数は1以上である必要があります",
            ));
        }
        if self.config.consumer_count() == 0 {
            return Err(RelayError::configuration(
                "consumer数は1以上である必要があります",
            ));
        }
        if self.config.record_max_bytes() == 0 {
            return Err(RelayError::configuration(
                "レコード最大バイト数は1以上である必要があります",
            ));
        }
        if self.config.queue_capacity() == Some(0) {
            return Err(RelayError::configuration(
                "キュー容量は1以上である必要があります",
            ));
        }
        Ok(())
    }

    async fn report_completed(&self, summary: &RelaySummary) {
        if self.config.enable_progress_reporting() {
            self.reporter
                .report_completed(
                    summary.processed_records,
                    summary.source_errors + summary.process_errors,
                )
                .await;
        }
    }
}
