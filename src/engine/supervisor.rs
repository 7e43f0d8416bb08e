// Pool Supervisor - タスクプールのライフサイクル管理
// Created→Running→Closing→Stoppedの状態遷移を強制し、
// 起動した全タスクを必ずjoinする

use crate::core::error::{RelayError, RelayResult};
use crate::core::traits::{DataSource, ProgressReporter, RecordProcessor, RelayConfig};
use crate::core::types::RelaySummary;
use crate::engine::{consumer::spawn_consumers, producer::spawn_producers};
use crate::queue::RecordQueue;
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// プールの状態
///
/// 遷移はCreated→Running→Closing→Stoppedの一方向のみで、
/// Closingを飛ばす遷移は存在しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Created,
    Running,
    Closing,
    Stopped,
}

impl PoolState {
    /// 状態の文字列表現を取得
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Running => "Running",
            Self::Closing => "Closing",
            Self::Stopped => "Stopped",
        }
    }
}

/// タスク間で共有される実行統計カウンタ
#[derive(Debug, Default)]
pub struct RelayStats {
    produced: AtomicUsize,
    processed: AtomicUsize,
    source_errors: AtomicUsize,
    process_errors: AtomicUsize,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_source_error(&self) {
        self.source_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_process_error(&self) {
        self.process_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn source_errors(&self) -> usize {
        self.source_errors.load(Ordering::Relaxed)
    }

    pub fn process_errors(&self) -> usize {
        self.process_errors.load(Ordering::Relaxed)
    }
}

/// Producer/Consumerプールのライフサイクルを所有するスーパーバイザー
///
/// Queue Coreとタスクハンドルの唯一の所有者。シャットダウンの合図は
/// キューのclose()のみで、各タスクは次の待機点でそれを観測する。
pub struct PoolSupervisor<S, P, C, R> {
    source: Arc<S>,
    processor: Arc<P>,
    config: Arc<C>,
    reporter: Arc<R>,
    queue: Arc<RecordQueue>,
    stats: Arc<RelayStats>,
    state: PoolState,
    producer_handles: Vec<JoinHandle<Result<()>>>,
    consumer_handles: Vec<JoinHandle<Result<()>>>,
    producer_count: usize,
    consumer_count: usize,
    started_at: Option<Instant>,
}

impl<S, P, C, R> PoolSupervisor<S, P, C, R>
where
    S: DataSource + 'static,
    P: RecordProcessor + 'static,
    C: RelayConfig + 'static,
    R: ProgressReporter + 'static,
{
    /// 新しいスーパーバイザーを作成（Created状態）
    ///
    /// Queue Coreはここで一度だけ作られ、プールの寿命と共にある。
    pub fn new(source: Arc<S>, processor: Arc<P>, config: Arc<C>, reporter: Arc<R>) -> Self {
        let queue = Arc::new(RecordQueue::with_capacity(config.queue_capacity()));
        Self {
            source,
            processor,
            config,
            reporter,
            queue,
            stats: Arc::new(RelayStats::new()),
            state: PoolState::Created,
            producer_handles: Vec::new(),
            consumer_handles: Vec::new(),
            producer_count: 0,
            consumer_count: 0,
            started_at: None,
        }
    }

    /// 現在のプール状態を取得
    pub fn state(&self) -> PoolState {
        self.state
    }

    /// 共有キューへの参照を取得（観測用）
    pub fn queue(&self) -> &Arc<RecordQueue> {
        &self.queue
    }

    /// 実行統計への参照を取得
    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    /// 設定された数のProducer/Consumerタスクを起動する
    pub fn start(&mut self, producer_count: usize, consumer_count: usize) -> RelayResult<()> {
        if self.state != PoolState::Created {
            return Err(RelayError::state(
                "起動はCreated状態でのみ可能です",
                self.state.as_str(),
            ));
        }
        if producer_count == 0 {
            return Err(RelayError::configuration(
                "producer数は1以上である必要があります",
            ));
        }
        if consumer_count == 0 {
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

        // consumerを先に起動しておき、最初のレコードから受け手がいる状態にする
        self.consumer_handles = spawn_consumers(
            Arc::clone(&self.processor),
            Arc::clone(&self.queue),
            Arc::clone(&self.reporter),
            Arc::clone(&self.stats),
            consumer_count,
        );
        self.producer_handles = spawn_producers(
            Arc::clone(&self.source),
            Arc::clone(&self.queue),
            Arc::clone(&self.config),
            Arc::clone(&self.reporter),
            Arc::clone(&self.stats),
            producer_count,
        );

        self.producer_count = producer_count;
        self.consumer_count = consumer_count;
        self.started_at = Some(Instant::now());
        self.state = PoolState::Running;
        Ok(())
    }

    /// Producerタスクが自力で完了するのを待つ
    ///
    /// records_per_producerを設定した実行で、生産完了を待ってから
    /// shutdownするために使う。
    pub async fn wait_producers_idle(&mut self) -> RelayResult<()> {
        if self.state != PoolState::Running {
            return Err(RelayError::state(
                "Producerの完了待ちはRunning状態でのみ可能です",
                self.state.as_str(),
            ));
        }
        let mut first_error = None;
        join_all(&mut self.producer_handles, &mut first_error).await;
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// プールを停止する
    ///
    /// drain=trueなら残存バックログをconsumerが処理し切ってからjoinし、
    /// falseならバックログを破棄して直ちに閉鎖する。
    /// どちらの場合も全タスクをjoinしてから戻る（ハンドルのリークなし）。
    pub async fn shutdown(&mut self, drain: bool) -> RelayResult<RelaySummary> {
        if self.state != PoolState::Running {
            return Err(RelayError::state(
                "停止はRunning状態でのみ可能です",
                self.state.as_str(),
            ));
        }
        self.state = PoolState::Closing;

        self.queue.close().await;
        let discarded = if drain {
            0
        } else {
            self.queue.discard_pending().await
        };

        let mut first_error = None;
        join_all(&mut self.producer_handles, &mut first_error).await;
        join_all(&mut self.consumer_handles, &mut first_error).await;

        self.state = PoolState::Stopped;
        if let Some(error) = first_error {
            return Err(error);
        }

        let total_time_ms = self
            .started_at
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0);
        let processed = self.stats.processed();
        Ok(RelaySummary {
            producer_count: self.producer_count,
            consumer_count: self.consumer_count,
            produced_records: self.stats.produced(),
            processed_records: processed,
            source_errors: self.stats.source_errors(),
            process_errors: self.stats.process_errors(),
            discarded_records: discarded,
            total_time_ms,
            average_time_per_record_ms: if processed > 0 {
                total_time_ms as f64 / processed as f64
            } else {
                0.0
            },
        })
    }
}

/// ハンドルを全てjoinし、最初の失敗だけを記録する
///
/// joinは失敗しても中断しない（残りのタスクを置き去りにしない）。
async fn join_all(
    handles: &mut Vec<JoinHandle<Result<()>>>,
    first_error: &mut Option<RelayError>,
) {
    for handle in handles.drain(..) {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                if first_error.is_none() {
                    *first_error = Some(RelayError::internal(error));
                }
            }
            Err(error) => {
                if first_error.is_none() {
                    *first_error = Some(RelayError::task(error));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RelayError;
    use crate::services::config::DefaultRelayConfig;
    use crate::services::monitoring::NoOpProgressReporter;
    use crate::services::processor::CollectingRecordProcessor;
    use crate::services::source::SimulatedDataSource;

    fn supervisor_with_config(
        config: DefaultRelayConfig,
    ) -> (
        PoolSupervisor<
            SimulatedDataSource,
            CollectingRecordProcessor,
            DefaultRelayConfig,
            NoOpProgressReporter,
        >,
        CollectingRecordProcessor,
    ) {
        let processor = CollectingRecordProcessor::new();
        let supervisor = PoolSupervisor::new(
            Arc::new(SimulatedDataSource::new()),
            Arc::new(processor.clone()),
            Arc::new(config),
            Arc::new(NoOpProgressReporter::new()),
        );
        (supervisor, processor)
    }

    #[tokio::test]
    async fn test_pool_state_machine_happy_path() {
        let config = DefaultRelayConfig::default().with_records_per_producer(2);
        let (mut supervisor, _processor) = supervisor_with_config(config);

        assert_eq!(supervisor.state(), PoolState::Created);

        supervisor.start(1, 1).unwrap();
        assert_eq!(supervisor.state(), PoolState::Running);

        supervisor.wait_producers_idle().await.unwrap();
        let summary = supervisor.shutdown(true).await.unwrap();

        assert_eq!(supervisor.state(), PoolState::Stopped);
        assert_eq!(summary.produced_records, 2);
        assert_eq!(summary.processed_records, 2);
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let config = DefaultRelayConfig::default().with_records_per_producer(1);
        let (mut supervisor, _processor) = supervisor_with_config(config);

        supervisor.start(1, 1).unwrap();
        let result = supervisor.start(1, 1);
        assert!(matches!(result, Err(RelayError::StateError { .. })));

        supervisor.shutdown(true).await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_before_start_is_rejected() {
        let config = DefaultRelayConfig::default();
        let (mut supervisor, _processor) = supervisor_with_config(config);

        let result = supervisor.shutdown(true).await;
        assert!(matches!(result, Err(RelayError::StateError { .. })));
        assert_eq!(supervisor.state(), PoolState::Created);
    }

    #[tokio::test]
    async fn test_shutdown_twice_is_rejected() {
        let config = DefaultRelayConfig::default().with_records_per_producer(1);
        let (mut supervisor, _processor) = supervisor_with_config(config);

        supervisor.start(1, 1).unwrap();
        supervisor.shutdown(true).await.unwrap();

        let result = supervisor.shutdown(true).await;
        assert!(matches!(result, Err(RelayError::StateError { .. })));
        assert_eq!(supervisor.state(), PoolState::Stopped);
    }

    #[tokio::test]
    async fn test_start_validates_task_counts() {
        let config = DefaultRelayConfig::default();
        let (mut supervisor, _processor) = supervisor_with_config(config.clone());
        assert!(matches!(
            supervisor.start(0, 1),
            Err(RelayError::ConfigurationError { .. })
        ));

        let (mut supervisor, _processor) = supervisor_with_config(config);
        assert!(matches!(
            supervisor.start(1, 0),
            Err(RelayError::ConfigurationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_start_validates_record_max_bytes() {
        let config = DefaultRelayConfig::default().with_record_max_bytes(0);
        let (mut supervisor, _processor) = supervisor_with_config(config);

        assert!(matches!(
            supervisor.start(1, 1),
            Err(RelayError::ConfigurationError { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_full_relay_run() {
        let config = DefaultRelayConfig::default().with_records_per_producer(5);
        let (mut supervisor, processor) = supervisor_with_config(config);

        supervisor.start(2, 3).unwrap();
        supervisor.wait_producers_idle().await.unwrap();
        let summary = supervisor.shutdown(true).await.unwrap();

        assert_eq!(summary.produced_records, 10);
        assert_eq!(summary.processed_records, 10);
        assert_eq!(summary.source_errors, 0);
        assert_eq!(summary.process_errors, 0);
        assert_eq!(summary.discarded_records, 0);
        assert_eq!(processor.count(), 10);
        assert!(supervisor.queue().is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shutdown_accounting_is_lossless() {
        // drainの有無に関わらず、生産された全レコードは
        // 「処理済み」か「破棄」のどちらかにちょうど1回だけ数えられる
        let config = DefaultRelayConfig::default().with_records_per_producer(20);
        let (mut supervisor, _processor) = supervisor_with_config(config);

        supervisor.start(2, 1).unwrap();
        supervisor.wait_producers_idle().await.unwrap();
        let summary = supervisor.shutdown(false).await.unwrap();

        assert_eq!(summary.produced_records, 40);
        assert_eq!(
            summary.processed_records + summary.discarded_records,
            summary.produced_records
        );
    }

    #[tokio::test]
    async fn test_drain_shutdown_processes_backlog() {
        let config = DefaultRelayConfig::default().with_records_per_producer(10);
        let (mut supervisor, processor) = supervisor_with_config(config);

        supervisor.start(1, 1).unwrap();
        supervisor.wait_producers_idle().await.unwrap();
        let summary = supervisor.shutdown(true).await.unwrap();

        // drain時は破棄なし、全件処理
        assert_eq!(summary.discarded_records, 0);
        assert_eq!(summary.processed_records, 10);
        assert_eq!(processor.count(), 10);
    }

    #[tokio::test]
    async fn test_bounded_queue_relay() {
        let config = DefaultRelayConfig::default()
            .with_queue_capacity(2)
            .with_records_per_producer(8);
        let (mut supervisor, processor) = supervisor_with_config(config);

        supervisor.start(2, 1).unwrap();
        supervisor.wait_producers_idle().await.unwrap();
        let summary = supervisor.shutdown(true).await.unwrap();

        // 容量2でも背圧で全件が流れ切る
        assert_eq!(summary.produced_records, 16);
        assert_eq!(summary.processed_records, 16);
        assert_eq!(processor.count(), 16);
    }
}
