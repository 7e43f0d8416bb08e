// Producer - 外部ソースからのレコード生産機能

use crate::core::traits::{DataSource, ProgressReporter, RelayConfig};
use crate::core::types::Record;
use crate::engine::supervisor::RelayStats;
use crate::queue::RecordQueue;
use anyhow::Result;
use std::sync::Arc;

/// 単一Producerタスク: 外部ソースから取得したデータをレコード化してキューへ送る
///
/// ソース読み込み中にキューのロックは一切保持しない。
/// キューの閉鎖がこのタスクの停止合図になる。
pub fn spawn_producer<S, C, R>(
    producer_id: usize,
    source: Arc<S>,
    queue: Arc<RecordQueue>,
    config: Arc<C>,
    reporter: Arc<R>,
    stats: Arc<RelayStats>,
) -> tokio::task::JoinHandle<Result<()>>
where
    S: DataSource + 'static,
    C: RelayConfig + 'static,
    R: ProgressReporter + 'static,
{
    tokio::spawn(async move {
        let mut produced = 0usize;
        loop {
            if let Some(budget) = config.records_per_producer() {
                if produced >= budget {
                    break;
                }
            }
            if queue.is_closed().await {
                break;
            }

            let mut payload = match source.fetch(config.record_max_bytes()).await {
                Ok(payload) => payload,
                Err(error) => {
                    // 読み込み失敗はこの1件に閉じる: 報告してバックオフ後に再試行
                    stats.add_source_error();
                    reporter.report_source_error(producer_id, &error).await;
                    tokio::time::sleep(config.source_retry_delay()).await;
                    continue;
                }
            };

            // 空読みはデータ未到着として扱い、同様に待って再試行
            if payload.is_empty() {
                tokio::time::sleep(config.source_retry_delay()).await;
                continue;
            }

            payload.truncate(config.record_max_bytes());
            if queue.push(Record::new(payload)).await.is_err() {
                // キュー閉鎖は正常なシャットダウンシグナル
                break;
            }
            produced += 1;
            stats.add_produced();
        }
        Ok(())
    })
}

/// Producers: 設定された数のProducerタスクを起動
pub fn spawn_producers<S, C, R>(
    source: Arc<S>,
    queue: Arc<RecordQueue>,
    config: Arc<C>,
    reporter: Arc<R>,
    stats: Arc<RelayStats>,
    producer_count: usize,
) -> Vec<tokio::task::JoinHandle<Result<()>>>
where
    S: DataSource + 'static,
    C: RelayConfig + 'static,
    R: ProgressReporter + 'static,
{
    let mut handles = Vec::new();
    for producer_id in 0..producer_count {
        let handle = spawn_producer(
            producer_id,
            Arc::clone(&source),
            Arc::clone(&queue),
            Arc::clone(&config),
            Arc::clone(&reporter),
            Arc::clone(&stats),
        );
        handles.push(handle);
    }
    handles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SourceError;
    use crate::core::traits::MockDataSource;
    use crate::services::config::DefaultRelayConfig;
    use crate::services::monitoring::NoOpProgressReporter;
    use crate::services::source::SimulatedDataSource;
    use std::time::Duration;

    fn test_config() -> DefaultRelayConfig {
        DefaultRelayConfig::default().with_source_retry_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_producer_sends_all_records() {
        let queue = Arc::new(RecordQueue::unbounded());
        let stats = Arc::new(RelayStats::new());
        let config = test_config().with_records_per_producer(3);

        let handle = spawn_producer(
            0,
            Arc::new(SimulatedDataSource::new()),
            Arc::clone(&queue),
            Arc::new(config),
            Arc::new(NoOpProgressReporter::new()),
            Arc::clone(&stats),
        );

        handle.await.unwrap().unwrap();

        assert_eq!(queue.len().await, 3);
        assert_eq!(stats.produced(), 3);
        assert_eq!(stats.source_errors(), 0);
    }

    #[tokio::test]
    async fn test_producer_retries_after_source_error() {
        let mut source = MockDataSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(SourceError::unavailable("まだ準備できていません")));
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(b"data".to_vec()));

        let queue = Arc::new(RecordQueue::unbounded());
        let stats = Arc::new(RelayStats::new());
        let config = test_config().with_records_per_producer(1);

        let handle = spawn_producer(
            0,
            Arc::new(source),
            Arc::clone(&queue),
            Arc::new(config),
            Arc::new(NoOpProgressReporter::new()),
            Arc::clone(&stats),
        );

        handle.await.unwrap().unwrap();

        // 失敗は致命的ではなく、再試行で1件生産されている
        assert_eq!(stats.source_errors(), 1);
        assert_eq!(stats.produced(), 1);
        assert_eq!(queue.pop().await.unwrap().payload(), b"data");
    }

    #[tokio::test]
    async fn test_producer_skips_empty_fetch() {
        let mut source = MockDataSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(Vec::new()));
        source
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(b"ready".to_vec()));

        let queue = Arc::new(RecordQueue::unbounded());
        let stats = Arc::new(RelayStats::new());
        let config = test_config().with_records_per_producer(1);

        let handle = spawn_producer(
            0,
            Arc::new(source),
            Arc::clone(&queue),
            Arc::new(config),
            Arc::new(NoOpProgressReporter::new()),
            Arc::clone(&stats),
        );

        handle.await.unwrap().unwrap();

        // 空読みはエラーでも生産でもない
        assert_eq!(stats.source_errors(), 0);
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn test_producer_stops_on_closed_queue() {
        let source = MockDataSource::new(); // fetchは一度も呼ばれない

        let queue = Arc::new(RecordQueue::unbounded());
        queue.close().await;
        let stats = Arc::new(RelayStats::new());

        let handle = spawn_producer(
            0,
            Arc::new(source),
            Arc::clone(&queue),
            Arc::new(test_config()),
            Arc::new(NoOpProgressReporter::new()),
            Arc::clone(&stats),
        );

        // 閉鎖済みキューを観測して正常終了する
        handle.await.unwrap().unwrap();
        assert_eq!(stats.produced(), 0);
    }

    #[tokio::test]
    async fn test_producer_truncates_to_record_max_bytes() {
        let mut source = MockDataSource::new();
        source
            .expect_fetch()
            .returning(|_| Ok(vec![0x61u8; 64])); // 上限を超える長さを返すソース

        let queue = Arc::new(RecordQueue::unbounded());
        let stats = Arc::new(RelayStats::new());
        let config = test_config()
            .with_record_max_bytes(20)
            .with_records_per_producer(1);

        let handle = spawn_producer(
            0,
            Arc::new(source),
            Arc::clone(&queue),
            Arc::new(config),
            Arc::new(NoOpProgressReporter::new()),
            Arc::clone(&stats),
        );

        handle.await.unwrap().unwrap();

        let record = queue.pop().await.unwrap();
        assert_eq!(record.len(), 20);
    }

    #[tokio::test]
    async fn test_spawn_producers_starts_requested_count() {
        let queue = Arc::new(RecordQueue::unbounded());
        let stats = Arc::new(RelayStats::new());
        let config = test_config().with_records_per_producer(2);

        let handles = spawn_producers(
            Arc::new(SimulatedDataSource::new()),
            Arc::clone(&queue),
            Arc::new(config),
            Arc::new(NoOpProgressReporter::new()),
            Arc::clone(&stats),
            4,
        );

        assert_eq!(handles.len(), 4);
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(stats.produced(), 8);
        assert_eq!(queue.len().await, 8);
    }
}
