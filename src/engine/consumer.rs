// Consumer - 並列ワーカー機能

use crate::core::traits::{ProgressReporter, RecordProcessor};
use crate::engine::supervisor::RelayStats;
use crate::queue::RecordQueue;
use anyhow::Result;
use std::sync::Arc;

/// 単一Consumerワーカー: キューからレコードを取り出して処理する
///
/// popがこのタスク唯一の待機点であり、閉鎖済みかつ処理し切った
/// キューを観測した時点で終了する。
pub fn spawn_single_consumer<P, R>(
    consumer_id: usize,
    processor: Arc<P>,
    queue: Arc<RecordQueue>,
    reporter: Arc<R>,
    stats: Arc<RelayStats>,
) -> tokio::task::JoinHandle<Result<()>>
where
    P: RecordProcessor + 'static,
    R: ProgressReporter + 'static,
{
    tokio::spawn(async move {
        loop {
            let record = match queue.pop().await {
                Ok(record) => record,
                // クローズ済みかつバックログ処理完了
                Err(_) => break,
            };

            // 処理失敗はこの1件に閉じる: 報告して次のレコードへ進む
            match processor.process(record.payload()).await {
                Ok(()) => stats.add_processed(),
                Err(error) => {
                    stats.add_process_error();
                    reporter
                        .report_process_error(consumer_id, record.sequence(), &error)
                        .await;
                }
            }
            // recordはここでドロップされ、ペイロードが解放される
        }
        Ok(())
    })
}

/// Consumers: 設定された数のConsumerワーカーを起動
pub fn spawn_consumers<P, R>(
    processor: Arc<P>,
    queue: Arc<RecordQueue>,
    reporter: Arc<R>,
    stats: Arc<RelayStats>,
    consumer_count: usize,
) -> Vec<tokio::task::JoinHandle<Result<()>>>
where
    P: RecordProcessor + 'static,
    R: ProgressReporter + 'static,
{
    let mut handles = Vec::new();
    for consumer_id in 0..consumer_count {
        let handle = spawn_single_consumer(
            consumer_id,
            Arc::clone(&processor),
            Arc::clone(&queue),
            Arc::clone(&reporter),
            Arc::clone(&stats),
        );
        handles.push(handle);
    }
    handles
}
