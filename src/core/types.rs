// 中継処理に関連するデータ型定義

use std::sync::atomic::{AtomicU64, Ordering};

/// Recordのシーケンス番号採番カウンタ（プロセス全体で一意）
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// 生産者から消費者へ流れる1件分のデータレコード
///
/// 構築後は不変。所有権はproducer→キュー→consumerへちょうど1回ずつ
/// 移動し、Cloneを実装しないことで複製経路を持たない。
#[derive(Debug, PartialEq, Eq)]
pub struct Record {
    sequence: u64,
    payload: Vec<u8>,
}

impl Record {
    /// 新しいレコードを作成（シーケンス番号は自動採番）
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            payload,
        }
    }

    /// 一意なシーケンス番号を取得
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// ペイロード長（バイト数）を取得
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// ペイロードが空かどうか
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// ペイロードへの参照を取得
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// ペイロードの所有権を取り出す（レコードは消費される）
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// 中継処理全体のサマリー
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RelaySummary {
    pub producer_count: usize,
    pub consumer_count: usize,
    pub produced_records: usize,
    pub processed_records: usize,
    pub source_errors: usize,
    pub process_errors: usize,
    pub discarded_records: usize,
    pub total_time_ms: u64,
    pub average_time_per_record_ms: f64,
}
