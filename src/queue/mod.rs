// Queue Core - 生産者と消費者の受け渡しを仲介する同期FIFOキュー
// リスト本体と件数を単一のクリティカルセクションで守り、
// 待機/起床はそのロックの上に重ねたNotifyで行う

use crate::core::types::Record;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

/// pushの失敗型
///
/// いずれの場合もレコードの所有権を呼び出し側へ返却する。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PushError {
    /// キューは閉鎖済み（シャットダウン時の正常な制御シグナル）
    #[error("キューは閉じられています")]
    Closed(Record),

    /// 容量上限に達している（try_pushのみ）
    #[error("キューが満杯です")]
    Full(Record),

    /// 空き待ちがタイムアウトした（push_timeoutのみ）
    #[error("空き待ちがタイムアウトしました")]
    Timeout(Record),
}

impl PushError {
    /// 失敗したpushからレコードの所有権を取り戻す
    pub fn into_record(self) -> Record {
        match self {
            Self::Closed(record) | Self::Full(record) | Self::Timeout(record) => record,
        }
    }
}

/// popの失敗型
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// キューは閉鎖済みで、残存レコードもない
    #[error("キューは閉じられており、レコードも残っていません")]
    Closed,

    /// レコード待ちがタイムアウトした（pop_timeoutのみ）
    #[error("レコード待ちがタイムアウトしました")]
    Timeout,
}

/// ロック1つで守られるキュー内部状態
///
/// レコード列と件数は同一のデータ（VecDeque）なので、
/// 「件数とリストの食い違い」は構造的に起こりえない。
#[derive(Debug)]
struct QueueState {
    records: VecDeque<Record>,
    closed: bool,
}

/// 同期FIFOキュー
///
/// 同期機構はすべて内部に閉じており、利用側はpush/pop/closeだけを使う。
/// 待機するタスクはロックを保持したまま通知登録（enable）を済ませて
/// から眠るため、登録とpushの間に通知を取りこぼす隙間がない。
#[derive(Debug)]
pub struct RecordQueue {
    state: Mutex<QueueState>,
    /// レコード到着を待つconsumer向けシグナル
    records_available: Notify,
    /// 空き容量を待つproducer向けシグナル（容量制限時のみ使用）
    space_available: Notify,
    capacity: Option<usize>,
}

impl RecordQueue {
    /// 容量無制限のキューを作成
    pub fn unbounded() -> Self {
        Self::with_capacity(None)
    }

    /// キューを作成（Noneで容量無制限）
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                records: VecDeque::new(),
                closed: false,
            }),
            records_available: Notify::new(),
            space_available: Notify::new(),
            capacity,
        }
    }

    /// レコードを末尾に追加する
    ///
    /// 容量制限があり満杯の場合は空きが出るまで待機する。
    /// クローズ後はPushError::Closedでレコードを返却する。
    pub async fn push(&self, record: Record) -> Result<(), PushError> {
        self.push_inner(record, None).await
    }

    /// 期限つきでレコードを追加する
    ///
    /// 期限までに空きが出なければPushError::Timeoutでレコードを
    /// 返却する。タイムアウト時にキューの状態は変化しない。
    pub async fn push_timeout(&self, record: Record, timeout: Duration) -> Result<(), PushError> {
        self.push_inner(record, Some(Instant::now() + timeout)).await
    }

    /// 空き待ちをせずにレコードの追加を試みる
    pub async fn try_push(&self, record: Record) -> Result<(), PushError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(PushError::Closed(record));
        }
        if self.is_full(&state) {
            return Err(PushError::Full(record));
        }
        state.records.push_back(record);
        drop(state);
        self.records_available.notify_one();
        Ok(())
    }

    async fn push_inner(
        &self,
        record: Record,
        deadline: Option<Instant>,
    ) -> Result<(), PushError> {
        loop {
            let waiter = self.space_available.notified();
            tokio::pin!(waiter);
            {
                let mut state = self.state.lock().await;
                if state.closed {
                    return Err(PushError::Closed(record));
                }
                if !self.is_full(&state) {
                    state.records.push_back(record);
                    drop(state);
                    // 変更を確定してロックを手放してから1タスクだけ起こす
                    self.records_available.notify_one();
                    return Ok(());
                }
                // 満杯: ロック保持中に待機登録してから眠る
                waiter.as_mut().enable();
            }
            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, waiter).await.is_err() {
                        return Err(PushError::Timeout(record));
                    }
                }
                None => waiter.await,
            }
        }
    }

    /// 先頭レコードを取り出す
    ///
    /// キューが空の間は待機する。PopError::Closedを返すのは
    /// クローズ済みかつ空の場合だけで、クローズ後も残存レコードは
    /// 先に取り出せる（閉じてから処理し切る）。
    pub async fn pop(&self) -> Result<Record, PopError> {
        self.pop_inner(None).await
    }

    /// 期限つきで先頭レコードを取り出す
    pub async fn pop_timeout(&self, timeout: Duration) -> Result<Record, PopError> {
        self.pop_inner(Some(Instant::now() + timeout)).await
    }

    async fn pop_inner(&self, deadline: Option<Instant>) -> Result<Record, PopError> {
        loop {
            let waiter = self.records_available.notified();
            tokio::pin!(waiter);
            {
                let mut state = self.state.lock().await;
                if let Some(record) = state.records.pop_front() {
                    drop(state);
                    if self.capacity.is_some() {
                        self.space_available.notify_one();
                    }
                    return Ok(record);
                }
                if state.closed {
                    return Err(PopError::Closed);
                }
                waiter.as_mut().enable();
            }
            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, waiter).await.is_err() {
                        return Err(PopError::Timeout);
                    }
                }
                None => waiter.await,
            }
        }
    }

    /// キューを閉じる（冪等）
    ///
    /// 以後のpushは拒否される。待機中のpop/push呼び出しは全て起床し、
    /// それぞれ閉鎖を観測できる。
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);
        self.records_available.notify_waiters();
        self.space_available.notify_waiters();
    }

    /// 未処理のバックログを全て破棄し、破棄件数を返す
    pub async fn discard_pending(&self) -> usize {
        let mut state = self.state.lock().await;
        let discarded = state.records.len();
        state.records.clear();
        drop(state);
        if self.capacity.is_some() {
            self.space_available.notify_waiters();
        }
        discarded
    }

    /// 現在の滞留レコード数
    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    /// キューが空かどうか
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }

    /// キューが閉鎖済みかどうか
    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }

    /// 容量上限（Noneで無制限）
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn is_full(&self, state: &QueueState) -> bool {
        self.capacity
            .map_or(false, |capacity| state.records.len() >= capacity)
    }
}
