// 外部データソースの具象実装

use crate::core::error::SourceError;
use crate::core::DataSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;

/// シミュレーション用の固定ペイロード
const SIMULATED_PAYLOAD: &[u8] = b"abcdefghijlmnopqrstu";

/// シミュレーションデータソース
///
/// 固定のアルファベット列を返す。デバイス未接続の環境での
/// 動作確認とテストに使う。
#[derive(Debug, Default, Clone)]
pub struct SimulatedDataSource {
    fetch_delay: Option<Duration>,
}

impl SimulatedDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 読み込みごとに遅延を挟む（デバイスのレイテンシを模擬）
    pub fn with_fetch_delay(delay: Duration) -> Self {
        Self {
            fetch_delay: Some(delay),
        }
    }
}

#[async_trait]
impl DataSource for SimulatedDataSource {
    async fn fetch(&self, max_bytes: usize) -> Result<Vec<u8>, SourceError> {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        let length = SIMULATED_PAYLOAD.len().min(max_bytes);
        Ok(SIMULATED_PAYLOAD[..length].to_vec())
    }
}

/// デバイス読み込みデータソース
///
/// キャラクタデバイスや通常ファイルからmax_bytesを上限に読み込む。
/// 読み込みごとにopenし直すため、途中からの差し替えにも追従する。
#[derive(Debug, Clone)]
pub struct DeviceDataSource {
    device_path: PathBuf,
}

impl DeviceDataSource {
    pub fn new(device_path: impl Into<PathBuf>) -> Self {
        Self {
            device_path: device_path.into(),
        }
    }

    pub fn device_path(&self) -> &Path {
        &self.device_path
    }
}

#[async_trait]
impl DataSource for DeviceDataSource {
    async fn fetch(&self, max_bytes: usize) -> Result<Vec<u8>, SourceError> {
        let mut device = tokio::fs::File::open(&self.device_path).await?;
        let mut buffer = vec![0u8; max_bytes];
        let read_bytes = device.read(&mut buffer).await?;
        buffer.truncate(read_bytes);
        Ok(buffer)
    }
}
