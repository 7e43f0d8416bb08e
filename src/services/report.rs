// 実行サマリーのJSON出力機能

use crate::core::types::RelaySummary;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// 実行サマリーをJSONファイルへ書き出すライター
///
/// 書き出すのは実行結果の統計のみで、レコード本体は永続化しない。
#[derive(Debug, Clone)]
pub struct JsonSummaryWriter {
    output_path: PathBuf,
}

impl JsonSummaryWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// サマリーをタイムスタンプつきで書き出す
    pub async fn write(&self, summary: &RelaySummary) -> Result<()> {
        let report = serde_json::json!({
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "summary": summary,
        });
        let body = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(&self.output_path, body).await?;
        Ok(())
    }
}
