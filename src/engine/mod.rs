// エンジン層 - タスクプールとオーケストレーション
// Queue Coreとサービス層を組み合わせて高レベルな処理を提供

pub mod consumer;
pub mod producer;
pub mod relay_engine;
pub mod supervisor;

// 公開API - 主要エンジンクラス
pub use relay_engine::RelayEngine;
pub use supervisor::{PoolState, PoolSupervisor, RelayStats};
