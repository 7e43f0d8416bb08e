pub mod cli;
pub mod core;
pub mod engine;
pub mod queue;
pub mod services;

// 主要APIの再エクスポート
pub use crate::core::{
    DataSource, ErrorSeverity, ProcessError, ProgressReporter, Record, RecordProcessor,
    RelayConfig, RelayError, RelayResult, RelaySummary, SourceError,
};
pub use crate::engine::{PoolState, PoolSupervisor, RelayEngine, RelayStats};
pub use crate::queue::{PopError, PushError, RecordQueue};
