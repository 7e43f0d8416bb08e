// Custom error types for the relay system
// 中継処理専用のカスタムエラー型定義

use thiserror::Error;

/// 外部ソース読み込みのエラー型
///
/// 1レコード分の取得失敗を表す。Producer Taskはこれを報告して
/// バックオフ後に再試行するため、プール全体には波及しない。
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("外部ソース入出力エラー: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("外部ソース利用不可: {message}")]
    Unavailable { message: String },
}

impl SourceError {
    /// ソース利用不可エラーの作成
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// レコード処理のエラー型
///
/// 1レコードの処理失敗を表す。Consumer Taskはこれを報告して
/// 次のレコードへ進む。
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("処理出力エラー: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("空のペイロードは処理できません")]
    EmptyPayload,

    #[error("不正なペイロード: {message}")]
    InvalidPayload { message: String },
}

impl ProcessError {
    /// 不正ペイロードエラーの作成
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }
}

/// 中継エンジン固有のエラー型
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("設定エラー: {message}")]
    ConfigurationError { message: String },

    #[error("プール状態エラー: {message} (現在の状態: {state})")]
    StateError { message: String, state: String },

    #[error("タスクエラー: {source}")]
    TaskError {
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("リソース不足エラー: {resource_type} - {details}")]
    ResourceExhaustionError {
        resource_type: String,
        details: String,
    },

    #[error("内部エラー: {source}")]
    InternalError {
        #[source]
        source: anyhow::Error,
    },
}

impl RelayError {
    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// プール状態エラーの作成
    pub fn state(message: impl Into<String>, state: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
            state: state.into(),
        }
    }

    /// タスクエラーの作成
    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::TaskError { source }
    }

    /// リソース不足エラーの作成
    pub fn resource_exhaustion(
        resource_type: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::ResourceExhaustionError {
            resource_type: resource_type.into(),
            details: details.into(),
        }
    }

    /// 内部エラーの作成
    pub fn internal(source: anyhow::Error) -> Self {
        Self::InternalError { source }
    }

    /// エラーの重要度を取得
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigurationError { .. } => ErrorSeverity::High,
            Self::StateError { .. } => ErrorSeverity::Critical,
            Self::TaskError { .. } => ErrorSeverity::Medium,
            Self::ResourceExhaustionError { .. } => ErrorSeverity::High,
            Self::InternalError { .. } => ErrorSeverity::Critical,
        }
    }

    /// エラーが回復可能かどうかを判定
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ConfigurationError { .. } => false,
            Self::StateError { .. } => false,
            Self::TaskError { .. } => true,
            Self::ResourceExhaustionError { .. } => true,
            Self::InternalError { .. } => false,
        }
    }
}

/// エラーの重要度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// 低重要度 - ログ出力程度
    Low,
    /// 中重要度 - 警告レベル
    Medium,
    /// 高重要度 - 要対応
    High,
    /// 致命的 - システム停止レベル
    Critical,
}

impl ErrorSeverity {
    /// 重要度の数値表現を取得
    pub const fn as_level(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// 重要度の文字列表現を取得
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// 中継処理の結果型
pub type RelayResult<T> = std::result::Result<T, RelayError>;

// From実装を個別に追加
impl From<anyhow::Error> for RelayError {
    fn from(error: anyhow::Error) -> Self {
        RelayError::InternalError { source: error }
    }
}

impl From<tokio::task::JoinError> for RelayError {
    fn from(error: tokio::task::JoinError) -> Self {
        RelayError::TaskError { source: error }
    }
}
