//! 재전송 파이프라인 에러 타입
//!
//! [`ReplayError`]는 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<ReplayError> for LogReplayError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! [`LatestError`]는 여러 태스크가 보고한 에러 중 마지막 것만 보관하는 셀입니다.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use logreplay_core::error::{ConfigError, LogReplayError, PipelineError};

/// 재전송 파이프라인 도메인 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    /// 위치 문자열 파싱 실패
    #[error("malformed locator '{locator}': {reason}")]
    Locator {
        /// 입력된 위치 문자열
        locator: String,
        /// 실패 사유
        reason: String,
    },

    /// 목록 조회 서비스 실패
    #[error("listing failed for s3://{bucket}/{prefix}: {reason}")]
    Listing {
        /// 버킷 이름
        bucket: String,
        /// 조회 접두어
        prefix: String,
        /// 실패 사유
        reason: String,
    },

    /// 로그 유형 분류 실패
    #[error("cannot derive log type from '{key}': {reason}")]
    Classification {
        /// 객체 키
        key: String,
        /// 실패 사유
        reason: String,
    },

    /// 로그 유형 조회 서비스 실패 (호출 에러 또는 애플리케이션 에러)
    #[error("log type lookup via '{function}' failed: {reason}")]
    Lookup {
        /// 호출한 함수 이름
        function: String,
        /// 실패 사유
        reason: String,
    },

    /// 알림 직렬화 실패
    #[error("failed to serialize notification for '{key}': {reason}")]
    Serialization {
        /// 객체 키
        key: String,
        /// 실패 사유
        reason: String,
    },

    /// 알림 발행 실패
    #[error("failed to publish notification for '{key}' to {topic_arn}: {reason}")]
    Publish {
        /// 객체 키
        key: String,
        /// 대상 토픽 ARN
        topic_arn: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 태스크 실행 에러 (패닉, 채널 단절)
    #[error("task error: {0}")]
    Task(String),
}

impl ReplayError {
    /// 메트릭 레이블에 쓰는 실패 단계 이름
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Locator { .. } | Self::Config { .. } => "config",
            Self::Listing { .. } => "listing",
            Self::Classification { .. } | Self::Lookup { .. } => "classify",
            Self::Serialization { .. } => "serialize",
            Self::Publish { .. } => "publish",
            Self::Task(_) => "task",
        }
    }
}

impl From<ReplayError> for LogReplayError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::Locator { .. } => {
                LogReplayError::Pipeline(PipelineError::Locator(err.to_string()))
            }
            ReplayError::Config { field, reason } => {
                LogReplayError::Config(ConfigError::InvalidValue { field, reason })
            }
            other => LogReplayError::Pipeline(PipelineError::RunFailed(other.to_string())),
        }
    }
}

/// 마지막으로 보고된 에러를 보관하는 셀
///
/// 리스터와 워커가 직접 기록합니다. 나중에 기록된 에러가 이전 것을 덮어쓰며,
/// 보고된 총 건수는 따로 셉니다.
#[derive(Debug, Default)]
pub struct LatestError {
    slot: Mutex<Option<ReplayError>>,
    reported: AtomicU64,
}

impl LatestError {
    /// 빈 셀을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 에러를 기록합니다 (마지막 기록이 우선).
    pub fn record(&self, err: ReplayError) {
        self.reported.fetch_add(1, Ordering::Relaxed);
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(err);
    }

    /// 지금까지 보고된 에러 수
    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }

    /// 보관 중인 에러를 꺼냅니다.
    pub fn take(&self) -> Option<ReplayError> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}
