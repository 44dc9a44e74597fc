//! 재전송 파이프라인 설정
//!
//! [`ReplayPipelineConfig`]는 core의 [`LogReplayConfig`]에서 파생됩니다.
//! 토픽 이름은 이 단계에서 ARN으로 확정됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use logreplay_core::config::LogReplayConfig;
//! use logreplay_pipeline::config::ReplayPipelineConfig;
//!
//! let core_config = LogReplayConfig::from_env()?;
//! let config = ReplayPipelineConfig::from_core(&core_config)?;
//! ```

use serde::{Deserialize, Serialize};

use logreplay_core::config::{LogReplayConfig, MAX_CONCURRENCY};

use crate::error::ReplayError;
use crate::sink::resolve_topic_arn;

/// 재전송 파이프라인 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayPipelineConfig {
    /// 발행 대상 토픽 ARN
    pub topic_arn: String,
    /// 로그 유형 분류 속성 첨부 여부
    pub attributes: bool,
    /// 퍼블리셔 워커 수
    pub concurrency: usize,
    /// 최대 객체 수 (0이면 무제한)
    pub limit: u64,
}

impl Default for ReplayPipelineConfig {
    fn default() -> Self {
        Self {
            topic_arn: String::new(),
            attributes: false,
            concurrency: 50,
            limit: 0,
        }
    }
}

impl ReplayPipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    ///
    /// 토픽이 ARN이 아니면 `aws.region`과 `aws.account_id`로 ARN을 만듭니다.
    pub fn from_core(core: &LogReplayConfig) -> Result<Self, ReplayError> {
        let topic_arn = resolve_topic_arn(
            &core.replay.topic,
            &core.aws.region,
            &core.aws.account_id,
        )?;

        let config = Self {
            topic_arn,
            attributes: core.replay.attributes,
            concurrency: core.replay.concurrency,
            limit: core.replay.limit,
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.topic_arn.is_empty() {
            return Err(ReplayError::Config {
                field: "topic_arn".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if !self.topic_arn.starts_with("arn:") {
            return Err(ReplayError::Config {
                field: "topic_arn".to_owned(),
                reason: format!("'{}' is not an ARN", self.topic_arn),
            });
        }

        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(ReplayError::Config {
                field: "concurrency".to_owned(),
                reason: format!("must be 1-{}", MAX_CONCURRENCY),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct ReplayPipelineConfigBuilder {
    config: ReplayPipelineConfig,
}

impl ReplayPipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 토픽 ARN을 설정합니다.
    pub fn topic_arn(mut self, arn: impl Into<String>) -> Self {
        self.config.topic_arn = arn.into();
        self
    }

    /// 속성 첨부 여부를 설정합니다.
    pub fn attributes(mut self, enabled: bool) -> Self {
        self.config.attributes = enabled;
        self
    }

    /// 워커 수를 설정합니다.
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.config.concurrency = workers;
        self
    }

    /// 최대 객체 수를 설정합니다.
    pub fn limit(mut self, limit: u64) -> Self {
        self.config.limit = limit;
        self
    }

    /// 설정을 검증하고 `ReplayPipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<ReplayPipelineConfig, ReplayError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
