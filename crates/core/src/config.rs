//! 설정 관리 -- logreplay.toml 파싱 및 런타임 설정
//!
//! [`LogReplayConfig`]는 CLI와 파이프라인이 공유하는 최상위 설정 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGREPLAY_REPLAY_CONCURRENCY=20` 형식)
//! 3. 설정 파일 (`logreplay.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logreplay_core::error::LogReplayError> {
//! use logreplay_core::config::LogReplayConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogReplayConfig::load("logreplay.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogReplayConfig::parse("[replay]\nconcurrency = 20")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogReplayError};

/// 워커 동시성 상한
pub const MAX_CONCURRENCY: usize = 1000;

/// logreplay 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogReplayConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// AWS 접속 설정
    #[serde(default)]
    pub aws: AwsConfig,
    /// 재전송 실행 설정
    #[serde(default)]
    pub replay: ReplayConfig,
    /// 로그 유형 조회 서비스 설정
    #[serde(default)]
    pub log_types: LogTypesConfig,
}

impl LogReplayConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogReplayError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 기본값에 환경변수 오버라이드만 적용한 설정을 반환합니다.
    ///
    /// 설정 파일 없이 CLI 인자만으로 실행할 때 사용합니다.
    pub fn from_env() -> Result<Self, LogReplayError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogReplayError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogReplayError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogReplayError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogReplayError> {
        toml::from_str(toml_str).map_err(|e| {
            LogReplayError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGREPLAY_{SECTION}_{FIELD}`
    /// 예: `LOGREPLAY_AWS_REGION=eu-west-1`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGREPLAY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGREPLAY_GENERAL_LOG_FORMAT");

        // AWS
        override_string(&mut self.aws.region, "LOGREPLAY_AWS_REGION");
        override_string(&mut self.aws.s3_region, "LOGREPLAY_AWS_S3_REGION");
        override_string(&mut self.aws.account_id, "LOGREPLAY_AWS_ACCOUNT_ID");
        override_string(&mut self.aws.endpoint_url, "LOGREPLAY_AWS_ENDPOINT_URL");
        override_string(&mut self.aws.profile, "LOGREPLAY_AWS_PROFILE");

        // Replay
        override_string(&mut self.replay.topic, "LOGREPLAY_REPLAY_TOPIC");
        override_bool(&mut self.replay.attributes, "LOGREPLAY_REPLAY_ATTRIBUTES");
        override_usize(
            &mut self.replay.concurrency,
            "LOGREPLAY_REPLAY_CONCURRENCY",
        );
        override_u64(&mut self.replay.limit, "LOGREPLAY_REPLAY_LIMIT");

        // Log types
        override_string(
            &mut self.log_types.function_name,
            "LOGREPLAY_LOG_TYPES_FUNCTION_NAME",
        );
        override_string(&mut self.log_types.method, "LOGREPLAY_LOG_TYPES_METHOD");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogReplayError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.replay.concurrency == 0 || self.replay.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidValue {
                field: "replay.concurrency".to_owned(),
                reason: format!("must be 1-{}", MAX_CONCURRENCY),
            }
            .into());
        }

        // account_id는 비어 있거나 12자리 숫자
        if !self.aws.account_id.is_empty()
            && (self.aws.account_id.len() != 12
                || !self.aws.account_id.chars().all(|c| c.is_ascii_digit()))
        {
            return Err(ConfigError::InvalidValue {
                field: "aws.account_id".to_owned(),
                reason: "must be a 12-digit AWS account id".to_owned(),
            }
            .into());
        }

        if self.log_types.function_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_types.function_name".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.log_types.method.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_types.method".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// AWS 접속 설정
///
/// 빈 문자열은 "지정하지 않음"을 뜻하며 SDK 기본 체인을 따릅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// SNS/Lambda 리전
    pub region: String,
    /// S3 버킷 리전 (비어 있으면 `region` 사용)
    pub s3_region: String,
    /// 토픽 ARN 생성에 쓰는 계정 ID
    pub account_id: String,
    /// 커스텀 엔드포인트 (LocalStack 등)
    pub endpoint_url: String,
    /// AWS 프로필 이름
    pub profile: String,
}

/// 재전송 실행 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// 발행 대상 토픽 (이름 또는 ARN)
    pub topic: String,
    /// 데이터 유형/로그 유형 메시지 속성 첨부 여부
    pub attributes: bool,
    /// 퍼블리셔 워커 수
    pub concurrency: usize,
    /// 최대 객체 수 (0 = 무제한)
    pub limit: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            attributes: false,
            concurrency: 50,
            limit: 0,
        }
    }
}

/// 로그 유형 조회 서비스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogTypesConfig {
    /// 호출할 Lambda 함수 이름
    pub function_name: String,
    /// 호출 메서드 이름 (페이로드 최상위 키)
    pub method: String,
}

impl Default for LogTypesConfig {
    fn default() -> Self {
        Self {
            function_name: "panther-logtypes-api".to_owned(),
            method: "listAvailableLogTypes".to_owned(),
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
