//! logreplay 공통 크레이트
//!
//! 저장소 객체를 수집 알림으로 재전송하는 도구의 구성요소들이 공유하는
//! 도메인 타입, 에러, 설정, 메트릭 이름을 제공합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: `logreplay.toml` 파싱과 환경변수 오버라이드
//! - [`error`]: 최상위 에러 타입
//! - [`metrics`]: 메트릭 이름 상수와 설명 등록
//! - [`types`]: 객체 레코드, 실행 통계, 데이터 유형

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, LogReplayError, PipelineError};

// 설정
pub use config::LogReplayConfig;

// 도메인 타입
pub use types::{DataType, ObjectRecord, RunStats, StatsSnapshot, partition_name};
