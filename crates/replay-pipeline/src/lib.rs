#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`locator`]: `s3://bucket/prefix` 위치 문자열 파싱
//! - [`store`]: 페이지 단위 객체 목록 조회 서비스 (S3 구현 포함)
//! - [`lister`]: 단일 생산자 리스터 (필터링, 한도, 실행 통계)
//! - [`logtypes`]: 로그 유형 조회 서비스와 캐시된 분류기
//! - [`notification`]: 합성 S3 생성 알림
//! - [`sink`]: 알림 발행 대상 (SNS 구현 포함)
//! - [`publisher`]: 큐를 소비하는 퍼블리셔 워커
//! - [`pipeline`]: 리스터와 워커를 묶는 코디네이터
//! - [`aws`]: AWS SDK 클라이언트 구성
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! Locator -> ObjectLister -> queue -> NotificationPublisher x N -> NotificationSink
//!               |                          |
//!           ObjectStore             LogTypeClassifier
//! ```

pub mod aws;
pub mod config;
pub mod error;
pub mod pipeline;

pub mod lister;
pub mod locator;
pub mod logtypes;
pub mod notification;
pub mod publisher;
pub mod sink;
pub mod store;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{QUEUE_CAPACITY, ReplayPipeline, ReplayPipelineBuilder, RunSummary};

// 설정
pub use config::{ReplayPipelineConfig, ReplayPipelineConfigBuilder};

// 에러
pub use error::{LatestError, ReplayError};

// 위치
pub use locator::Locator;

// 외부 서비스
pub use logtypes::{LambdaLogTypeApi, LogTypeApi, LogTypeClassifier};
pub use sink::{MessageAttributes, NotificationSink, SnsNotificationSink, resolve_topic_arn};
pub use store::{ListedObject, ObjectPage, ObjectStore, S3ObjectStore};

// 리스터 / 워커
pub use lister::{ListingOutcome, ObjectLister};
pub use notification::S3Notification;
pub use publisher::{NotificationPublisher, WorkerSummary};
