//! 파이프라인 코디네이터 -- 리스터 하나와 퍼블리셔 워커 N개를 연결합니다.
//!
//! # 내부 아키텍처
//! ```text
//!                                 ┌─▶ NotificationPublisher #0 ─┐
//! ObjectLister ─▶ mpsc(1000) ─────┼─▶ NotificationPublisher #1 ─┼─▶ NotificationSink
//!      │                          └─▶ NotificationPublisher #N ─┘
//!      ▼                                        │
//!   RunStats                               LatestError
//! ```
//!
//! 위치 문자열은 어떤 태스크도 시작하기 전에 검증합니다. 실행 중 보고된 에러 중
//! 마지막 것 하나만 반환되며, 실패한 실행에서도 실행 통계는 그 시점까지 누적된 값입니다.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use logreplay_core::metrics as m;
use logreplay_core::types::RunStats;

use crate::config::ReplayPipelineConfig;
use crate::error::{LatestError, ReplayError};
use crate::lister::{ListingOutcome, ObjectLister};
use crate::locator::Locator;
use crate::logtypes::{LogTypeApi, LogTypeClassifier};
use crate::publisher::{NotificationPublisher, SharedQueue, WorkerSummary};
use crate::sink::NotificationSink;
use crate::store::ObjectStore;

/// 레코드 큐 용량
pub const QUEUE_CAPACITY: usize = 1000;

/// 성공한 실행의 요약
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// 리스터 종료 사유
    pub listing: ListingOutcome,
    /// 발행된 알림 수
    pub published: u64,
    /// 실패한 워커가 버린 레코드 수
    pub discarded: u64,
    /// 실행 시간
    pub elapsed: Duration,
}

/// 재전송 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use std::sync::Arc;
/// use logreplay_pipeline::ReplayPipelineBuilder;
///
/// let pipeline = ReplayPipelineBuilder::new()
///     .config(config)
///     .store(Arc::new(store))
///     .sink(Arc::new(sink))
///     .classifier(Arc::new(classifier))
///     .build()?;
///
/// let stats = Arc::new(RunStats::new());
/// pipeline.run("s3://bucket/logs/", &stats).await?;
/// ```
pub struct ReplayPipeline<S, N, A> {
    config: ReplayPipelineConfig,
    store: Arc<S>,
    sink: Arc<N>,
    classifier: Arc<LogTypeClassifier<A>>,
}

impl<S, N, A> ReplayPipeline<S, N, A>
where
    S: ObjectStore,
    N: NotificationSink,
    A: LogTypeApi,
{
    /// 파이프라인 설정
    pub fn config(&self) -> &ReplayPipelineConfig {
        &self.config
    }

    /// 한 번의 재전송을 끝까지 실행합니다.
    ///
    /// # Errors
    ///
    /// - 위치 문자열이 잘못되면 태스크를 시작하지 않고 `ReplayError::Locator`
    /// - 그 외에는 실행 중 마지막으로 보고된 에러
    pub async fn run(&self, locator: &str, stats: &Arc<RunStats>) -> Result<RunSummary, ReplayError> {
        let locator = Locator::parse(locator)?;
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "replay",
            run_id = %run_id,
            bucket = %locator.bucket(),
            prefix = %locator.prefix()
        );

        self.run_inner(locator, Arc::clone(stats)).instrument(span).await
    }

    async fn run_inner(&self, locator: Locator, stats: Arc<RunStats>) -> Result<RunSummary, ReplayError> {
        let started = Instant::now();
        let errors = Arc::new(LatestError::new());
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let queue: SharedQueue = Arc::new(Mutex::new(rx));
        let topic_arn: Arc<str> = Arc::from(self.config.topic_arn.as_str());
        let classifier = self
            .config
            .attributes
            .then(|| Arc::clone(&self.classifier));

        info!(
            topic_arn = %topic_arn,
            workers = self.config.concurrency,
            attributes = self.config.attributes,
            limit = self.config.limit,
            "starting replay"
        );

        let mut workers = Vec::with_capacity(self.config.concurrency);
        for worker_id in 0..self.config.concurrency {
            let publisher = NotificationPublisher::new(
                worker_id,
                Arc::clone(&self.sink),
                classifier.clone(),
                Arc::clone(&topic_arn),
                Arc::clone(&errors),
            );
            workers.push(tokio::spawn(
                publisher.run(Arc::clone(&queue)).in_current_span(),
            ));
        }
        // 워커가 모두 끝나면 수신 측이 닫히도록 코디네이터의 참조는 놓음
        drop(queue);

        let lister = ObjectLister::new(
            Arc::clone(&self.store),
            locator.bucket(),
            locator.prefix(),
            self.config.limit,
            Arc::clone(&stats),
            Arc::clone(&errors),
        );
        let lister = tokio::spawn(lister.run(tx).in_current_span());

        let listing = match lister.await {
            Ok(outcome) => outcome,
            Err(e) => {
                errors.record(ReplayError::Task(format!("lister task failed: {e}")));
                ListingOutcome::Failed
            }
        };

        let mut total = WorkerSummary::default();
        for (worker_id, handle) in workers.into_iter().enumerate() {
            match handle.await {
                Ok(summary) => {
                    total.published += summary.published;
                    total.discarded += summary.discarded;
                }
                Err(e) => {
                    errors.record(ReplayError::Task(format!("worker {worker_id} failed: {e}")));
                }
            }
        }

        let elapsed = started.elapsed();
        metrics::histogram!(m::REPLAY_RUN_DURATION_SECONDS).record(elapsed.as_secs_f64());

        let reported = errors.reported();
        match errors.take() {
            Some(err) => {
                warn!(
                    objects = stats.objects(),
                    bytes = stats.bytes(),
                    published = total.published,
                    errors = reported,
                    error = %err,
                    "replay finished with errors"
                );
                Err(err)
            }
            None => {
                info!(
                    objects = stats.objects(),
                    bytes = stats.bytes(),
                    published = total.published,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "replay finished"
                );
                Ok(RunSummary {
                    listing,
                    published: total.published,
                    discarded: total.discarded,
                    elapsed,
                })
            }
        }
    }
}

/// 파이프라인 빌더
pub struct ReplayPipelineBuilder<S, N, A> {
    config: Option<ReplayPipelineConfig>,
    store: Option<Arc<S>>,
    sink: Option<Arc<N>>,
    classifier: Option<Arc<LogTypeClassifier<A>>>,
}

impl<S, N, A> Default for ReplayPipelineBuilder<S, N, A> {
    fn default() -> Self {
        Self {
            config: None,
            store: None,
            sink: None,
            classifier: None,
        }
    }
}

impl<S, N, A> ReplayPipelineBuilder<S, N, A>
where
    S: ObjectStore,
    N: NotificationSink,
    A: LogTypeApi,
{
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: ReplayPipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 목록 조회 서비스를 지정합니다.
    pub fn store(mut self, store: Arc<S>) -> Self {
        self.store = Some(store);
        self
    }

    /// 발행 대상을 지정합니다.
    pub fn sink(mut self, sink: Arc<N>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 로그 유형 분류기를 지정합니다. 같은 인스턴스를 여러 실행이 공유할 수 있습니다.
    pub fn classifier(mut self, classifier: Arc<LogTypeClassifier<A>>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// 구성 요소를 검증하고 파이프라인을 생성합니다.
    pub fn build(self) -> Result<ReplayPipeline<S, N, A>, ReplayError> {
        let missing = |field: &str| ReplayError::Config {
            field: field.to_owned(),
            reason: "must be provided to the pipeline builder".to_owned(),
        };

        let config = self.config.ok_or_else(|| missing("config"))?;
        config.validate()?;

        Ok(ReplayPipeline {
            config,
            store: self.store.ok_or_else(|| missing("store"))?,
            sink: self.sink.ok_or_else(|| missing("sink"))?,
            classifier: self.classifier.ok_or_else(|| missing("classifier"))?,
        })
    }
}
