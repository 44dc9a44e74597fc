//! 알림 퍼블리셔 워커
//!
//! 여러 워커가 하나의 큐를 나눠 소비합니다. 각 레코드에 대해:
//!
//! ```text
//! recv -> (속성 사용 시) classify -> 알림 직렬화 -> publish
//! ```
//!
//! 한 번이라도 실패한 워커는 에러를 [`LatestError`]에 기록하고 `failed` 상태가 됩니다.
//! 이후에는 큐가 닫힐 때까지 레코드를 꺼내 버리기만 합니다. 다른 워커나 리스터는
//! 멈추지 않으며, 꺼내기를 계속하므로 가득 찬 큐 때문에 리스터가 막히지 않습니다.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info};

use logreplay_core::metrics as m;
use logreplay_core::types::{DataType, ObjectRecord};

use crate::error::{LatestError, ReplayError};
use crate::logtypes::{LogTypeApi, LogTypeClassifier};
use crate::notification::S3Notification;
use crate::sink::{MessageAttributes, NotificationSink, message_attributes};

/// 워커들이 공유하는 레코드 큐 수신 측
pub type SharedQueue = Arc<Mutex<mpsc::Receiver<ObjectRecord>>>;

/// 워커 종료 시 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    /// 발행에 성공한 레코드 수
    pub published: u64,
    /// 실패 이후 버린 레코드 수
    pub discarded: u64,
    /// 실패 여부
    pub failed: bool,
}

/// 큐를 소비해 알림을 발행하는 워커
pub struct NotificationPublisher<N, A> {
    worker_id: usize,
    sink: Arc<N>,
    /// 속성 사용 시에만 `Some`
    classifier: Option<Arc<LogTypeClassifier<A>>>,
    topic_arn: Arc<str>,
    errors: Arc<LatestError>,
}

impl<N: NotificationSink, A: LogTypeApi> NotificationPublisher<N, A> {
    /// 새 워커를 생성합니다.
    pub fn new(
        worker_id: usize,
        sink: Arc<N>,
        classifier: Option<Arc<LogTypeClassifier<A>>>,
        topic_arn: Arc<str>,
        errors: Arc<LatestError>,
    ) -> Self {
        Self {
            worker_id,
            sink,
            classifier,
            topic_arn,
            errors,
        }
    }

    /// 큐가 닫힐 때까지 소비합니다.
    pub async fn run(self, queue: SharedQueue) -> WorkerSummary {
        let mut summary = WorkerSummary::default();

        loop {
            let next = {
                let mut rx = queue.lock().await;
                rx.recv().await
            };
            let Some(record) = next else {
                break;
            };

            if summary.failed {
                summary.discarded += 1;
                metrics::counter!(m::PUBLISHER_DISCARDED_TOTAL).increment(1);
                continue;
            }

            match self.process(&record).await {
                Ok(()) => {
                    summary.published += 1;
                    metrics::counter!(m::PUBLISHER_NOTIFICATIONS_TOTAL).increment(1);
                    debug!(worker = self.worker_id, key = %record.key, size = record.size, "published");
                }
                Err(e) => {
                    error!(worker = self.worker_id, key = %record.key, error = %e, "worker failed; draining queue");
                    metrics::counter!(m::REPLAY_FAILURES_TOTAL, m::LABEL_STAGE => e.stage())
                        .increment(1);
                    self.errors.record(e);
                    summary.failed = true;
                }
            }
        }

        info!(
            worker = self.worker_id,
            published = summary.published,
            discarded = summary.discarded,
            failed = summary.failed,
            "worker finished"
        );
        summary
    }

    async fn process(&self, record: &ObjectRecord) -> Result<(), ReplayError> {
        let attributes = match &self.classifier {
            None => MessageAttributes::new(),
            Some(classifier) => {
                let data_type = DataType::from_key(&record.key).ok_or_else(|| {
                    ReplayError::Classification {
                        key: record.key.clone(),
                        reason: "unknown data type prefix".to_owned(),
                    }
                })?;
                let log_type = classifier.classify(&record.key).await?;
                message_attributes(data_type, &log_type)
            }
        };

        let message = S3Notification::for_record(record)
            .to_json()
            .map_err(|e| ReplayError::Serialization {
                key: record.key.clone(),
                reason: e.to_string(),
            })?;

        self.sink
            .publish(&self.topic_arn, &record.key, message, attributes)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ATTR_ID, ATTR_TYPE, MockSink};

    struct StaticApi(Vec<&'static str>);

    impl LogTypeApi for StaticApi {
        async fn list_available_log_types(&self) -> Result<Vec<String>, ReplayError> {
            Ok(self.0.iter().map(|s| (*s).to_owned()).collect())
        }
    }

    const TOPIC: &str = "arn:aws:sns:us-east-1:123456789012:t";

    fn queue_of(keys: &[&str]) -> SharedQueue {
        let (tx, rx) = mpsc::channel(keys.len().max(1));
        for key in keys {
            tx.try_send(ObjectRecord::new("b", *key, 1)).unwrap();
        }
        drop(tx);
        Arc::new(Mutex::new(rx))
    }

    fn worker(
        sink: Arc<MockSink>,
        classifier: Option<Arc<LogTypeClassifier<StaticApi>>>,
        errors: Arc<LatestError>,
    ) -> NotificationPublisher<MockSink, StaticApi> {
        NotificationPublisher::new(0, sink, classifier, Arc::from(TOPIC), errors)
    }

    #[tokio::test]
    async fn publishes_every_record_without_attributes() {
        let sink = Arc::new(MockSink::default());
        let errors = Arc::new(LatestError::new());

        let summary = worker(Arc::clone(&sink), None, Arc::clone(&errors))
            .run(queue_of(&["logs/a/1", "logs/a/2", "odd"]))
            .await;

        assert_eq!(summary.published, 3);
        assert!(!summary.failed);
        assert!(errors.take().is_none());
        let published = sink.published.lock().unwrap();
        assert!(published.iter().all(|(_, attrs)| attrs.is_empty()));
    }

    #[tokio::test]
    async fn attaches_type_and_id_when_classifying() {
        let sink = Arc::new(MockSink::default());
        let classifier = Arc::new(LogTypeClassifier::new(StaticApi(vec!["AWS.CloudTrail"])));

        let summary = worker(Arc::clone(&sink), Some(classifier), Arc::new(LatestError::new()))
            .run(queue_of(&["rules/aws_cloudtrail/f.json"]))
            .await;

        assert_eq!(summary.published, 1);
        let published = sink.published.lock().unwrap();
        let attrs = &published[0].1;
        assert_eq!(attrs[ATTR_TYPE], "RuleMatches");
        assert_eq!(attrs[ATTR_ID], "AWS.CloudTrail");
    }

    #[tokio::test]
    async fn publish_failure_drains_remaining_records() {
        let sink = Arc::new(MockSink::failing_on(&["logs/a/2"]));
        let errors = Arc::new(LatestError::new());

        let summary = worker(Arc::clone(&sink), None, Arc::clone(&errors))
            .run(queue_of(&["logs/a/1", "logs/a/2", "logs/a/3", "logs/a/4"]))
            .await;

        assert_eq!(summary.published, 1);
        assert_eq!(summary.discarded, 2);
        assert!(summary.failed);
        assert_eq!(sink.published_keys(), ["logs/a/1"]);
        assert!(matches!(errors.take(), Some(ReplayError::Publish { .. })));
    }

    #[tokio::test]
    async fn unknown_partition_fails_before_publish() {
        let sink = Arc::new(MockSink::default());
        let errors = Arc::new(LatestError::new());
        let classifier = Arc::new(LogTypeClassifier::new(StaticApi(vec!["AWS.CloudTrail"])));

        let summary = worker(Arc::clone(&sink), Some(classifier), Arc::clone(&errors))
            .run(queue_of(&["logs/unknownpartition/file.json"]))
            .await;

        assert_eq!(summary.published, 0);
        assert!(summary.failed);
        assert!(sink.published_keys().is_empty());
        let err = errors.take().unwrap();
        assert!(err.to_string().contains("cannot derive log type"));
    }

    #[tokio::test]
    async fn unknown_data_type_prefix_fails_classification() {
        let sink = Arc::new(MockSink::default());
        let errors = Arc::new(LatestError::new());
        let classifier = Arc::new(LogTypeClassifier::new(StaticApi(vec!["AWS.CloudTrail"])));

        worker(Arc::clone(&sink), Some(Arc::clone(&classifier)), Arc::clone(&errors))
            .run(queue_of(&["archive/aws_cloudtrail/f.json"]))
            .await;

        assert!(sink.published_keys().is_empty());
        let err = errors.take();
        assert!(matches!(err, Some(ReplayError::Classification { .. })));
        assert!(err.is_some_and(|e| e.to_string().contains("unknown data type prefix")));
        // 데이터 유형 판별이 먼저 실패하므로 원격 조회는 일어나지 않음
        assert!(!classifier.is_loaded());
    }
}
