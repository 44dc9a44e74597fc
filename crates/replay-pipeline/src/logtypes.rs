//! 로그 유형 분류기
//!
//! 객체 키의 두 번째 세그먼트(파티션 이름)를 선언된 로그 유형으로 변환합니다.
//! 파티션 -> 로그 유형 맵은 원격 조회 한 번으로 만들어 [`LogTypeClassifier`]
//! 인스턴스 수명 동안 캐시합니다.
//!
//! # 캐시 규칙
//! - 동시에 여러 워커가 처음 호출해도 원격 조회는 한 번만 실행됨 (single-flight)
//! - 조회가 실패하면 그 조회를 기다리던 호출자 모두가 같은 오류를 받음
//! - 실패한 조회가 끝난 뒤에 도착한 호출은 다시 조회함
//! - 한 번 채워진 캐시는 갱신하지 않음

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use logreplay_core::metrics as m;
use logreplay_core::types::partition_name;

use crate::error::ReplayError;

/// 선언된 로그 유형 전체를 돌려주는 원격 서비스
pub trait LogTypeApi: Send + Sync + 'static {
    /// 현재 선언된 로그 유형 이름 목록을 조회합니다.
    fn list_available_log_types(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, ReplayError>> + Send;
}

/// 로그 유형 API 응답 본문
#[derive(Debug, Deserialize)]
struct ListLogTypesResponse {
    #[serde(rename = "logTypes", default)]
    log_types: Vec<String>,
}

/// Lambda 함수 호출 기반 프로덕션 구현
///
/// 요청 본문은 `{"<method>": {}}`, 응답 본문은 `{"logTypes": [...]}` 입니다.
#[derive(Debug, Clone)]
pub struct LambdaLogTypeApi {
    client: aws_sdk_lambda::Client,
    function_name: String,
    method: String,
}

impl LambdaLogTypeApi {
    /// 새 API 클라이언트를 생성합니다.
    pub fn new(
        client: aws_sdk_lambda::Client,
        function_name: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            client,
            function_name: function_name.into(),
            method: method.into(),
        }
    }

    fn lookup_error(&self, reason: impl Into<String>) -> ReplayError {
        ReplayError::Lookup {
            function: self.function_name.clone(),
            reason: reason.into(),
        }
    }
}

impl LogTypeApi for LambdaLogTypeApi {
    async fn list_available_log_types(&self) -> Result<Vec<String>, ReplayError> {
        let mut request = serde_json::Map::new();
        request.insert(self.method.clone(), serde_json::Value::Object(serde_json::Map::new()));
        let body = serde_json::to_vec(&request).map_err(|e| self.lookup_error(e.to_string()))?;

        let resp = self
            .client
            .invoke()
            .function_name(&self.function_name)
            .payload(Blob::new(body))
            .send()
            .await
            .map_err(|e| self.lookup_error(DisplayErrorContext(&e).to_string()))?;

        let payload = resp.payload().map(|b| b.as_ref()).unwrap_or_default();

        if let Some(kind) = resp.function_error() {
            return Err(self.lookup_error(format!(
                "function error ({kind}): {}",
                String::from_utf8_lossy(payload)
            )));
        }

        let parsed: ListLogTypesResponse = serde_json::from_slice(payload)
            .map_err(|e| self.lookup_error(format!("invalid response body: {e}")))?;

        Ok(parsed.log_types)
    }
}

/// 키의 파티션 세그먼트를 반환합니다. 세그먼트가 2개 미만이면 `None`.
pub fn partition_of(key: &str) -> Option<&str> {
    key.split('/').nth(1)
}

/// 캐시를 가진 로그 유형 분류기
///
/// 워커들이 `Arc`로 공유합니다.
pub struct LogTypeClassifier<A> {
    api: A,
    table: OnceCell<HashMap<String, String>>,
    /// 조회 직렬화 락. 마지막 실패 오류를 보관
    fetch: Mutex<Option<ReplayError>>,
    /// 끝난 실패 조회 수 (세대 번호)
    failures: AtomicU64,
}

impl<A: LogTypeApi> LogTypeClassifier<A> {
    /// 빈 캐시로 분류기를 생성합니다.
    pub fn new(api: A) -> Self {
        Self {
            api,
            table: OnceCell::new(),
            fetch: Mutex::new(None),
            failures: AtomicU64::new(0),
        }
    }

    /// 내부 조회 서비스
    pub fn api(&self) -> &A {
        &self.api
    }

    /// 캐시가 채워졌는지 여부
    pub fn is_loaded(&self) -> bool {
        self.table.initialized()
    }

    /// 키를 로그 유형으로 분류합니다.
    ///
    /// # Errors
    ///
    /// 다음 경우 `ReplayError::Classification`을 반환합니다.
    /// - 키의 세그먼트가 2개 미만
    /// - 원격 조회 실패
    /// - 파티션이 맵에 없음
    pub async fn classify(&self, key: &str) -> Result<String, ReplayError> {
        let fail = |reason: String| ReplayError::Classification {
            key: key.to_owned(),
            reason,
        };

        let partition = partition_of(key)
            .ok_or_else(|| fail("key has fewer than two path segments".to_owned()))?;

        let table = self.table().await.map_err(|e| fail(e.to_string()))?;

        table
            .get(partition)
            .cloned()
            .ok_or_else(|| fail(format!("unknown partition '{partition}'")))
    }

    /// 캐시된 맵을 반환하고, 비어 있으면 한 번만 조회합니다.
    ///
    /// 락을 기다리는 동안 다른 호출자의 조회가 실패했다면 다시 조회하지 않고
    /// 그 오류를 그대로 돌려줍니다.
    async fn table(&self) -> Result<&HashMap<String, String>, ReplayError> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }

        let seen = self.failures.load(Ordering::Acquire);
        let mut last_error = self.fetch.lock().await;

        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        if self.failures.load(Ordering::Acquire) != seen {
            if let Some(ref e) = *last_error {
                return Err(e.clone());
            }
        }

        match self.fetch_table().await {
            Ok(table) => Ok(self.table.get_or_init(|| async move { table }).await),
            Err(e) => {
                *last_error = Some(e.clone());
                self.failures.fetch_add(1, Ordering::Release);
                Err(e)
            }
        }
    }

    async fn fetch_table(&self) -> Result<HashMap<String, String>, ReplayError> {
        metrics::counter!(m::CLASSIFIER_REMOTE_LOOKUPS_TOTAL).increment(1);
        debug!("fetching declared log types");

        let log_types = match self.api.list_available_log_types().await {
            Ok(types) => types,
            Err(e) => {
                warn!(error = %e, "log type lookup failed; waiting callers share this error");
                return Err(e);
            }
        };

        let table: HashMap<String, String> = log_types
            .into_iter()
            .map(|log_type| (partition_name(&log_type), log_type))
            .collect();

        info!(log_types = table.len(), "log type table loaded");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// 호출 횟수를 세고, 처음 `fail_first`번은 실패하는 가짜 API
    struct CountingApi {
        calls: Arc<AtomicUsize>,
        fail_first: usize,
        types: Vec<String>,
    }

    impl CountingApi {
        fn new(types: &[&str]) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                fail_first: 0,
                types: types.iter().map(|t| (*t).to_owned()).collect(),
            }
        }
    }

    impl LogTypeApi for CountingApi {
        async fn list_available_log_types(&self) -> Result<Vec<String>, ReplayError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            // 동시 호출자가 대기열에 쌓이도록 잠시 양보
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n < self.fail_first {
                return Err(ReplayError::Lookup {
                    function: "fake".to_owned(),
                    reason: "unavailable".to_owned(),
                });
            }
            Ok(self.types.clone())
        }
    }

    #[test]
    fn partition_is_second_segment() {
        assert_eq!(partition_of("logs/aws_cloudtrail/year=2024/f.gz"), Some("aws_cloudtrail"));
        assert_eq!(partition_of("logs/"), Some(""));
        assert_eq!(partition_of("logs"), None);
    }

    #[tokio::test]
    async fn classify_resolves_partition_to_declared_name() {
        let classifier = LogTypeClassifier::new(CountingApi::new(&["AWS.CloudTrail", "Okta.SystemLog"]));
        let log_type = classifier
            .classify("logs/aws_cloudtrail/year=2024/file.json.gz")
            .await
            .unwrap();
        assert_eq!(log_type, "AWS.CloudTrail");
        assert!(classifier.is_loaded());
    }

    #[tokio::test]
    async fn unknown_partition_fails() {
        let classifier = LogTypeClassifier::new(CountingApi::new(&["AWS.CloudTrail"]));
        let err = classifier
            .classify("bucket/unknownpartition/file.json")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("cannot derive log type"));
        assert!(err.to_string().contains("unknownpartition"));
    }

    #[tokio::test]
    async fn short_key_fails_without_remote_call() {
        let api = CountingApi::new(&["AWS.CloudTrail"]);
        let calls = Arc::clone(&api.calls);
        let classifier = LogTypeClassifier::new(api);

        let err = classifier.classify("file.json").await.unwrap_err();
        assert!(matches!(err, ReplayError::Classification { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_callers_trigger_one_lookup() {
        let api = CountingApi::new(&["AWS.CloudTrail", "AWS.VPCFlow"]);
        let calls = Arc::clone(&api.calls);
        let classifier = Arc::new(LogTypeClassifier::new(api));

        let mut handles = Vec::new();
        for i in 0..32 {
            let classifier = Arc::clone(&classifier);
            let key = if i % 2 == 0 {
                "logs/aws_cloudtrail/a.json"
            } else {
                "logs/aws_vpcflow/b.json"
            };
            handles.push(tokio::spawn(async move { classifier.classify(key).await }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_lookup_is_retried_by_next_caller() {
        let mut api = CountingApi::new(&["AWS.CloudTrail"]);
        api.fail_first = 1;
        let calls = Arc::clone(&api.calls);
        let classifier = LogTypeClassifier::new(api);

        let err = classifier.classify("logs/aws_cloudtrail/a").await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
        assert!(!classifier.is_loaded());

        let log_type = classifier.classify("logs/aws_cloudtrail/a").await.unwrap();
        assert_eq!(log_type, "AWS.CloudTrail");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // 채워진 뒤에는 다시 조회하지 않음
        classifier.classify("logs/aws_cloudtrail/b").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_failed_lookup() {
        let mut api = CountingApi::new(&["AWS.CloudTrail"]);
        api.fail_first = usize::MAX;
        let calls = Arc::clone(&api.calls);
        let classifier = Arc::new(LogTypeClassifier::new(api));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let classifier = Arc::clone(&classifier);
                tokio::spawn(async move { classifier.classify("logs/aws_cloudtrail/a").await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, ReplayError::Classification { .. }));
            assert!(err.to_string().contains("unavailable"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!classifier.is_loaded());

        // 실패가 끝난 뒤 도착한 호출은 다시 조회
        classifier.classify("logs/aws_cloudtrail/a").await.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn response_body_parses_log_types() {
        let parsed: ListLogTypesResponse =
            serde_json::from_str(r#"{"logTypes":["AWS.S3ServerAccess","GitHub.Audit"]}"#).unwrap();
        assert_eq!(parsed.log_types, ["AWS.S3ServerAccess", "GitHub.Audit"]);

        let empty: ListLogTypesResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.log_types.is_empty());
    }
}
