//! 객체 목록 조회 서비스 추상화
//!
//! [`ObjectStore`] trait은 (버킷, 접두어) 아래 객체를 페이지 단위로 나열합니다.
//! 프로덕션에서는 [`S3ObjectStore`]를, 테스트에서는 `MockObjectStore`를 사용합니다.
//!
//! ```text
//! ObjectLister ──▶ ObjectStore (trait)
//!                     │      │
//!                     ▼      ▼
//!                  S3(v2)   Mock
//! ```

use std::future::Future;

use aws_sdk_s3::error::DisplayErrorContext;

use crate::error::ReplayError;

/// 목록 조회로 얻은 항목 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    /// 객체 키
    pub key: String,
    /// 객체 크기 (서비스가 크기를 주지 않으면 0)
    pub size: i64,
}

impl ListedObject {
    /// 새 항목을 생성합니다.
    pub fn new(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// 목록 조회 한 페이지
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    /// 페이지에 포함된 항목 (저장소 나열 순서)
    pub objects: Vec<ListedObject>,
    /// 다음 페이지 토큰 (`None`이면 마지막 페이지)
    pub next_token: Option<String>,
}

/// 페이지 단위 객체 목록 조회 서비스
///
/// 조기 중단은 호출자가 다음 페이지를 요청하지 않는 것으로 표현합니다.
pub trait ObjectStore: Send + Sync + 'static {
    /// 한 페이지를 조회합니다.
    ///
    /// `continuation`은 이전 페이지의 `next_token`입니다. 첫 페이지는 `None`.
    ///
    /// # Errors
    ///
    /// 서비스 호출이 실패하면 `ReplayError::Listing`을 반환합니다.
    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
        max_keys: i32,
    ) -> impl Future<Output = Result<ObjectPage, ReplayError>> + Send;
}

/// `ListObjectsV2` 기반 프로덕션 구현
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// S3 클라이언트로 생성합니다.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

impl ObjectStore for S3ObjectStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
        max_keys: i32,
    ) -> Result<ObjectPage, ReplayError> {
        let mut req = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(max_keys);

        if !prefix.is_empty() {
            req = req.prefix(prefix);
        }
        if let Some(token) = continuation {
            req = req.continuation_token(token);
        }

        let resp = req.send().await.map_err(|e| ReplayError::Listing {
            bucket: bucket.to_owned(),
            prefix: prefix.to_owned(),
            reason: DisplayErrorContext(&e).to_string(),
        })?;

        let objects = resp
            .contents()
            .iter()
            .map(|obj| ListedObject {
                key: obj.key().unwrap_or_default().to_owned(),
                size: obj.size().unwrap_or(0),
            })
            .collect();

        let next_token = if resp.is_truncated().unwrap_or(false) {
            resp.next_continuation_token().map(str::to_owned)
        } else {
            None
        };

        Ok(ObjectPage {
            objects,
            next_token,
        })
    }
}

/// 테스트용 목록 조회 서비스
///
/// 미리 준비한 페이지를 순서대로 돌려주고, 호출 횟수를 기록합니다.
#[cfg(test)]
pub(crate) struct MockObjectStore {
    pages: Vec<Result<Vec<ListedObject>, String>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockObjectStore {
    /// 성공 페이지들로 생성합니다.
    pub(crate) fn with_pages(pages: Vec<Vec<ListedObject>>) -> Self {
        Self {
            pages: pages.into_iter().map(Ok).collect(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// 지정한 페이지 번호에서 실패하도록 만듭니다.
    pub(crate) fn failing_at(mut self, page: usize, reason: &str) -> Self {
        if page < self.pages.len() {
            self.pages[page] = Err(reason.to_owned());
        } else {
            self.pages.push(Err(reason.to_owned()));
        }
        self
    }

    /// 지금까지 요청된 페이지 수
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl ObjectStore for MockObjectStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
        _max_keys: i32,
    ) -> Result<ObjectPage, ReplayError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let index = match continuation {
            None => 0,
            Some(token) => token.parse::<usize>().map_err(|_| ReplayError::Listing {
                bucket: bucket.to_owned(),
                prefix: prefix.to_owned(),
                reason: format!("bad continuation token '{token}'"),
            })?,
        };

        match self.pages.get(index) {
            None => Ok(ObjectPage::default()),
            Some(Err(reason)) => Err(ReplayError::Listing {
                bucket: bucket.to_owned(),
                prefix: prefix.to_owned(),
                reason: reason.clone(),
            }),
            Some(Ok(objects)) => Ok(ObjectPage {
                objects: objects.clone(),
                next_token: (index + 1 < self.pages.len()).then(|| (index + 1).to_string()),
            }),
        }
    }
}
