//! 객체 리스터 -- 접두어 아래 객체를 페이지 단위로 나열해 큐에 넣습니다.
//!
//! 크기가 0 이하인 항목(폴더 마커)은 건너뛰고, 나머지는 실행 통계에 더한 뒤
//! [`ObjectRecord`]로 만들어 큐에 보냅니다. 실행 통계를 올리는 주체는 리스터 하나뿐입니다.
//!
//! 중단 조건:
//! - 마지막 페이지까지 조회 완료
//! - 한도(`limit`, 0이면 무제한)에 도달 -- 페이지 중간이라도 즉시 멈추고 다음 페이지를 요청하지 않음
//! - 목록 조회 실패 -- 에러를 [`LatestError`]에 기록하고 멈춤
//! - 수신 측이 모두 사라짐
//!
//! 어떤 경우든 `run`이 끝나면 송신 측이 drop되어 큐가 닫힙니다.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use logreplay_core::metrics as m;
use logreplay_core::types::{ObjectRecord, RunStats};

use crate::error::{LatestError, ReplayError};
use crate::store::ObjectStore;

/// 페이지당 요청 항목 수
pub const PAGE_SIZE: i32 = 1000;

/// 진행 로그 간격 (객체 수)
pub const PROGRESS_INTERVAL: u64 = 5000;

/// 리스터 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOutcome {
    /// 모든 페이지를 조회함
    Exhausted,
    /// 한도에 도달해 멈춤
    LimitReached,
    /// 목록 조회 서비스 에러로 멈춤
    Failed,
    /// 큐 수신 측이 모두 사라져 멈춤
    ReceiversClosed,
}

/// 단일 생산자 객체 리스터
pub struct ObjectLister<S> {
    store: Arc<S>,
    bucket: String,
    prefix: String,
    limit: u64,
    stats: Arc<RunStats>,
    errors: Arc<LatestError>,
}

impl<S: ObjectStore> ObjectLister<S> {
    /// 새 리스터를 생성합니다.
    pub fn new(
        store: Arc<S>,
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        limit: u64,
        stats: Arc<RunStats>,
        errors: Arc<LatestError>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: prefix.into(),
            limit,
            stats,
            errors,
        }
    }

    /// 나열을 끝까지 수행합니다. `tx`는 반환 시 drop됩니다.
    pub async fn run(self, tx: mpsc::Sender<ObjectRecord>) -> ListingOutcome {
        let mut continuation: Option<String> = None;
        let mut emitted: u64 = 0;
        let mut stop_requested = false;

        info!(bucket = %self.bucket, prefix = %self.prefix, limit = self.limit, "listing objects");

        loop {
            let page = match self
                .store
                .list_page(&self.bucket, &self.prefix, continuation.take(), PAGE_SIZE)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    error!(bucket = %self.bucket, prefix = %self.prefix, error = %e, "listing failed");
                    metrics::counter!(m::REPLAY_FAILURES_TOTAL, m::LABEL_STAGE => e.stage())
                        .increment(1);
                    self.errors.record(e);
                    return ListingOutcome::Failed;
                }
            };
            metrics::counter!(m::LISTER_PAGES_TOTAL).increment(1);
            debug!(entries = page.objects.len(), "fetched listing page");

            for obj in page.objects {
                if obj.size <= 0 {
                    metrics::counter!(m::LISTER_EMPTY_SKIPPED_TOTAL).increment(1);
                    continue;
                }
                let size = obj.size.unsigned_abs();

                let count = self.stats.record_object(size);
                metrics::counter!(m::LISTER_OBJECTS_TOTAL).increment(1);
                metrics::counter!(m::LISTER_BYTES_TOTAL).increment(size);
                if count % PROGRESS_INTERVAL == 0 {
                    info!(
                        objects = count,
                        bytes = self.stats.bytes(),
                        "listing progress"
                    );
                }

                let record = ObjectRecord::new(self.bucket.clone(), obj.key, size);
                if tx.send(record).await.is_err() {
                    let err = ReplayError::Task("object queue closed before listing finished".to_owned());
                    error!(error = %err, "no publisher left to receive objects");
                    metrics::counter!(m::REPLAY_FAILURES_TOTAL, m::LABEL_STAGE => err.stage())
                        .increment(1);
                    self.errors.record(err);
                    return ListingOutcome::ReceiversClosed;
                }

                emitted += 1;
                if self.limit > 0 && emitted >= self.limit {
                    stop_requested = true;
                    break;
                }
            }

            if stop_requested {
                info!(limit = self.limit, "listing limit reached");
                return ListingOutcome::LimitReached;
            }

            match page.next_token {
                Some(token) => continuation = Some(token),
                None => {
                    info!(emitted, "listing finished");
                    return ListingOutcome::Exhausted;
                }
            }
        }
    }
}
