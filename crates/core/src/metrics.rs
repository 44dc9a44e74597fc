//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 파이프라인은 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logreplay_`
//! - 구성요소: `lister_`, `classifier_`, `publisher_`, `replay_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logreplay_core::metrics::LISTER_OBJECTS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 실패 단계 레이블 키 (listing, classify, serialize, publish)
pub const LABEL_STAGE: &str = "stage";

// ─── Lister 메트릭 ─────────────────────────────────────────────────

/// Lister: 조회한 페이지 수 (counter)
pub const LISTER_PAGES_TOTAL: &str = "logreplay_lister_pages_total";

/// Lister: 발견한 객체 수, 크기 0 제외 (counter)
pub const LISTER_OBJECTS_TOTAL: &str = "logreplay_lister_objects_total";

/// Lister: 발견한 객체의 누적 바이트 수 (counter)
pub const LISTER_BYTES_TOTAL: &str = "logreplay_lister_bytes_total";

/// Lister: 건너뛴 크기 0 항목 수 (counter)
pub const LISTER_EMPTY_SKIPPED_TOTAL: &str = "logreplay_lister_empty_skipped_total";

// ─── Classifier 메트릭 ─────────────────────────────────────────────

/// Classifier: 원격 로그 유형 조회 호출 수 (counter)
pub const CLASSIFIER_REMOTE_LOOKUPS_TOTAL: &str = "logreplay_classifier_remote_lookups_total";

// ─── Publisher 메트릭 ──────────────────────────────────────────────

/// Publisher: 발행 성공한 알림 수 (counter)
pub const PUBLISHER_NOTIFICATIONS_TOTAL: &str = "logreplay_publisher_notifications_total";

/// Publisher: 실패 이후 버려진 레코드 수 (counter)
pub const PUBLISHER_DISCARDED_TOTAL: &str = "logreplay_publisher_discarded_total";

// ─── Replay 메트릭 ─────────────────────────────────────────────────

/// Replay: 단계별 실패 수 (counter, label: stage)
pub const REPLAY_FAILURES_TOTAL: &str = "logreplay_replay_failures_total";

/// Replay: 실행 소요 시간 (histogram, 초)
pub const REPLAY_RUN_DURATION_SECONDS: &str = "logreplay_replay_run_duration_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(LISTER_PAGES_TOTAL, "Number of listing pages fetched");
    describe_counter!(
        LISTER_OBJECTS_TOTAL,
        "Number of non-empty objects discovered by the lister"
    );
    describe_counter!(
        LISTER_BYTES_TOTAL,
        "Total bytes of the objects discovered by the lister"
    );
    describe_counter!(
        LISTER_EMPTY_SKIPPED_TOTAL,
        "Number of zero-size entries (folder markers) skipped"
    );
    describe_counter!(
        CLASSIFIER_REMOTE_LOOKUPS_TOTAL,
        "Number of remote log type lookups issued by the classifier"
    );
    describe_counter!(
        PUBLISHER_NOTIFICATIONS_TOTAL,
        "Number of object-created notifications published"
    );
    describe_counter!(
        PUBLISHER_DISCARDED_TOTAL,
        "Number of records drained without processing after a worker failed"
    );
    describe_counter!(REPLAY_FAILURES_TOTAL, "Replay failures by stage");
    describe_histogram!(
        REPLAY_RUN_DURATION_SECONDS,
        "Wall-clock duration of a replay run in seconds"
    );
}
