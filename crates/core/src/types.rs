//! 도메인 타입 -- 재전송 대상 객체, 실행 통계, 데이터 유형

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// 목록 조회로 발견된 객체 한 건
///
/// 리스터가 생성하고, 큐를 한 번 통과해 퍼블리셔 워커 하나가 소비합니다.
/// 크기가 0인 항목(폴더 마커)은 만들어지지 않으므로 `size`는 항상 0보다 큽니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// 버킷 이름
    pub bucket: String,
    /// 객체 키 (버킷 내 전체 경로)
    pub key: String,
    /// 객체 크기 (바이트)
    pub size: u64,
}

impl ObjectRecord {
    /// 새 레코드를 생성합니다.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, size: u64) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            size,
        }
    }
}

/// 실행 통계 -- 객체 수와 누적 바이트 수
///
/// 호출자가 실행 전에 할당해 `Arc`로 공유합니다. 값을 올리는 쪽은
/// 단일 리스터뿐이므로 합계는 워커 동시성과 무관하게 정확합니다.
/// 실행 중 읽기는 참고용입니다.
#[derive(Debug, Default)]
pub struct RunStats {
    objects: AtomicU64,
    bytes: AtomicU64,
}

impl RunStats {
    /// 0으로 초기화된 통계를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 객체 한 건을 기록하고 갱신된 객체 수를 반환합니다.
    pub fn record_object(&self, size: u64) -> u64 {
        self.bytes.fetch_add(size, Ordering::Relaxed);
        self.objects.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 지금까지 기록된 객체 수
    pub fn objects(&self) -> u64 {
        self.objects.load(Ordering::Relaxed)
    }

    /// 지금까지 기록된 누적 바이트 수
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// 현재 값을 복사해 반환합니다.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            objects: self.objects(),
            bytes: self.bytes(),
        }
    }
}

/// 특정 시점의 통계 사본 (리포트 출력용)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// 객체 수
    pub objects: u64,
    /// 누적 바이트 수
    pub bytes: u64,
}

/// 저장소 키 첫 세그먼트로 결정되는 데이터 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// `logs/` 하위 -- 정규화된 로그
    LogData,
    /// `rules/` 하위 -- 룰 매칭 결과
    RuleMatches,
    /// `rule_errors/` 하위 -- 룰 실행 에러
    RuleErrors,
    /// `cloud_security/` 하위 -- 클라우드 보안 스캔 결과
    CloudSecurity,
}

impl DataType {
    /// 저장소 키에서 데이터 유형을 추출합니다.
    ///
    /// 첫 세그먼트가 알려진 접두어가 아니면 `None`을 반환합니다.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.split('/').next()? {
            "logs" => Some(Self::LogData),
            "rules" => Some(Self::RuleMatches),
            "rule_errors" => Some(Self::RuleErrors),
            "cloud_security" => Some(Self::CloudSecurity),
            _ => None,
        }
    }

    /// 메시지 속성에 쓰이는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogData => "LogData",
            Self::RuleMatches => "RuleMatches",
            Self::RuleErrors => "RuleErrors",
            Self::CloudSecurity => "CloudSecurity",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 유형 이름을 저장소 파티션(테이블) 이름으로 변환합니다.
///
/// 소문자로 바꾸고 `.`을 `_`로 치환합니다. (`AWS.CloudTrail` -> `aws_cloudtrail`)
pub fn partition_name(log_type: &str) -> String {
    log_type.replace('.', "_").to_lowercase()
}
