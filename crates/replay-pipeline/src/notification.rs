//! 합성 "객체 생성" 알림
//!
//! 수집 시스템이 받는 S3 이벤트 봉투와 같은 모양의 JSON을 만듭니다.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use logreplay_core::types::ObjectRecord;

/// 이벤트 버전
pub const EVENT_VERSION: &str = "2.1";
/// 이벤트 출처
pub const EVENT_SOURCE: &str = "aws:s3";
/// 이벤트 이름
pub const EVENT_NAME: &str = "ObjectCreated:Put";
/// S3 스키마 버전
pub const S3_SCHEMA_VERSION: &str = "1.0";

/// 알림 봉투
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Notification {
    /// 레코드 목록 (항상 한 건)
    #[serde(rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

/// 이벤트 레코드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    pub event_version: String,
    pub event_source: String,
    pub aws_region: String,
    /// RFC 3339 시각
    pub event_time: String,
    pub event_name: String,
    pub s3: S3Entity,
}

/// 버킷/객체 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Entity {
    pub s3_schema_version: String,
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Bucket {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Object {
    pub key: String,
    pub size: u64,
}

impl S3Notification {
    /// 객체 한 건에 대한 생성 알림을 만듭니다. 이벤트 시각은 현재 시각입니다.
    pub fn object_created(bucket: &str, key: &str, size: u64) -> Self {
        Self {
            records: vec![S3EventRecord {
                event_version: EVENT_VERSION.to_owned(),
                event_source: EVENT_SOURCE.to_owned(),
                aws_region: String::new(),
                event_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                event_name: EVENT_NAME.to_owned(),
                s3: S3Entity {
                    s3_schema_version: S3_SCHEMA_VERSION.to_owned(),
                    bucket: S3Bucket {
                        name: bucket.to_owned(),
                        arn: format!("arn:aws:s3:::{bucket}"),
                    },
                    object: S3Object {
                        key: key.to_owned(),
                        size,
                    },
                },
            }],
        }
    }

    /// 레코드로부터 생성 알림을 만듭니다.
    pub fn for_record(record: &ObjectRecord) -> Self {
        Self::object_created(&record.bucket, &record.key, record.size)
    }

    /// JSON 문자열로 직렬화합니다.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
