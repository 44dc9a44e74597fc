//! 저장소 위치 문자열 파싱
//!
//! `s3://<bucket>[/<prefix>]` 형식의 문자열을 검증된 (버킷, 접두어) 쌍으로 변환합니다.
//! 스킴과 권한 부분 검사는 [`url::Url`]에 맡기고, 접두어는 입력 원문에서 잘라냅니다.
//!
//! # 규칙
//! - 스킴은 대소문자 구분 없이 `s3`만 허용
//! - 버킷은 비어 있으면 안 되며 사용자 정보(`user@`)나 포트를 가질 수 없음
//! - 쿼리(`?`)와 프래그먼트(`#`)는 허용하지 않음
//! - 제어 문자(탭, 개행 포함)는 허용하지 않음
//! - 접두어는 버킷 뒤 원문 경로에서 선행 `/` 하나를 제거하고 퍼센트 디코딩한 값
//!   (`.`과 `..` 세그먼트는 그대로 유지, 없으면 빈 문자열)

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::ReplayError;

/// 허용되는 유일한 스킴
pub const S3_SCHEME: &str = "s3";

/// 검증된 저장소 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    bucket: String,
    prefix: String,
}

impl Locator {
    /// 위치 문자열을 파싱합니다.
    pub fn parse(input: &str) -> Result<Self, ReplayError> {
        let fail = |reason: &str| ReplayError::Locator {
            locator: input.to_owned(),
            reason: reason.to_owned(),
        };

        // Url은 탭과 개행을 조용히 제거하므로 먼저 거부
        if input.chars().any(char::is_control) {
            return Err(fail("control characters are not allowed"));
        }

        let url = Url::parse(input).map_err(|e| fail(&e.to_string()))?;

        // Url은 스킴을 소문자로 정규화함
        if url.scheme() != S3_SCHEME {
            return Err(fail("not s3 protocol (expecting s3://)"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(fail("query and fragment components are not supported"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(fail("bucket must not contain user info"));
        }
        if url.port().is_some() {
            return Err(fail("bucket must not contain a port"));
        }

        let bucket = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| fail("missing bucket"))?;

        let path = raw_path(input).ok_or_else(|| fail("missing bucket"))?;
        let path = path.strip_prefix('/').unwrap_or(path);
        let prefix = decode_path(path).map_err(|reason| fail(&reason))?;

        Ok(Self {
            bucket: bucket.to_owned(),
            prefix,
        })
    }

    /// 버킷 이름
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// 조회 접두어 (빈 문자열이면 버킷 전체)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", S3_SCHEME, self.bucket, self.prefix)
    }
}

impl std::str::FromStr for Locator {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `://<bucket>` 뒤의 경로 원문. 버킷만 있으면 빈 문자열.
///
/// 쿼리와 프래그먼트는 호출 전에 거부되어 있어야 합니다.
fn raw_path(input: &str) -> Option<&str> {
    let (_, rest) = input.split_once("://")?;
    Some(rest.find('/').map_or("", |at| &rest[at..]))
}

/// `%XX` 이스케이프를 디코딩합니다.
///
/// `percent_decode_str`는 잘못된 이스케이프를 그대로 통과시키므로 먼저 검사합니다.
fn decode_path(path: &str) -> Result<String, String> {
    let bytes = path.as_bytes();
    for (offset, _) in path.match_indices('%') {
        let valid = bytes
            .get(offset + 1..offset + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(format!("invalid escape at offset {offset}"));
        }
    }

    percent_decode_str(path)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| "decoded path is not valid UTF-8".to_owned())
}
