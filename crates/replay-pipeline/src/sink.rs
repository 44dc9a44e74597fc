//! 알림 발행 대상 추상화
//!
//! [`NotificationSink`]는 (토픽, 본문, 속성)을 받아 발행합니다.
//! 프로덕션 구현은 [`SnsNotificationSink`]입니다.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::types::MessageAttributeValue;

use logreplay_core::types::DataType;

use crate::error::ReplayError;

/// 메시지 속성 (이름 -> 문자열 값)
pub type MessageAttributes = BTreeMap<String, String>;

/// 데이터 유형 속성 이름
pub const ATTR_TYPE: &str = "type";
/// 로그 유형 속성 이름
pub const ATTR_ID: &str = "id";

/// 알림 발행 서비스
pub trait NotificationSink: Send + Sync + 'static {
    /// 메시지 하나를 발행합니다. 호출자 입장에서 동기적으로 완료됩니다.
    ///
    /// # Errors
    ///
    /// 발행이 거부되거나 실패하면 `ReplayError::Publish`를 반환합니다.
    /// `key`는 에러 메시지에만 쓰입니다.
    fn publish(
        &self,
        topic_arn: &str,
        key: &str,
        message: String,
        attributes: MessageAttributes,
    ) -> impl Future<Output = Result<(), ReplayError>> + Send;
}

/// SNS `Publish` 기반 프로덕션 구현
#[derive(Debug, Clone)]
pub struct SnsNotificationSink {
    client: aws_sdk_sns::Client,
}

impl SnsNotificationSink {
    /// SNS 클라이언트로 생성합니다.
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

impl NotificationSink for SnsNotificationSink {
    async fn publish(
        &self,
        topic_arn: &str,
        key: &str,
        message: String,
        attributes: MessageAttributes,
    ) -> Result<(), ReplayError> {
        let fail = |reason: String| ReplayError::Publish {
            key: key.to_owned(),
            topic_arn: topic_arn.to_owned(),
            reason,
        };

        let mut sns_attributes = HashMap::with_capacity(attributes.len());
        for (name, value) in attributes {
            let value = MessageAttributeValue::builder()
                .data_type("String")
                .string_value(value)
                .build()
                .map_err(|e| fail(e.to_string()))?;
            sns_attributes.insert(name, value);
        }

        let mut req = self.client.publish().topic_arn(topic_arn).message(message);
        if !sns_attributes.is_empty() {
            req = req.set_message_attributes(Some(sns_attributes));
        }

        req.send()
            .await
            .map_err(|e| fail(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

/// 토픽 이름을 ARN으로 변환합니다.
///
/// 이미 `arn:`으로 시작하면 그대로 사용합니다.
/// 그렇지 않으면 `arn:aws:sns:{region}:{account}:{topic}` 형식으로 만들며,
/// 이때 리전과 계정 ID가 필요합니다.
pub fn resolve_topic_arn(topic: &str, region: &str, account_id: &str) -> Result<String, ReplayError> {
    let fail = |field: &str, reason: &str| ReplayError::Config {
        field: field.to_owned(),
        reason: reason.to_owned(),
    };

    if topic.is_empty() {
        return Err(fail("replay.topic", "must not be empty"));
    }
    if topic.starts_with("arn:") {
        return Ok(topic.to_owned());
    }
    if region.is_empty() {
        return Err(fail("aws.region", "required to build the topic ARN"));
    }
    if account_id.is_empty() {
        return Err(fail("aws.account_id", "required to build the topic ARN"));
    }
    Ok(format!("arn:aws:sns:{region}:{account_id}:{topic}"))
}

/// 분류 결과로 메시지 속성을 만듭니다.
pub fn message_attributes(data_type: DataType, log_type: &str) -> MessageAttributes {
    let mut attributes = MessageAttributes::new();
    attributes.insert(ATTR_TYPE.to_owned(), data_type.as_str().to_owned());
    attributes.insert(ATTR_ID.to_owned(), log_type.to_owned());
    attributes
}

/// 테스트용 발행 대상 -- 발행된 메시지를 기록하고 지정한 키에서 실패합니다.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MockSink {
    pub(crate) published: std::sync::Mutex<Vec<(String, MessageAttributes)>>,
    pub(crate) fail_keys: std::collections::HashSet<String>,
}

#[cfg(test)]
impl MockSink {
    pub(crate) fn failing_on(keys: &[&str]) -> Self {
        Self {
            published: std::sync::Mutex::default(),
            fail_keys: keys.iter().map(|k| (*k).to_owned()).collect(),
        }
    }

    pub(crate) fn published_keys(&self) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[cfg(test)]
impl NotificationSink for MockSink {
    async fn publish(
        &self,
        topic_arn: &str,
        key: &str,
        _message: String,
        attributes: MessageAttributes,
    ) -> Result<(), ReplayError> {
        if self.fail_keys.contains(key) {
            return Err(ReplayError::Publish {
                key: key.to_owned(),
                topic_arn: topic_arn.to_owned(),
                reason: "rejected".to_owned(),
            });
        }
        self.published
            .lock()
            .unwrap()
            .push((key.to_owned(), attributes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_arn_from_parts() {
        let arn = resolve_topic_arn("panther-processed-data-notifications", "us-east-1", "123456789012")
            .unwrap();
        assert_eq!(
            arn,
            "arn:aws:sns:us-east-1:123456789012:panther-processed-data-notifications"
        );
    }

    #[test]
    fn topic_arn_passes_through() {
        let arn = "arn:aws:sns:eu-west-1:000000000000:t";
        assert_eq!(resolve_topic_arn(arn, "", "").unwrap(), arn);
    }

    #[test]
    fn topic_arn_requires_region_and_account() {
        let err = resolve_topic_arn("t", "", "123456789012").unwrap_err();
        assert!(err.to_string().contains("aws.region"));
        let err = resolve_topic_arn("t", "us-east-1", "").unwrap_err();
        assert!(err.to_string().contains("aws.account_id"));
        assert!(resolve_topic_arn("", "us-east-1", "123456789012").is_err());
    }

    #[test]
    fn attributes_carry_type_and_id() {
        let attrs = message_attributes(DataType::LogData, "AWS.CloudTrail");
        assert_eq!(attrs.get(ATTR_TYPE).map(String::as_str), Some("LogData"));
        assert_eq!(attrs.get(ATTR_ID).map(String::as_str), Some("AWS.CloudTrail"));
        assert_eq!(attrs.len(), 2);
    }
}
