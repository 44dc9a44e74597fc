//! AWS SDK 클라이언트 구성
//!
//! `[aws]` 설정 섹션으로 공유 SDK 설정을 만들고, 서비스별 클라이언트를 생성합니다.
//! 엔드포인트가 지정되면(LocalStack 등) S3는 path-style 주소를 사용합니다.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::debug;

use logreplay_core::config::AwsConfig;

/// 공유 SDK 설정을 불러옵니다.
///
/// 비어 있는 필드는 SDK 기본 탐색(환경변수, 프로파일, IMDS)에 맡깁니다.
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if !aws.region.is_empty() {
        loader = loader.region(Region::new(aws.region.clone()));
    }
    if !aws.profile.is_empty() {
        loader = loader.profile_name(&aws.profile);
    }
    if !aws.endpoint_url.is_empty() {
        loader = loader.endpoint_url(&aws.endpoint_url);
    }

    let sdk = loader.load().await;
    debug!(region = ?sdk.region(), "loaded AWS SDK config");
    sdk
}

/// S3 클라이언트를 생성합니다. `s3_region`이 있으면 그 리전을 사용합니다.
pub fn s3_client(sdk: &SdkConfig, aws: &AwsConfig) -> aws_sdk_s3::Client {
    let mut builder = aws_sdk_s3::config::Builder::from(sdk);
    if !aws.s3_region.is_empty() {
        builder = builder.region(Region::new(aws.s3_region.clone()));
    }
    if !aws.endpoint_url.is_empty() {
        builder = builder.force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

/// SNS 클라이언트를 생성합니다.
pub fn sns_client(sdk: &SdkConfig) -> aws_sdk_sns::Client {
    aws_sdk_sns::Client::new(sdk)
}

/// Lambda 클라이언트를 생성합니다.
pub fn lambda_client(sdk: &SdkConfig) -> aws_sdk_lambda::Client {
    aws_sdk_lambda::Client::new(sdk)
}

/// 토픽 ARN 조립에 쓸 리전 -- 설정값이 없으면 SDK가 찾은 리전
pub fn effective_region(sdk: &SdkConfig, aws: &AwsConfig) -> String {
    if !aws.region.is_empty() {
        return aws.region.clone();
    }
    sdk.region().map(|r| r.to_string()).unwrap_or_default()
}
