#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logreplay_core::types::{DataType, ObjectRecord};
use logreplay_pipeline::logtypes::partition_of;
use logreplay_pipeline::notification::S3Notification;

/// 퍼저용 구조적 객체 입력
#[derive(Arbitrary, Debug)]
struct FuzzObject {
    bucket: String,
    key: String,
    size: u64,
}

fuzz_target!(|input: FuzzObject| {
    let record = ObjectRecord::new(input.bucket, input.key, input.size);

    // 키 파생 함수는 어떤 입력에도 패닉하지 않아야 함
    let _ = DataType::from_key(&record.key);
    let _ = partition_of(&record.key);

    let Ok(body) = S3Notification::for_record(&record).to_json() else {
        return;
    };

    // 직렬화 결과는 항상 유효한 JSON이고 키와 크기를 보존
    let value: serde_json::Value =
        serde_json::from_str(&body).expect("notification must be valid JSON");
    let object = &value["Records"][0]["s3"]["object"];
    assert_eq!(object["key"].as_str(), Some(record.key.as_str()));
    assert_eq!(object["size"].as_u64(), Some(record.size));
});
