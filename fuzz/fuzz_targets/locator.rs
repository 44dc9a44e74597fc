#![no_main]

use libfuzzer_sys::fuzz_target;
use logreplay_pipeline::Locator;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(locator) = Locator::parse(input) {
            // 파싱에 성공한 위치는 비어 있지 않은 버킷을 가져야 함
            assert!(!locator.bucket().is_empty());
            assert!(!locator.bucket().contains('/'));
            // 표시 형식은 항상 s3:// 로 시작
            assert!(locator.to_string().starts_with("s3://"));
        }
    }
});
