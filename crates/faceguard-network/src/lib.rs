//! # faceguard-network
//!
//! 외부 탐지 서비스 어댑터.
//! 크롭 이미지를 multipart로 1회 제출하고, 응답을 느슨한 결과 모델로 해석한다.

pub mod detection_client;

pub use detection_client::HttpDetectionClient;
