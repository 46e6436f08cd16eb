//! FaceGuard 도메인 모델.
//!
//! 실행 컨텍스트(오버레이/코디네이터/팝업) 사이를 오가는 데이터 구조체를 정의한다.
//! 컨텍스트 경계를 넘는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod analysis;
pub mod capture;
pub mod handoff;
pub mod message;
pub mod region;
