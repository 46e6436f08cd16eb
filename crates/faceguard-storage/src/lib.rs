//! # faceguard-storage
//!
//! 로컬 저장소 어댑터.
//! 팝업이 닫힌 뒤에도 완료된 결과를 전달하기 위한 핸드오프 저장소와
//! 그 아래의 키-값 저장소 구현(SQLite, 인메모리)을 제공한다.

pub mod handoff;
pub mod memory;
pub mod migration;
pub mod sqlite;

pub use handoff::HandoffStore;
pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
