//! 포트 인터페이스 (trait).
//!
//! 네트워크 어댑터 crate가 구현하거나 호출자가 구현하는 경계.
//! async trait은 `async_trait` 매크로로 object safety를 보장한다.

pub mod device_api;
pub mod listener;
