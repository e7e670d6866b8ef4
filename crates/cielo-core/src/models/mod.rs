//! Cielo 도메인 모델.
//!
//! 벤더 API 응답 envelope, 세션, 송수신 메시지, 디바이스/어플라이언스 레코드.
//! 모든 와이어 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod device;
pub mod envelope;
pub mod event;
pub mod message;
pub mod session;
