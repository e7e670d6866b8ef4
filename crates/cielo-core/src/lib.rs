//! # cielo-core
//!
//! Cielo Home 클라이언트의 도메인 모델, 포트(trait) 정의, 에러 타입, 설정.
//! 네트워크 어댑터 crate가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`] — 리스너/디바이스 조회 포트 인터페이스
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 클라이언트 설정 구조체

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

/// 현재 Unix 시각 (초)
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
