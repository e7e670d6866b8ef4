//! # cielo-network
//!
//! Cielo Home HTTP/WebSocket 네트워크 어댑터.
//! 로그인과 주기적 토큰 갱신, 실시간 이벤트 스트림(WebSocket) 유지,
//! 송신 큐 비우기, 디바이스 목록 조회를 담당한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use cielo_core::config::ClientConfig;
//! use cielo_core::models::event::StateUpdate;
//! use cielo_network::client::CieloClient;
//! use std::sync::Arc;
//!
//! let client = CieloClient::new(ClientConfig::default_config())?;
//! client.add_listener(Arc::new(|e: &StateUpdate| println!("{:?}", e.payload())));
//! if client.authenticate("user@example.com", "password", true).await {
//!     let devices = client.list_devices().await;
//! }
//! client.close().await;
//! ```

pub mod auth;
pub mod client;
pub mod connectivity;
pub mod devices;
pub mod dispatcher;
pub mod http_client;
pub mod outbound;
pub mod session;
pub mod timer;
pub mod ws_client;

pub use client::CieloClient;
