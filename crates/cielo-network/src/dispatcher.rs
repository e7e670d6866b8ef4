//! 이벤트 디스패처.
//!
//! 등록 순서대로 보관한 리스너에게 `StateUpdate`를 동기 전달한다.
//! 제거 API는 없다. 호출은 연결 루프 태스크 위에서 일어난다.
//! 리스너 패닉은 여기서 멈추고 연결 장애로 올린다.

use cielo_core::error::CoreError;
use cielo_core::models::event::StateUpdate;
use cielo_core::ports::listener::EventListener;
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// 리스너 구독 목록
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 리스너 등록 (목록 끝에 추가)
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        let mut listeners = self.listeners.write();
        listeners.push(listener);
        debug!("리스너 등록: 총 {}개", listeners.len());
    }

    /// 등록된 리스너 수
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// 모든 리스너에게 등록 순서대로 전달
    ///
    /// 목록을 복제한 뒤 락 밖에서 호출하므로 리스너 안에서 등록해도 교착되지 않는다.
    /// 패닉한 리스너가 있어도 나머지 리스너에는 전달하고, 끝나면 `Internal` 에러를
    /// 돌려준다. 성공하면 전달한 리스너 수.
    pub fn dispatch(&self, event: &StateUpdate) -> Result<usize, CoreError> {
        let listeners: Vec<Arc<dyn EventListener>> = self.listeners.read().clone();
        let mut panicked = 0;
        for (index, listener) in listeners.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_state_update(event)));
            if let Err(payload) = outcome {
                panicked += 1;
                error!("리스너 #{index} 패닉: {}", panic_message(payload.as_ref()));
            }
        }

        if panicked > 0 {
            return Err(CoreError::Internal(format!("리스너 {panicked}개 패닉")));
        }
        Ok(listeners.len())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("알 수 없는 패닉")
}
