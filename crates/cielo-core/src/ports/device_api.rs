//! 디바이스 조회 API 포트.
//!
//! 구현: `cielo-network` crate (`HttpDeviceApi`, reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::device::{Appliance, ApplianceId, Device};

/// 디바이스/어플라이언스 REST 조회
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// 디바이스 목록 조회
    async fn fetch_devices(&self) -> Result<Vec<Device>, CoreError>;

    /// 여러 어플라이언스의 상세를 한 번에 조회
    async fn fetch_appliances(&self, ids: &[ApplianceId]) -> Result<Vec<Appliance>, CoreError>;
}
