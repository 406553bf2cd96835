pub mod zenoh_driver;

use anyhow::Result;
use async_trait::async_trait;

use crate::actuation::ActuatorCommand;

/// Anything that can put a gated motor command onto the wheels
#[async_trait]
pub trait MotorDriver: Send + Sync {
    async fn send(&mut self, command: &ActuatorCommand) -> Result<()>;
}
