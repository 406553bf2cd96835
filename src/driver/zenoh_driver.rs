use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::trace;
use zenoh::{prelude::r#async::*, Session};

use super::MotorDriver;
use crate::actuation::{ActuatorCommand, WheelRequest};
use crate::configuration::TopicsConfig;
use crate::error::ErrorWrapper;
use crate::messages::{PwmRequest, ToggleRequest};

/// Publishes PWM and direction requests for the pin proxies
pub struct ZenohMotorDriver {
    zenoh_session: Arc<Session>,
    topics: TopicsConfig,
}

impl ZenohMotorDriver {
    pub fn new(zenoh_session: Arc<Session>, topics: TopicsConfig) -> Self {
        Self {
            zenoh_session,
            topics,
        }
    }

    async fn publish<T: Serialize>(&self, topic: &str, message: &T) -> Result<()> {
        let payload = serde_json::to_string(message)?;
        trace!(topic, %payload, "Publishing");
        self.zenoh_session
            .put(topic, payload)
            .res_async()
            .await
            .map_err(ErrorWrapper::ZenohError)?;
        Ok(())
    }

    async fn send_wheel(&self, wheel: &WheelRequest) -> Result<()> {
        self.publish(
            &self.topics.pwm_request,
            &PwmRequest::new(wheel.pwm_pin, wheel.magnitude),
        )
        .await?;
        for (pin, state) in wheel.direction {
            self.publish(&self.topics.toggle_request, &ToggleRequest::new(pin, state))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MotorDriver for ZenohMotorDriver {
    async fn send(&mut self, command: &ActuatorCommand) -> Result<()> {
        self.send_wheel(&command.left).await?;
        self.send_wheel(&command.right).await?;
        Ok(())
    }
}
