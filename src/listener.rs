use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::error;
use zenoh::{prelude::r#async::*, subscriber::FlumeSubscriber, Session, SessionDeclarations};

use crate::error::ErrorWrapper;
use crate::messages::{PositionFixMessage, ToggleReading};
use crate::navigation::NavigationController;

pub async fn start_toggle_reading_listener(
    zenoh_session: Arc<Session>,
    controller: Arc<Mutex<NavigationController>>,
    topic: String,
) -> Result<()> {
    let mut subscriber = zenoh_session
        .declare_subscriber(topic)
        .res()
        .await
        .map_err(ErrorWrapper::ZenohError)?;

    tokio::spawn(async move {
        while let Err(err) = run_toggle_reading_listener(&mut subscriber, &controller).await {
            error!("Toggle reading listener failed with {:?}", err);
        }
    });
    Ok(())
}

async fn run_toggle_reading_listener(
    subscriber: &mut FlumeSubscriber<'_>,
    controller: &Mutex<NavigationController>,
) -> Result<()> {
    loop {
        let sample = subscriber.recv_async().await?;
        let message: String = sample.value.try_into()?;
        let reading: ToggleReading = serde_json::from_str(&message)?;
        controller
            .lock()
            .await
            .ingest_reading(reading.pin, reading.is_on());
    }
}

pub async fn start_position_fix_listener(
    zenoh_session: Arc<Session>,
    controller: Arc<Mutex<NavigationController>>,
    topic: String,
) -> Result<()> {
    let mut subscriber = zenoh_session
        .declare_subscriber(topic)
        .res()
        .await
        .map_err(ErrorWrapper::ZenohError)?;

    tokio::spawn(async move {
        while let Err(err) = run_position_fix_listener(&mut subscriber, &controller).await {
            error!("Position fix listener failed with {:?}", err);
        }
    });
    Ok(())
}

async fn run_position_fix_listener(
    subscriber: &mut FlumeSubscriber<'_>,
    controller: &Mutex<NavigationController>,
) -> Result<()> {
    loop {
        let sample = subscriber.recv_async().await?;
        let message: String = sample.value.try_into()?;
        let message: PositionFixMessage = serde_json::from_str(&message)?;
        controller
            .lock()
            .await
            .ingest_position_fix(message.into(), Instant::now());
    }
}
