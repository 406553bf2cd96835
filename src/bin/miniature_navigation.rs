use anyhow::Result;
use clap::Parser;
use miniature_navigation::{
    configuration,
    driver::{zenoh_driver::ZenohMotorDriver, MotorDriver},
    error::ErrorWrapper,
    listener::{start_position_fix_listener, start_toggle_reading_listener},
    logging,
    navigation::{run_tick, NavigationController},
    planner::PathPlanner,
};
use std::{path::PathBuf, sync::Arc, time::Instant};
use tokio::{sync::Mutex, time::MissedTickBehavior};
use tracing::*;
use zenoh::prelude::r#async::*;

#[derive(Parser, Debug)]
#[command(
    version,
    author = "David M. Weis <dweis7@gmail.com>",
    about = "Bumper driven miniature vehicle navigation"
)]
struct Args {
    /// path to config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Log as json lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_tracing(args.verbosity, args.json_logs);

    let app_config = configuration::AppConfig::load_config(&args.config)?;

    let planner = PathPlanner::from_config(&app_config.map);
    let controller = Arc::new(Mutex::new(NavigationController::new(
        &app_config.navigation,
        app_config.motors.clone(),
        planner,
        Instant::now(),
    )?));

    // zenoh
    let zenoh_config = app_config.zenoh.get_zenoh_config()?;
    let zenoh_session = zenoh::open(zenoh_config)
        .res()
        .await
        .map_err(ErrorWrapper::ZenohError)?
        .into_arc();

    start_toggle_reading_listener(
        zenoh_session.clone(),
        controller.clone(),
        app_config.topics.toggle_reading.clone(),
    )
    .await?;
    start_position_fix_listener(
        zenoh_session.clone(),
        controller.clone(),
        app_config.topics.position_fix.clone(),
    )
    .await?;

    let mut driver = ZenohMotorDriver::new(zenoh_session, app_config.topics.clone());

    let mut interval = tokio::time::interval(app_config.navigation.tick_period());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(
        period = ?app_config.navigation.tick_period(),
        "Starting navigation loop"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(err) = run_tick(&controller, &mut driver, Instant::now()).await {
                    error!("Failed to send motor command {:?}", err);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    let stop = controller.lock().await.stop_command();
    driver.send(&stop).await?;

    Ok(())
}
