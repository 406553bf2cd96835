#![doc = include_str!("../README.md")]
pub mod actuation;
pub mod behavior;
pub mod configuration;
pub mod driver;
pub mod error;
pub mod follower;
pub mod grid;
pub mod guard;
pub mod listener;
pub mod logging;
pub mod map;
pub mod messages;
pub mod navigation;
pub mod planner;
pub mod sensor_latch;
