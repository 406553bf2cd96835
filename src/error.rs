use thiserror::Error;

/// zenoh reports errors as boxed trait objects which anyhow can't take directly
#[derive(Error, Debug)]
pub enum ErrorWrapper {
    #[error("zenoh error {0:?}")]
    ZenohError(zenoh::Error),
}
