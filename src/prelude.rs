pub use anyhow::{anyhow, bail, Result};
pub use log::{debug, error, info, trace, warn};
pub use std::str::FromStr;
pub use tokio::sync::broadcast;

pub use crate::channels::Channels;
pub use crate::config::{self, Config, ConfigWrapper};
pub use crate::error::StatisticsError;
pub use crate::hoymiles::inverter::Serial;
pub use crate::hoymiles::{
    ChannelNum, ChannelType, FieldId, InverterModel, LiveData, Statistics, StatisticsParser,
};
pub use crate::options::Options;
