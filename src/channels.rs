use crate::prelude::*;
use crate::hoymiles::inverter::ChannelData;

#[derive(Debug, Clone)]
pub struct Channels {
    pub from_inverter: broadcast::Sender<ChannelData>,
    pub to_inverter: broadcast::Sender<ChannelData>,
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

impl Channels {
    pub fn new() -> Self {
        Self {
            from_inverter: Self::channel(),
            to_inverter: Self::channel(),
        }
    }

    fn channel<T: Clone>() -> broadcast::Sender<T> {
        broadcast::channel(2048).0
    }
}
