use crate::prelude::*;
use crate::datalog_writer::DatalogWriter;
use crate::hoymiles::report::LiveData;

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Deserializer, Serialize, Serializer},
    tokio::sync::broadcast::error::RecvError,
};

#[derive(PartialEq, Debug, Clone)]
pub enum ChannelData {
    // radio -> inverter task
    ResetBuffer(Serial),
    Fragment(Serial, u8, Vec<u8>),
    EndFragment(Serial, Option<DateTime<Utc>>),
    // inverter task -> observers, Updated closes every cycle
    Updated(Serial),
    RxFailure(Serial, StatisticsError),
    Shutdown,
}
pub type Sender = broadcast::Sender<ChannelData>;
pub type Receiver = broadcast::Receiver<ChannelData>;

// Serial {{{
/// Inverter serial number, printed as 12 hex digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Serial(u64);

impl Serial {
    pub fn new(serial: u64) -> Self {
        Self(serial)
    }

    pub fn data(&self) -> u64 {
        self.0
    }

    /// Upper 16 bits of the 48 bit serial, identifies the model family.
    pub fn prefix(&self) -> u16 {
        ((self.0 >> 32) & 0xffff) as u16
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:012X}", self.0)
    }
}

impl std::fmt::Debug for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:012X}", self.0)
    }
}

impl Serialize for Serial {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Serial {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Serial {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 12 {
            bail!("serial {} must be exactly 12 hex digits", s);
        }

        let serial = u64::from_str_radix(s, 16).map_err(|err| anyhow!("serial {}: {}", s, err))?;
        Ok(Self(serial))
    }
}
// }}}

/// Reception task for one inverter. Owns the mutating side of the
/// inverter's statistics.
#[derive(Clone)]
pub struct Inverter {
    config: config::Inverter,
    channels: Channels,
    statistics: Statistics,
    datalog: Option<DatalogWriter>,
}

impl Inverter {
    pub fn new(inverter: &config::Inverter, channels: Channels, datalog: Option<DatalogWriter>) -> Result<Self> {
        let parser = inverter.statistics_parser()?;

        Ok(Self {
            config: inverter.clone(),
            channels,
            statistics: Statistics::new(parser),
            datalog,
        })
    }

    pub fn config(&self) -> &config::Inverter {
        &self.config
    }

    pub fn serial(&self) -> Serial {
        self.config.serial()
    }

    /// Read side handle for reporting consumers.
    pub fn statistics(&self) -> Statistics {
        self.statistics.clone()
    }

    pub async fn start(&self) -> Result<()> {
        self.run(self.channels.to_inverter.subscribe()).await
    }

    pub fn stop(&self) {
        let _ = self.channels.to_inverter.send(ChannelData::Shutdown);
    }

    /// Processes radio messages from an already subscribed receiver, so
    /// nothing sent between spawn and subscribe is lost.
    pub async fn run(&self, mut receiver: Receiver) -> Result<()> {
        let serial = self.serial();
        debug!("inverter {} ({}) receiver starting", self.config.name(), serial);

        loop {
            match receiver.recv().await {
                Ok(ChannelData::ResetBuffer(s)) if s == serial => {
                    self.statistics.write().clear_buffer();
                }
                Ok(ChannelData::Fragment(s, offset, payload)) if s == serial => {
                    let result = self.statistics.write().append_fragment(offset, &payload);
                    if let Err(err) = result {
                        self.notify(ChannelData::RxFailure(serial, err));
                    }
                }
                Ok(ChannelData::EndFragment(s, at)) if s == serial => {
                    self.end_cycle(at);
                }
                Ok(ChannelData::Shutdown) => break,
                Ok(_) => (),
                Err(RecvError::Lagged(skipped)) => {
                    // fragments were dropped, whatever cycle is in flight is incomplete
                    warn!("inverter {}: lagged, {} messages skipped", serial, skipped);
                    self.statistics.write().increment_rx_failure_count();
                }
                Err(RecvError::Closed) => break,
            }
        }

        debug!("inverter {} receiver stopped", serial);
        Ok(())
    }

    fn end_cycle(&self, at: Option<DateTime<Utc>>) {
        let serial = self.serial();

        // decode, correction and calculation happen under one write guard;
        // the snapshot for the datalog is taken before it is released
        let (result, record, live) = {
            let mut parser = self.statistics.write();
            let result = parser.end_append_fragment_at(at.unwrap_or_else(Utc::now));
            let record = parser.record().to_vec();
            (result, record, LiveData::capture(&parser))
        };

        match result {
            Ok(()) => debug!("inverter {}: statistics updated", serial),
            Err(err) => {
                warn!("inverter {}: {}", serial, err);
                self.notify(ChannelData::RxFailure(serial, err));
            }
        }
        self.notify(ChannelData::Updated(serial));

        if let Some(writer) = &self.datalog {
            if let Err(err) = writer.write_cycle(serial, &record, &live) {
                error!("inverter {}: datalog write failed: {}", serial, err);
            }
        }
    }

    fn notify(&self, data: ChannelData) {
        // no observers is fine
        let _ = self.channels.from_inverter.send(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_round_trips_through_string() {
        let serial = Serial::from_str("114172220000").unwrap();
        assert_eq!(serial.prefix(), 0x1141);
        assert_eq!(serial.to_string(), "114172220000");
        assert!(Serial::from_str("1141").is_err());
        assert!(Serial::from_str("11417222000G").is_err());
    }
}
