use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hoymiles::statistics::{Statistics, StatisticsParser};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldValue {
    pub v: f32,
    pub u: &'static str,
    pub d: u8,
}

/// channel number -> field name -> value
pub type ChannelMap = BTreeMap<u8, BTreeMap<&'static str, FieldValue>>;

/// Everything a reporting consumer needs from one inverter, taken from a
/// single decode cycle. Absent fields are omitted.
#[derive(Clone, Debug, Serialize)]
pub struct LiveData {
    pub last_update: Option<DateTime<Utc>>,
    pub last_update_from_internal: Option<DateTime<Utc>>,
    pub rx_failures: u32,
    pub channels: BTreeMap<&'static str, ChannelMap>,
}

impl LiveData {
    pub fn capture(parser: &StatisticsParser) -> Self {
        let mut channels: BTreeMap<&'static str, ChannelMap> = BTreeMap::new();

        for entry in parser.byte_assignment().into_iter().flat_map(|a| a.iter()) {
            let Some(v) = parser.channel_field_value(entry.channel_type, entry.channel, entry.field) else {
                continue;
            };
            channels
                .entry(entry.channel_type.name())
                .or_default()
                .entry(u8::from(entry.channel))
                .or_default()
                .insert(
                    entry.field.name(),
                    FieldValue {
                        v,
                        u: entry.unit.symbol(),
                        d: entry.digits,
                    },
                );
        }

        Self {
            last_update: parser.last_update(),
            last_update_from_internal: parser.last_update_from_internal(),
            rx_failures: parser.rx_failure_count(),
            channels,
        }
    }

    /// Captures under one read guard.
    pub fn snapshot(statistics: &Statistics) -> Self {
        Self::capture(&statistics.read())
    }

    pub fn get(&self, channel_type: &str, channel: u8, field: &str) -> Option<&FieldValue> {
        self.channels.get(channel_type)?.get(&channel)?.get(field)
    }
}
