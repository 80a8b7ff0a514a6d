use crate::prelude::*;
use crate::hoymiles::inverter::ChannelData;
use crate::hoymiles::{decoder, ByteAssignment, ChannelField};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// Fragments are emitted at this size, the payload of one radio frame.
pub const FRAGMENT_SIZE: usize = 16;

// Capture {{{
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub offset: u8,
    #[serde_as(as = "Hex")]
    pub data: Vec<u8>,
}

/// One reception cycle as recorded from the radio.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub serial: Serial,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    pub fragments: Vec<Fragment>,
}

impl Cycle {
    /// The messages a radio task would send for this cycle.
    pub fn messages(&self) -> Vec<ChannelData> {
        let mut messages = Vec::with_capacity(self.fragments.len() + 2);
        messages.push(ChannelData::ResetBuffer(self.serial));
        for f in &self.fragments {
            messages.push(ChannelData::Fragment(self.serial, f.offset, f.data.clone()));
        }
        messages.push(ChannelData::EndFragment(self.serial, self.time));
        messages
    }
}

pub fn parse_capture(content: &str) -> Result<Vec<Cycle>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|err| anyhow!("line {}: {}", i + 1, err))
        })
        .collect()
}

pub fn read_capture(path: &str) -> Result<Vec<Cycle>> {
    let content = std::fs::read_to_string(path).map_err(|err| anyhow!("error reading {}: {}", path, err))?;
    let cycles = parse_capture(&content)?;
    info!("read {} cycles from {}", cycles.len(), path);
    Ok(cycles)
}

/// Splits a record into radio sized fragments.
pub fn fragments_for(record: &[u8]) -> Vec<Fragment> {
    record
        .chunks(FRAGMENT_SIZE)
        .enumerate()
        .map(|(i, chunk)| Fragment {
            offset: (i * FRAGMENT_SIZE) as u8,
            data: chunk.to_vec(),
        })
        .collect()
}
// }}}

// Encoding {{{
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FieldValue {
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub channel: ChannelNum,
    pub field: FieldId,
    pub value: f32,
}

pub fn read_values(path: &str) -> Result<Vec<FieldValue>> {
    let content = std::fs::read_to_string(path).map_err(|err| anyhow!("error reading {}: {}", path, err))?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Builds the raw record an inverter of `model` would send for `values`.
/// Fields not listed are left zero.
pub fn encode_record(model: InverterModel, values: &[FieldValue]) -> Result<Vec<u8>, StatisticsError> {
    let assignment = ByteAssignment::new(model.byte_assignment())?;
    let mut record = vec![0; assignment.expected_byte_count()];

    for v in values {
        let key = ChannelField(v.channel_type, v.channel, v.field);
        let assign = assignment.find(key).ok_or(StatisticsError::MissingDescriptor {
            channel_type: v.channel_type,
            channel: v.channel,
            field: v.field,
        })?;
        if assign.is_calc() {
            return Err(StatisticsError::ComputedField {
                channel_type: v.channel_type,
                channel: v.channel,
                field: v.field,
            });
        }
        decoder::encode_into(assign, v.value, &mut record)?;
    }

    Ok(record)
}
// }}}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_capture_lines() -> Result<()> {
        let content = r#"
# roof inverter
{"serial": "112183200001", "fragments": [{"offset": 0, "data": "0001"}, {"offset": 2, "data": "FF"}]}

{"serial": "112183200001", "time": "2024-06-01T12:00:00Z", "fragments": []}
"#;
        let cycles = parse_capture(content)?;
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].fragments[1].data, vec![0xff]);
        assert!(cycles[0].time.is_none());
        assert!(cycles[1].time.is_some());

        let messages = cycles[0].messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChannelData::ResetBuffer(cycles[0].serial));
        assert_eq!(messages[3], ChannelData::EndFragment(cycles[0].serial, None));
        Ok(())
    }

    #[test]
    fn reports_bad_line() {
        let err = parse_capture("{\"serial\": \"1121\", \"fragments\": []}").unwrap_err();
        assert!(err.to_string().starts_with("line 1:"));
    }

    #[test]
    fn fragments_cover_record() {
        let record: Vec<u8> = (0..40).collect();
        let fragments = fragments_for(&record);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[2].offset, 32);
        assert_eq!(fragments[2].data.len(), 8);
    }

    #[test]
    fn encodes_values_into_layout() -> Result<()> {
        let values = vec![FieldValue {
            channel_type: ChannelType::Inv,
            channel: ChannelNum::Ch0,
            field: FieldId::Temperature,
            value: 23.4,
        }];
        let record = encode_record(InverterModel::Hm1Ch, &values)?;
        assert_eq!(record.len(), 30);

        let mut parser = StatisticsParser::for_model(InverterModel::Hm1Ch)?;
        for f in fragments_for(&record) {
            parser.append_fragment(f.offset, &f.data)?;
        }
        parser.end_append_fragment()?;
        assert_eq!(
            parser.channel_field_value(ChannelType::Inv, ChannelNum::Ch0, FieldId::Temperature),
            Some(23.4)
        );

        let computed = vec![FieldValue {
            channel_type: ChannelType::Inv,
            channel: ChannelNum::Ch0,
            field: FieldId::Pdc,
            value: 1.0,
        }];
        assert!(matches!(
            encode_record(InverterModel::Hm1Ch, &computed),
            Err(StatisticsError::ComputedField { .. })
        ));
        Ok(())
    }
}
