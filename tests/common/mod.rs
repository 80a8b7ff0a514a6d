#![allow(dead_code)]

use hoymiles_stats::prelude::*;
use hoymiles_stats::replay::{self, Cycle, FieldValue};

pub struct Factory();

impl Factory {
    pub fn serial() -> Serial {
        Serial::from_str("114172220001").unwrap()
    }

    pub fn config_yaml() -> String {
        format!(
            r#"
inverters:
  - name: balcony
    serial: "{}"
    yield_day_correction: true
    string_max_power: [0, 400, 400]
"#,
            Self::serial()
        )
    }

    pub fn config() -> ConfigWrapper {
        ConfigWrapper::from_config(Config::from_yaml(&Self::config_yaml()).unwrap())
    }

    pub fn parser() -> StatisticsParser {
        StatisticsParser::for_model(InverterModel::Hm2Ch).unwrap()
    }

    pub fn value(channel_type: ChannelType, channel: ChannelNum, field: FieldId, value: f32) -> FieldValue {
        FieldValue {
            channel_type,
            channel,
            field,
            value,
        }
    }

    /// A sunny afternoon on a two input inverter.
    pub fn values() -> Vec<FieldValue> {
        use ChannelNum::*;
        use ChannelType::*;
        use FieldId::*;

        vec![
            Self::value(Dc, Ch1, Udc, 33.2),
            Self::value(Dc, Ch1, Idc, 6.02),
            Self::value(Dc, Ch1, Pdc, 200.0),
            Self::value(Dc, Ch1, YieldDay, 1250.0),
            Self::value(Dc, Ch1, YieldTotal, 1234.567),
            Self::value(Dc, Ch2, Udc, 31.9),
            Self::value(Dc, Ch2, Idc, 1.57),
            Self::value(Dc, Ch2, Pdc, 50.0),
            Self::value(Dc, Ch2, YieldDay, 310.0),
            Self::value(Dc, Ch2, YieldTotal, 100.0),
            Self::value(Ac, Ch0, Uac, 230.1),
            Self::value(Ac, Ch0, Iac, 1.04),
            Self::value(Ac, Ch0, Pac, 240.0),
            Self::value(Ac, Ch0, Frequency, 49.98),
            Self::value(Ac, Ch0, PowerFactor, 1.0),
            Self::value(Inv, Ch0, Temperature, -2.5),
            Self::value(Inv, Ch0, EventLogCount, 3.0),
        ]
    }

    pub fn record() -> Vec<u8> {
        replay::encode_record(InverterModel::Hm2Ch, &Self::values()).unwrap()
    }

    pub fn record_with(values: &[FieldValue]) -> Vec<u8> {
        replay::encode_record(InverterModel::Hm2Ch, values).unwrap()
    }

    pub fn cycle(record: &[u8]) -> Cycle {
        Cycle {
            serial: Self::serial(),
            time: None,
            fragments: replay::fragments_for(record),
        }
    }
}

/// Runs one complete reception cycle, `size` bytes per fragment.
pub fn receive(parser: &mut StatisticsParser, record: &[u8], size: usize) -> Result<(), StatisticsError> {
    parser.clear_buffer();
    for (i, chunk) in record.chunks(size).enumerate() {
        parser.append_fragment((i * size) as u8, chunk)?;
    }
    parser.end_append_fragment()
}

pub fn get(parser: &StatisticsParser, channel_type: ChannelType, channel: ChannelNum, field: FieldId) -> f32 {
    parser
        .channel_field_value(channel_type, channel, field)
        .unwrap_or_else(|| panic!("{} {} {:?} has no value", channel_type, channel, field))
}

pub fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.001,
        "expected {}, got {}",
        expected,
        actual
    );
}
