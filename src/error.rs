use thiserror::Error;

use crate::hoymiles::{ChannelNum, ChannelType, FieldId};

/// Failures surfaced by the statistics engine.
///
/// None of these terminate a decode loop; most are also reflected in the
/// parser's rx failure counter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatisticsError {
    #[error("fragment at offset {offset} with {len} bytes overflows {capacity} byte buffer")]
    Overflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("fragment appended after record was finalized")]
    AppendAfterFinalize,

    #[error("record already finalized")]
    AlreadyFinalized,

    #[error("record has {received} bytes, expected {expected}")]
    MalformedRecord { received: usize, expected: usize },

    #[error("descriptor {index} has unsupported byte width {width}")]
    InvalidWidth { index: usize, width: u8 },

    #[error("descriptor {index} reads bytes {start}..{end}, beyond {capacity} byte buffer")]
    OutOfBounds {
        index: usize,
        start: usize,
        end: usize,
        capacity: usize,
    },

    #[error("descriptor {index} has zero divisor")]
    ZeroDivisor { index: usize },

    #[error("no byte assignment set")]
    NoByteAssignment,

    #[error("no descriptor for {channel_type} channel {channel} field {field:?}")]
    MissingDescriptor {
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
    },

    #[error("{channel_type} channel {channel} field {field:?} is computed and cannot be set")]
    ComputedField {
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
    },

    #[error("value {value} does not fit in {width} byte field")]
    ValueOutOfRange { value: f32, width: u8 },

    #[error("invalid channel number {0}")]
    InvalidChannel(u8),
}

/// Creates an anyhow error with the current file and line number
#[macro_export]
macro_rules! file_error {
    ($($arg:tt)*) => {
        anyhow::anyhow!(
            "[{}:{}] {}",
            std::path::Path::new(file!())
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            line!(),
            format!($($arg)*)
        )
    };
}
