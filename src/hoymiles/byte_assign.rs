use std::collections::HashMap;

use crate::error::StatisticsError;
use crate::hoymiles::fragment::STATISTIC_PACKET_SIZE;
use crate::hoymiles::{ChannelNum, ChannelType, FieldId, UnitId};

/// Derived field routines, see `calc.rs`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CalcFn {
    TotalYieldTotal,
    TotalYieldDay,
    /// copies the DC voltage of the argument channel
    ChannelDcVoltage,
    TotalDcPower,
    TotalEfficiency,
    /// DC power of the argument channel against its configured max power
    ChannelIrradiation,
    TotalAcCurrent,
}

/// Where a field's value comes from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Source {
    /// big-endian integer at `start..start + len`, divided by `divisor`
    Bytes {
        start: u8,
        len: u8,
        divisor: u16,
        signed: bool,
    },
    /// derived from already decoded fields
    Calc { func: CalcFn, arg: ChannelNum },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ByteAssign {
    pub channel_type: ChannelType,
    pub channel: ChannelNum,
    pub field: FieldId,
    pub unit: UnitId,
    pub source: Source,
    /// decimal places kept after decoding
    pub digits: u8,
}

impl ByteAssign {
    #[allow(clippy::too_many_arguments)]
    pub const fn bytes(
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
        unit: UnitId,
        start: u8,
        len: u8,
        divisor: u16,
        signed: bool,
        digits: u8,
    ) -> Self {
        Self {
            channel_type,
            channel,
            field,
            unit,
            source: Source::Bytes {
                start,
                len,
                divisor,
                signed,
            },
            digits,
        }
    }

    pub const fn calc(
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
        unit: UnitId,
        func: CalcFn,
        arg: ChannelNum,
        digits: u8,
    ) -> Self {
        Self {
            channel_type,
            channel,
            field,
            unit,
            source: Source::Calc { func, arg },
            digits,
        }
    }

    pub fn key(&self) -> ChannelField {
        ChannelField(self.channel_type, self.channel, self.field)
    }

    pub fn is_calc(&self) -> bool {
        matches!(self.source, Source::Calc { .. })
    }

    /// One past the last byte this descriptor reads, 0 for computed fields.
    pub fn end(&self) -> usize {
        match self.source {
            Source::Bytes { start, len, .. } => start as usize + len as usize,
            Source::Calc { .. } => 0,
        }
    }

    /// Record bytes backing this field, `None` for computed fields.
    pub fn byte_range(&self) -> Option<std::ops::Range<usize>> {
        match self.source {
            Source::Bytes { start, .. } => Some(start as usize..self.end()),
            Source::Calc { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ChannelField(pub ChannelType, pub ChannelNum, pub FieldId);

/// Validated, immutable layout for one inverter model.
#[derive(Clone, Debug)]
pub struct ByteAssignment {
    entries: Vec<ByteAssign>,
    index: HashMap<ChannelField, usize>,
    expected_byte_count: usize,
}

impl ByteAssignment {
    /// Validates every descriptor up front so decoding never meets an
    /// unsupported width or an out of range read.
    pub fn new(entries: &[ByteAssign]) -> Result<Self, StatisticsError> {
        let mut index = HashMap::with_capacity(entries.len());
        let mut expected_byte_count = 0;

        for (i, entry) in entries.iter().enumerate() {
            if let Source::Bytes { len, divisor, .. } = entry.source {
                if !matches!(len, 1 | 2 | 4) {
                    return Err(StatisticsError::InvalidWidth {
                        index: i,
                        width: len,
                    });
                }
                if divisor == 0 {
                    return Err(StatisticsError::ZeroDivisor { index: i });
                }
                if entry.end() > STATISTIC_PACKET_SIZE {
                    return Err(StatisticsError::OutOfBounds {
                        index: i,
                        start: entry.end() - len as usize,
                        end: entry.end(),
                        capacity: STATISTIC_PACKET_SIZE,
                    });
                }
                expected_byte_count = expected_byte_count.max(entry.end());
            }

            // first descriptor wins on duplicates, matching lookup order
            index.entry(entry.key()).or_insert(i);
        }

        Ok(Self {
            entries: entries.to_vec(),
            index,
            expected_byte_count,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ByteAssign] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ByteAssign> {
        self.entries.iter()
    }

    pub fn position(&self, key: ChannelField) -> Option<usize> {
        self.index.get(&key).copied()
    }

    pub fn find(&self, key: ChannelField) -> Option<&ByteAssign> {
        self.position(key).map(|i| &self.entries[i])
    }

    /// Number of record bytes needed to cover every byte-backed field.
    pub fn expected_byte_count(&self) -> usize {
        self.expected_byte_count
    }

    /// Channel types in table order, duplicates dropped.
    pub fn channel_types(&self) -> Vec<ChannelType> {
        let mut types = Vec::new();
        for entry in &self.entries {
            if !types.contains(&entry.channel_type) {
                types.push(entry.channel_type);
            }
        }
        types
    }

    /// Channels of `channel_type` in table order, duplicates dropped.
    pub fn channels_by_type(&self, channel_type: ChannelType) -> Vec<ChannelNum> {
        let mut channels = Vec::new();
        for entry in self.entries.iter().filter(|e| e.channel_type == channel_type) {
            if !channels.contains(&entry.channel) {
                channels.push(entry.channel);
            }
        }
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChannelNum::*;
    use ChannelType::*;

    #[test]
    fn rejects_unsupported_width() {
        let table = [
            ByteAssign::bytes(Dc, Ch1, FieldId::Udc, UnitId::V, 2, 2, 10, false, 1),
            ByteAssign::bytes(Dc, Ch1, FieldId::Idc, UnitId::A, 4, 3, 100, false, 2),
        ];
        assert_eq!(
            ByteAssignment::new(&table).unwrap_err(),
            StatisticsError::InvalidWidth { index: 1, width: 3 }
        );
    }

    #[test]
    fn rejects_read_past_buffer() {
        let table = [ByteAssign::bytes(Dc, Ch1, FieldId::Udc, UnitId::V, 110, 4, 10, false, 1)];
        assert!(matches!(
            ByteAssignment::new(&table),
            Err(StatisticsError::OutOfBounds { index: 0, .. })
        ));
    }

    #[test]
    fn expected_byte_count_ignores_calc_fields() {
        let table = [
            ByteAssign::bytes(Dc, Ch1, FieldId::YieldTotal, UnitId::KWh, 8, 4, 1000, false, 3),
            ByteAssign::bytes(Dc, Ch1, FieldId::Udc, UnitId::V, 2, 2, 10, false, 1),
            ByteAssign::calc(Inv, Ch0, FieldId::Pdc, UnitId::W, CalcFn::TotalDcPower, Ch0, 1),
        ];
        let assignment = ByteAssignment::new(&table).unwrap();
        assert_eq!(assignment.expected_byte_count(), 12);
    }

    #[test]
    fn enumerates_in_table_order() {
        let table = [
            ByteAssign::bytes(Dc, Ch2, FieldId::Udc, UnitId::V, 0, 2, 10, false, 1),
            ByteAssign::bytes(Ac, Ch0, FieldId::Uac, UnitId::V, 2, 2, 10, false, 1),
            ByteAssign::bytes(Dc, Ch1, FieldId::Udc, UnitId::V, 4, 2, 10, false, 1),
            ByteAssign::bytes(Dc, Ch2, FieldId::Idc, UnitId::A, 6, 2, 100, false, 2),
        ];
        let assignment = ByteAssignment::new(&table).unwrap();
        assert_eq!(assignment.channel_types(), vec![Dc, Ac]);
        assert_eq!(assignment.channels_by_type(Dc), vec![Ch2, Ch1]);
        assert!(assignment.channels_by_type(Inv).is_empty());
    }
}
