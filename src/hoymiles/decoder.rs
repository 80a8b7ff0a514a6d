use nom::bytes::complete::take;
use nom::combinator::{fail, map};
use nom::number::complete::{be_i16, be_i32, be_i8, be_u16, be_u32, be_u8};
use nom::IResult;

use crate::error::StatisticsError;
use crate::hoymiles::byte_assign::{ByteAssign, Source};

/// Reads one big-endian integer of `len` bytes.
fn raw_value(input: &[u8], len: u8, signed: bool) -> IResult<&[u8], i64> {
    match (len, signed) {
        (1, false) => map(be_u8, i64::from)(input),
        (1, true) => map(be_i8, i64::from)(input),
        (2, false) => map(be_u16, i64::from)(input),
        (2, true) => map(be_i16, i64::from)(input),
        (4, false) => map(be_u32, i64::from)(input),
        (4, true) => map(be_i32, i64::from)(input),
        _ => fail(input),
    }
}

fn field_at(record: &[u8], start: u8, len: u8, signed: bool) -> IResult<&[u8], i64> {
    let (input, _) = take::<_, _, nom::error::Error<&[u8]>>(start as usize)(record)?;
    raw_value(input, len, signed)
}

pub fn round_to_digits(value: f64, digits: u8) -> f32 {
    let factor = 10f64.powi(digits as i32);
    ((value * factor).round() / factor) as f32
}

/// Decodes a byte-backed field from `record`.
///
/// Returns `None` for computed descriptors and for fields lying (partly)
/// past the end of a short record.
pub fn decode(assign: &ByteAssign, record: &[u8]) -> Option<f32> {
    let Source::Bytes {
        start,
        len,
        divisor,
        signed,
    } = assign.source
    else {
        return None;
    };

    let (_, raw) = field_at(record, start, len, signed).ok()?;

    Some(round_to_digits(raw as f64 / divisor as f64, assign.digits))
}

/// Encodes `value` into the on-air representation of `assign`.
pub fn encode(assign: &ByteAssign, value: f32) -> Result<Vec<u8>, StatisticsError> {
    let Source::Bytes {
        len,
        divisor,
        signed,
        ..
    } = assign.source
    else {
        return Err(StatisticsError::ComputedField {
            channel_type: assign.channel_type,
            channel: assign.channel,
            field: assign.field,
        });
    };

    let scaled = (value as f64 * divisor as f64).round();
    let (min, max) = match (len, signed) {
        (1, false) => (0.0, u8::MAX as f64),
        (1, true) => (i8::MIN as f64, i8::MAX as f64),
        (2, false) => (0.0, u16::MAX as f64),
        (2, true) => (i16::MIN as f64, i16::MAX as f64),
        (4, false) => (0.0, u32::MAX as f64),
        (4, true) => (i32::MIN as f64, i32::MAX as f64),
        _ => return Err(StatisticsError::InvalidWidth { index: 0, width: len }),
    };
    if !scaled.is_finite() || scaled < min || scaled > max {
        return Err(StatisticsError::ValueOutOfRange { value, width: len });
    }

    // two's complement of the i64 keeps the low bytes right for both
    // signed and unsigned widths
    let bytes = (scaled as i64).to_be_bytes();
    Ok(bytes[8 - len as usize..].to_vec())
}

/// Encodes `value` straight into its slot of a record buffer.
pub fn encode_into(assign: &ByteAssign, value: f32, record: &mut [u8]) -> Result<(), StatisticsError> {
    let bytes = encode(assign, value)?;
    let start = assign.end() - bytes.len();
    let capacity = record.len();
    let slot = record
        .get_mut(start..assign.end())
        .ok_or(StatisticsError::Overflow {
            offset: start,
            len: bytes.len(),
            capacity,
        })?;
    slot.copy_from_slice(&bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hoymiles::{CalcFn, ChannelNum::*, ChannelType::*, FieldId, UnitId};

    fn assign(start: u8, len: u8, divisor: u16, signed: bool, digits: u8) -> ByteAssign {
        ByteAssign::bytes(Inv, Ch0, FieldId::Temperature, UnitId::C, start, len, divisor, signed, digits)
    }

    #[test]
    fn decodes_big_endian_unsigned() {
        let record = [0x00, 0x00, 0x01, 0x2c];
        assert_eq!(decode(&assign(2, 2, 10, false, 1), &record), Some(30.0));
        assert_eq!(decode(&assign(0, 4, 1, false, 0), &record), Some(300.0));
        assert_eq!(decode(&assign(3, 1, 1, false, 0), &record), Some(44.0));
    }

    #[test]
    fn decodes_twos_complement_when_signed() {
        let record = [0xff, 0x38];
        assert_eq!(decode(&assign(0, 2, 10, true, 1), &record), Some(-20.0));
        assert_eq!(decode(&assign(0, 2, 10, false, 1), &record), Some(6533.6));
        assert_eq!(decode(&assign(0, 1, 1, true, 0), &record), Some(-1.0));
    }

    #[test]
    fn rounds_to_declared_digits() {
        // 12346 / 1000 kept to two places
        let record = [0x30, 0x3a];
        assert_eq!(decode(&assign(0, 2, 1000, false, 2), &record), Some(12.35));
    }

    #[test]
    fn short_record_yields_none() {
        let record = [0x01, 0x02, 0x03];
        assert_eq!(decode(&assign(2, 2, 1, false, 0), &record), None);
    }

    #[test]
    fn calc_descriptors_are_not_decoded() {
        let calc = ByteAssign::calc(Inv, Ch0, FieldId::Pdc, UnitId::W, CalcFn::TotalDcPower, Ch0, 1);
        assert_eq!(decode(&calc, &[0; 16]), None);
        assert!(matches!(encode(&calc, 1.0), Err(StatisticsError::ComputedField { .. })));
    }

    #[test]
    fn round_trips_within_precision() {
        let cases: [(u8, u16, bool, u8, f32); 6] = [
            (1, 1, false, 0, 200.0),
            (1, 1, true, 0, -100.0),
            (2, 10, false, 1, 4321.7),
            (2, 100, true, 2, -12.34),
            (4, 1000, false, 3, 1234.567),
            (4, 10, true, 1, -98765.4),
        ];

        for (len, divisor, signed, digits, value) in cases {
            let a = assign(0, len, divisor, signed, digits);
            let mut record = [0u8; 8];
            encode_into(&a, value, &mut record).unwrap();
            let decoded = decode(&a, &record).unwrap();
            let unit = 1.0 / 10f32.powi(digits as i32);
            assert!(
                (decoded - value).abs() <= unit,
                "len={} signed={} value={} decoded={}",
                len,
                signed,
                value,
                decoded
            );
        }
    }

    #[test]
    fn encode_rejects_out_of_range() {
        assert!(matches!(
            encode(&assign(0, 1, 1, false, 0), 256.0),
            Err(StatisticsError::ValueOutOfRange { width: 1, .. })
        ));
        assert!(matches!(
            encode(&assign(0, 2, 10, false, 1), -1.0),
            Err(StatisticsError::ValueOutOfRange { .. })
        ));
    }
}
