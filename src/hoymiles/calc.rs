use crate::hoymiles::byte_assign::{CalcFn, ChannelField, Source};
use crate::hoymiles::decoder::round_to_digits;
use crate::hoymiles::store::ChannelFieldStore;
use crate::hoymiles::{ChannelNum, ChannelType, FieldId, CH_CNT};

/// Sum over the present values, absent ones counting as zero. `None` when
/// nothing is present.
fn sum_present(values: impl IntoIterator<Item = Option<f32>>) -> Option<f32> {
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

fn sum_dc(store: &ChannelFieldStore, field: FieldId) -> Option<f32> {
    sum_present(
        store
            .channels_by_type(ChannelType::Dc)
            .into_iter()
            .map(|ch| store.value(ChannelField(ChannelType::Dc, ch, field))),
    )
}

/// Evaluates one derived field from values already in `store`.
///
/// Absent inputs count as zero as long as at least one input is present;
/// with no input decoded yet the field stays absent.
pub fn calculate(
    func: CalcFn,
    arg: ChannelNum,
    store: &ChannelFieldStore,
    string_max_power: &[u16; CH_CNT],
) -> Option<f32> {
    match func {
        CalcFn::TotalYieldTotal => sum_dc(store, FieldId::YieldTotal),
        CalcFn::TotalYieldDay => sum_dc(store, FieldId::YieldDay),
        CalcFn::ChannelDcVoltage => store.value(ChannelField(ChannelType::Dc, arg, FieldId::Udc)),
        CalcFn::TotalDcPower => sum_dc(store, FieldId::Pdc),
        CalcFn::TotalEfficiency => {
            let ac_power = store.value(ChannelField(ChannelType::Ac, ChannelNum::Ch0, FieldId::Pac));
            let dc_power = sum_dc(store, FieldId::Pdc);
            if ac_power.is_none() && dc_power.is_none() {
                return None;
            }
            let (ac_power, dc_power) = (ac_power.unwrap_or(0.0), dc_power.unwrap_or(0.0));
            Some(if dc_power > 0.0 {
                ac_power / dc_power * 100.0
            } else {
                0.0
            })
        }
        CalcFn::ChannelIrradiation => {
            let dc_power = store.value(ChannelField(ChannelType::Dc, arg, FieldId::Pdc))?;
            let max_power = string_max_power[arg.index()];
            Some(if max_power > 0 {
                dc_power / max_power as f32 * 100.0
            } else {
                0.0
            })
        }
        CalcFn::TotalAcCurrent => sum_present(
            [FieldId::Iac1, FieldId::Iac2, FieldId::Iac3]
                .into_iter()
                .map(|field| store.value(ChannelField(ChannelType::Ac, ChannelNum::Ch0, field))),
        ),
    }
}

/// Second pass over the layout: refreshes every computed field. Must run
/// after all byte-backed fields of the cycle have been decoded.
pub fn run(store: &mut ChannelFieldStore, string_max_power: &[u16; CH_CNT]) {
    let Some(assignment) = store.assignment() else {
        return;
    };

    let computed: Vec<(usize, Option<f32>)> = assignment
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| match entry.source {
            Source::Calc { func, arg } => Some((
                i,
                calculate(func, arg, store, string_max_power)
                    .map(|v| round_to_digits(v as f64, entry.digits)),
            )),
            Source::Bytes { .. } => None,
        })
        .collect();

    for (i, value) in computed {
        store.set_at(i, value);
    }
}
