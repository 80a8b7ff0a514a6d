use serde::{Deserialize, Serialize};

use crate::hoymiles::byte_assign::{ByteAssign, CalcFn};
use crate::hoymiles::inverter::Serial;
use crate::hoymiles::{ChannelNum::*, ChannelType::*, FieldId as F, UnitId as U};

/// Supported inverter families, each with its own statistics layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum InverterModel {
    /// HM-300, HM-350, HM-400
    #[serde(rename = "hm-1ch")]
    Hm1Ch,
    /// HM-600, HM-700, HM-800
    #[serde(rename = "hm-2ch")]
    Hm2Ch,
    /// HM-1000, HM-1200, HM-1500
    #[serde(rename = "hm-4ch")]
    Hm4Ch,
    /// HMT-1600, HMT-1800, three-phase
    #[serde(rename = "hmt-4ch")]
    Hmt4Ch,
}

impl InverterModel {
    /// Identifies the family from the first four hex digits of the serial.
    pub fn from_serial(serial: Serial) -> Option<Self> {
        match serial.prefix() {
            0x1121 | 0x1125 => Some(Self::Hm1Ch),
            0x1141 | 0x1145 => Some(Self::Hm2Ch),
            0x1161 | 0x1165 => Some(Self::Hm4Ch),
            0x1361 => Some(Self::Hmt4Ch),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hm1Ch => "HM-1CH",
            Self::Hm2Ch => "HM-2CH",
            Self::Hm4Ch => "HM-4CH",
            Self::Hmt4Ch => "HMT-4CH",
        }
    }

    pub fn byte_assignment(&self) -> &'static [ByteAssign] {
        match self {
            Self::Hm1Ch => HM_1CH,
            Self::Hm2Ch => HM_2CH,
            Self::Hm4Ch => HM_4CH,
            Self::Hmt4Ch => HMT_4CH,
        }
    }
}

impl std::fmt::Display for InverterModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const TOTALS: [ByteAssign; 4] = [
    ByteAssign::calc(Inv, Ch0, F::YieldDay, U::Wh, CalcFn::TotalYieldDay, Ch0, 0),
    ByteAssign::calc(Inv, Ch0, F::YieldTotal, U::KWh, CalcFn::TotalYieldTotal, Ch0, 3),
    ByteAssign::calc(Inv, Ch0, F::Pdc, U::W, CalcFn::TotalDcPower, Ch0, 1),
    ByteAssign::calc(Inv, Ch0, F::Efficiency, U::Pct, CalcFn::TotalEfficiency, Ch0, 3),
];

pub const HM_1CH: &[ByteAssign] = &[
    ByteAssign::bytes(Dc, Ch1, F::Udc, U::V, 2, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch1, F::Idc, U::A, 4, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch1, F::Pdc, U::W, 6, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch1, F::YieldDay, U::Wh, 12, 2, 1, false, 0),
    ByteAssign::bytes(Dc, Ch1, F::YieldTotal, U::KWh, 8, 4, 1000, false, 3),
    ByteAssign::calc(Dc, Ch1, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch1, 3),
    ByteAssign::bytes(Ac, Ch0, F::Uac, U::V, 14, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Iac, U::A, 22, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::Pac, U::W, 18, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::ReactivePower, U::Var, 20, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Frequency, U::Hz, 16, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::PowerFactor, U::None, 24, 2, 1000, false, 3),
    ByteAssign::bytes(Inv, Ch0, F::Temperature, U::C, 26, 2, 10, true, 1),
    ByteAssign::bytes(Inv, Ch0, F::EventLogCount, U::None, 28, 2, 1, false, 0),
    TOTALS[0],
    TOTALS[1],
    TOTALS[2],
    TOTALS[3],
];

pub const HM_2CH: &[ByteAssign] = &[
    ByteAssign::bytes(Dc, Ch1, F::Udc, U::V, 2, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch1, F::Idc, U::A, 4, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch1, F::Pdc, U::W, 6, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch1, F::YieldDay, U::Wh, 22, 2, 1, false, 0),
    ByteAssign::bytes(Dc, Ch1, F::YieldTotal, U::KWh, 14, 4, 1000, false, 3),
    ByteAssign::calc(Dc, Ch1, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch1, 3),
    ByteAssign::bytes(Dc, Ch2, F::Udc, U::V, 8, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch2, F::Idc, U::A, 10, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch2, F::Pdc, U::W, 12, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch2, F::YieldDay, U::Wh, 24, 2, 1, false, 0),
    ByteAssign::bytes(Dc, Ch2, F::YieldTotal, U::KWh, 18, 4, 1000, false, 3),
    ByteAssign::calc(Dc, Ch2, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch2, 3),
    ByteAssign::bytes(Ac, Ch0, F::Uac, U::V, 26, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Iac, U::A, 34, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::Pac, U::W, 30, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::ReactivePower, U::Var, 32, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Frequency, U::Hz, 28, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::PowerFactor, U::None, 36, 2, 1000, false, 3),
    ByteAssign::bytes(Inv, Ch0, F::Temperature, U::C, 38, 2, 10, true, 1),
    ByteAssign::bytes(Inv, Ch0, F::EventLogCount, U::None, 40, 2, 1, false, 0),
    TOTALS[0],
    TOTALS[1],
    TOTALS[2],
    TOTALS[3],
];

// inputs are paired, the second input of a pair reports no voltage of its own
pub const HM_4CH: &[ByteAssign] = &[
    ByteAssign::bytes(Dc, Ch1, F::Udc, U::V, 2, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch1, F::Idc, U::A, 4, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch1, F::Pdc, U::W, 8, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch1, F::YieldDay, U::Wh, 20, 2, 1, false, 0),
    ByteAssign::bytes(Dc, Ch1, F::YieldTotal, U::KWh, 12, 4, 1000, false, 3),
    ByteAssign::calc(Dc, Ch1, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch1, 3),
    ByteAssign::calc(Dc, Ch2, F::Udc, U::V, CalcFn::ChannelDcVoltage, Ch1, 1),
    ByteAssign::bytes(Dc, Ch2, F::Idc, U::A, 6, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch2, F::Pdc, U::W, 10, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch2, F::YieldDay, U::Wh, 22, 2, 1, false, 0),
    ByteAssign::bytes(Dc, Ch2, F::YieldTotal, U::KWh, 16, 4, 1000, false, 3),
    ByteAssign::calc(Dc, Ch2, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch2, 3),
    ByteAssign::bytes(Dc, Ch3, F::Udc, U::V, 24, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch3, F::Idc, U::A, 26, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch3, F::Pdc, U::W, 30, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch3, F::YieldDay, U::Wh, 42, 2, 1, false, 0),
    ByteAssign::bytes(Dc, Ch3, F::YieldTotal, U::KWh, 34, 4, 1000, false, 3),
    ByteAssign::calc(Dc, Ch3, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch3, 3),
    ByteAssign::calc(Dc, Ch4, F::Udc, U::V, CalcFn::ChannelDcVoltage, Ch3, 1),
    ByteAssign::bytes(Dc, Ch4, F::Idc, U::A, 28, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch4, F::Pdc, U::W, 32, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch4, F::YieldDay, U::Wh, 44, 2, 1, false, 0),
    ByteAssign::bytes(Dc, Ch4, F::YieldTotal, U::KWh, 38, 4, 1000, false, 3),
    ByteAssign::calc(Dc, Ch4, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch4, 3),
    ByteAssign::bytes(Ac, Ch0, F::Uac, U::V, 46, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Iac, U::A, 54, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::Pac, U::W, 50, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::ReactivePower, U::Var, 52, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Frequency, U::Hz, 48, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::PowerFactor, U::None, 56, 2, 1000, false, 3),
    ByteAssign::bytes(Inv, Ch0, F::Temperature, U::C, 58, 2, 10, true, 1),
    ByteAssign::bytes(Inv, Ch0, F::EventLogCount, U::None, 60, 2, 1, false, 0),
    TOTALS[0],
    TOTALS[1],
    TOTALS[2],
    TOTALS[3],
];

pub const HMT_4CH: &[ByteAssign] = &[
    ByteAssign::bytes(Dc, Ch1, F::Udc, U::V, 2, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch1, F::Idc, U::A, 4, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch1, F::Pdc, U::W, 8, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch1, F::YieldTotal, U::KWh, 12, 4, 1000, false, 3),
    ByteAssign::bytes(Dc, Ch1, F::YieldDay, U::Wh, 20, 2, 1, false, 0),
    ByteAssign::calc(Dc, Ch1, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch1, 3),
    ByteAssign::calc(Dc, Ch2, F::Udc, U::V, CalcFn::ChannelDcVoltage, Ch1, 1),
    ByteAssign::bytes(Dc, Ch2, F::Idc, U::A, 6, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch2, F::Pdc, U::W, 10, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch2, F::YieldTotal, U::KWh, 16, 4, 1000, false, 3),
    ByteAssign::bytes(Dc, Ch2, F::YieldDay, U::Wh, 22, 2, 1, false, 0),
    ByteAssign::calc(Dc, Ch2, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch2, 3),
    ByteAssign::bytes(Dc, Ch3, F::Udc, U::V, 24, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch3, F::Idc, U::A, 26, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch3, F::Pdc, U::W, 30, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch3, F::YieldTotal, U::KWh, 34, 4, 1000, false, 3),
    ByteAssign::bytes(Dc, Ch3, F::YieldDay, U::Wh, 42, 2, 1, false, 0),
    ByteAssign::calc(Dc, Ch3, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch3, 3),
    ByteAssign::calc(Dc, Ch4, F::Udc, U::V, CalcFn::ChannelDcVoltage, Ch3, 1),
    ByteAssign::bytes(Dc, Ch4, F::Idc, U::A, 28, 2, 100, false, 2),
    ByteAssign::bytes(Dc, Ch4, F::Pdc, U::W, 32, 2, 10, false, 1),
    ByteAssign::bytes(Dc, Ch4, F::YieldTotal, U::KWh, 38, 4, 1000, false, 3),
    ByteAssign::bytes(Dc, Ch4, F::YieldDay, U::Wh, 44, 2, 1, false, 0),
    ByteAssign::calc(Dc, Ch4, F::Irradiation, U::Pct, CalcFn::ChannelIrradiation, Ch4, 3),
    ByteAssign::bytes(Ac, Ch0, F::Uac1N, U::V, 46, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Uac2N, U::V, 48, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Uac3N, U::V, 50, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Uac12, U::V, 52, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Uac23, U::V, 54, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Uac31, U::V, 56, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::Frequency, U::Hz, 58, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::Pac, U::W, 60, 2, 10, false, 1),
    ByteAssign::bytes(Ac, Ch0, F::ReactivePower, U::Var, 62, 2, 10, true, 1),
    ByteAssign::bytes(Ac, Ch0, F::Iac1, U::A, 64, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::Iac2, U::A, 66, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::Iac3, U::A, 68, 2, 100, false, 2),
    ByteAssign::bytes(Ac, Ch0, F::PowerFactor, U::None, 70, 2, 1000, true, 3),
    ByteAssign::calc(Ac, Ch0, F::Iac, U::A, CalcFn::TotalAcCurrent, Ch0, 2),
    ByteAssign::bytes(Inv, Ch0, F::Temperature, U::C, 72, 2, 10, true, 1),
    ByteAssign::bytes(Inv, Ch0, F::EventLogCount, U::None, 74, 2, 1, false, 0),
    TOTALS[0],
    TOTALS[1],
    TOTALS[2],
    TOTALS[3],
];
