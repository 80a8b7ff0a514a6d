use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    Udc = 0,
    Idc,
    Pdc,
    YieldDay,
    YieldTotal,
    Uac,
    Iac,
    Pac,
    Frequency,
    Temperature,
    PowerFactor,
    Efficiency,
    Irradiation,
    ReactivePower,
    EventLogCount,
    // three-phase models only
    Uac1N,
    Uac2N,
    Uac3N,
    Uac12,
    Uac23,
    Uac31,
    Iac1,
    Iac2,
    Iac3,
}

impl FieldId {
    /// Display name as presented to the reporting layer.
    ///
    /// DC and AC variants of voltage/current/power share a name; the
    /// channel type disambiguates them.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Udc | Self::Uac => "Voltage",
            Self::Idc | Self::Iac => "Current",
            Self::Pdc | Self::Pac => "Power",
            Self::YieldDay => "YieldDay",
            Self::YieldTotal => "YieldTotal",
            Self::Frequency => "Frequency",
            Self::Temperature => "Temperature",
            Self::PowerFactor => "PowerFactor",
            Self::Efficiency => "Efficiency",
            Self::Irradiation => "Irradiation",
            Self::ReactivePower => "ReactivePower",
            Self::EventLogCount => "EventLogCount",
            Self::Uac1N => "Voltage Ph1-N",
            Self::Uac2N => "Voltage Ph2-N",
            Self::Uac3N => "Voltage Ph3-N",
            Self::Uac12 => "Voltage Ph1-Ph2",
            Self::Uac23 => "Voltage Ph2-Ph3",
            Self::Uac31 => "Voltage Ph3-Ph1",
            Self::Iac1 => "Current Ph1",
            Self::Iac2 => "Current Ph2",
            Self::Iac3 => "Current Ph3",
        }
    }

    /// Fields that only make sense while the inverter is producing.
    /// Cleared by `zero_runtime_data`.
    pub const RUNTIME: [FieldId; 21] = [
        Self::Udc,
        Self::Idc,
        Self::Pdc,
        Self::Uac,
        Self::Iac,
        Self::Pac,
        Self::Frequency,
        Self::Temperature,
        Self::PowerFactor,
        Self::Efficiency,
        Self::Irradiation,
        Self::ReactivePower,
        Self::Uac1N,
        Self::Uac2N,
        Self::Uac3N,
        Self::Uac12,
        Self::Uac23,
        Self::Uac31,
        Self::Iac1,
        Self::Iac2,
        Self::Iac3,
    ];

    pub const DAILY: [FieldId; 1] = [Self::YieldDay];
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
