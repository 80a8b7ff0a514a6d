use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum UnitId {
    V = 0,
    A,
    W,
    Wh,
    KWh,
    Hz,
    C,
    Pct,
    Var,
    None,
}

impl UnitId {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::V => "V",
            Self::A => "A",
            Self::W => "W",
            Self::Wh => "Wh",
            Self::KWh => "kWh",
            Self::Hz => "Hz",
            Self::C => "°C",
            Self::Pct => "%",
            Self::Var => "var",
            Self::None => "",
        }
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
