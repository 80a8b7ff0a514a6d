use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

// number of addressable channels, CH0 included
pub const CH_CNT: usize = 6;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Ac = 0,
    Dc,
    Inv,
}

impl ChannelType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ac => "AC",
            Self::Dc => "DC",
            Self::Inv => "INV",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Channel within a channel type.
///
/// `Ch0` is the inverter level channel carrying frequency, the AC side and
/// temperature. `Ch1`..`Ch5` address the individual inputs or phases.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ChannelNum {
    Ch0 = 0,
    Ch1,
    Ch2,
    Ch3,
    Ch4,
    Ch5,
}

impl ChannelNum {
    pub const ALL: [ChannelNum; CH_CNT] = [
        Self::Ch0,
        Self::Ch1,
        Self::Ch2,
        Self::Ch3,
        Self::Ch4,
        Self::Ch5,
    ];

    pub fn index(&self) -> usize {
        u8::from(*self) as usize
    }
}

impl std::fmt::Display for ChannelNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

// serialised as the bare channel number, which is what config files and
// live data consumers use
impl Serialize for ChannelNum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(u8::from(*self))
    }
}

impl<'de> Deserialize<'de> for ChannelNum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let n = u8::deserialize(deserializer)?;
        Self::try_from(n).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_num_is_bounds_checked() {
        assert_eq!(ChannelNum::try_from(5u8).unwrap(), ChannelNum::Ch5);
        assert!(ChannelNum::try_from(CH_CNT as u8).is_err());
    }

    #[test]
    fn channel_type_names() {
        assert_eq!(ChannelType::Ac.to_string(), "AC");
        assert_eq!(ChannelType::Dc.name(), "DC");
        assert_eq!(ChannelType::Inv.name(), "INV");
    }

    #[test]
    fn channel_num_deserializes_from_number() {
        let ch: ChannelNum = serde_yaml::from_str("3").unwrap();
        assert_eq!(ch, ChannelNum::Ch3);
        assert!(serde_yaml::from_str::<ChannelNum>("9").is_err());
    }
}
