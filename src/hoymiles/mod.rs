pub mod byte_assign;
pub mod calc;
pub mod channel;
pub mod decoder;
pub mod fields;
pub mod fragment;
pub mod inverter;
pub mod models;
pub mod report;
pub mod statistics;
pub mod store;
pub mod units;
pub mod yield_day;

pub use byte_assign::{ByteAssign, ByteAssignment, CalcFn, ChannelField, Source};
pub use channel::{ChannelNum, ChannelType, CH_CNT};
pub use fields::FieldId;
pub use fragment::STATISTIC_PACKET_SIZE;
pub use models::InverterModel;
pub use report::LiveData;
pub use statistics::{Statistics, StatisticsParser};
pub use units::UnitId;
