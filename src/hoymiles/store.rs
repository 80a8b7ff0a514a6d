use crate::hoymiles::byte_assign::{ByteAssign, ByteAssignment, ChannelField};
use crate::hoymiles::{ChannelNum, ChannelType, FieldId};

/// Additive correction applied to a decoded field before it is stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSetting {
    pub channel_type: ChannelType,
    pub channel: ChannelNum,
    pub field: FieldId,
    pub offset: f32,
}

/// Decoded values keyed by (type, channel, field).
///
/// Values are stored by descriptor position, so a key with no descriptor
/// in the active layout can never hold a value.
#[derive(Clone, Debug, Default)]
pub struct ChannelFieldStore {
    assignment: Option<ByteAssignment>,
    values: Vec<Option<f32>>,
    settings: Vec<FieldSetting>,
}

impl ChannelFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a layout. Previously stored values are dropped since their
    /// positions no longer mean anything; offsets are kept.
    pub fn set_assignment(&mut self, assignment: ByteAssignment) {
        self.values = vec![None; assignment.len()];
        self.assignment = Some(assignment);
    }

    pub fn assignment(&self) -> Option<&ByteAssignment> {
        self.assignment.as_ref()
    }

    pub fn position(&self, key: ChannelField) -> Option<usize> {
        self.assignment.as_ref()?.position(key)
    }

    pub fn descriptor(&self, key: ChannelField) -> Option<&ByteAssign> {
        self.assignment.as_ref()?.find(key)
    }

    pub fn value(&self, key: ChannelField) -> Option<f32> {
        self.values[self.position(key)?]
    }

    pub fn has_value(&self, key: ChannelField) -> bool {
        self.value(key).is_some()
    }

    pub fn value_at(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied().flatten()
    }

    pub fn set_at(&mut self, index: usize, value: Option<f32>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    /// Forgets every stored value, e.g. on restart.
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = None);
    }

    /// Sets every decoded byte-backed field in `fields` to 0.0. Fields never
    /// decoded stay absent. Returns whether anything was touched.
    pub fn zero_fields(&mut self, fields: &[FieldId]) -> bool {
        let Some(assignment) = &self.assignment else {
            return false;
        };

        let mut touched = false;
        for (i, entry) in assignment.iter().enumerate() {
            if entry.is_calc() || !fields.contains(&entry.field) {
                continue;
            }
            if let Some(value) = self.values[i].as_mut() {
                *value = 0.0;
                touched = true;
            }
        }
        touched
    }

    pub fn setting(&self, key: ChannelField) -> Option<&FieldSetting> {
        self.settings
            .iter()
            .find(|s| ChannelField(s.channel_type, s.channel, s.field) == key)
    }

    pub fn offset(&self, key: ChannelField) -> f32 {
        self.setting(key).map(|s| s.offset).unwrap_or(0.0)
    }

    pub fn set_offset(&mut self, key: ChannelField, offset: f32) {
        let ChannelField(channel_type, channel, field) = key;
        match self
            .settings
            .iter_mut()
            .find(|s| ChannelField(s.channel_type, s.channel, s.field) == key)
        {
            Some(setting) => setting.offset = offset,
            None => self.settings.push(FieldSetting {
                channel_type,
                channel,
                field,
                offset,
            }),
        }
    }

    pub fn channel_types(&self) -> Vec<ChannelType> {
        self.assignment
            .as_ref()
            .map(|a| a.channel_types())
            .unwrap_or_default()
    }

    pub fn channels_by_type(&self, channel_type: ChannelType) -> Vec<ChannelNum> {
        self.assignment
            .as_ref()
            .map(|a| a.channels_by_type(channel_type))
            .unwrap_or_default()
    }
}
