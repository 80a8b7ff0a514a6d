use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StatisticsError;
use crate::hoymiles::byte_assign::{ByteAssign, ByteAssignment, ChannelField};
use crate::hoymiles::fragment::FragmentAssembler;
use crate::hoymiles::models::InverterModel;
use crate::hoymiles::store::{ChannelFieldStore, FieldSetting};
use crate::hoymiles::yield_day::YieldDayCorrector;
use crate::hoymiles::{calc, decoder, ChannelNum, ChannelType, FieldId, CH_CNT};

/// Count of failed or incomplete receptions, only reset explicitly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RxFailureCounter(u32);

impl RxFailureCounter {
    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

/// Statistics for a single inverter: reassembles a record, decodes it
/// through the model layout and keeps the resulting channel values.
#[derive(Clone, Debug, Default)]
pub struct StatisticsParser {
    assembler: FragmentAssembler,
    store: ChannelFieldStore,
    yield_day: YieldDayCorrector,
    string_max_power: [u16; CH_CNT],
    rx_failures: RxFailureCounter,
    last_update: Option<DateTime<Utc>>,
    last_update_from_internal: Option<DateTime<Utc>>,
}

impl StatisticsParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_model(model: InverterModel) -> Result<Self, StatisticsError> {
        let mut parser = Self::new();
        parser.set_byte_assignment(model.byte_assignment())?;
        Ok(parser)
    }

    /// Binds the layout of the identified model. Fails on descriptors the
    /// decoder cannot handle, leaving the previous layout in place.
    pub fn set_byte_assignment(&mut self, entries: &[ByteAssign]) -> Result<(), StatisticsError> {
        let assignment = ByteAssignment::new(entries)?;
        debug!(
            "byte assignment with {} fields, {} bytes expected",
            assignment.len(),
            assignment.expected_byte_count()
        );
        self.store.set_assignment(assignment);
        Ok(())
    }

    pub fn byte_assignment(&self) -> Option<&ByteAssignment> {
        self.store.assignment()
    }

    pub fn expected_byte_count(&self) -> usize {
        self.store
            .assignment()
            .map(|a| a.expected_byte_count())
            .unwrap_or(0)
    }

    // Reception cycle {{{
    pub fn clear_buffer(&mut self) {
        self.assembler.reset();
    }

    pub fn append_fragment(&mut self, offset: u8, payload: &[u8]) -> Result<(), StatisticsError> {
        self.assembler.append(offset, payload).map_err(|err| {
            warn!("rejecting fragment: {}", err);
            self.rx_failures.increment();
            err
        })
    }

    pub fn end_append_fragment(&mut self) -> Result<(), StatisticsError> {
        self.end_append_fragment_at(Utc::now())
    }

    /// Finalizes the record and runs the decode, correction and
    /// calculation passes.
    ///
    /// An incomplete record, short or with a missing fragment, is decoded
    /// as far as it goes; fields not fully received become absent and
    /// `MalformedRecord` is returned.
    pub fn end_append_fragment_at(&mut self, now: DateTime<Utc>) -> Result<(), StatisticsError> {
        if let Err(err) = self.assembler.finalize() {
            warn!("cannot finalize record: {}", err);
            self.rx_failures.increment();
            return Err(err);
        }

        let Some(assignment) = self.store.assignment().cloned() else {
            self.rx_failures.increment();
            return Err(StatisticsError::NoByteAssignment);
        };

        let mut decoded = 0;
        for (i, entry) in assignment.iter().enumerate() {
            let Some(range) = entry.byte_range() else {
                continue;
            };

            let value = if self.assembler.covers(range) {
                decoder::decode(entry, self.assembler.record())
            } else {
                None
            };
            let value = value.map(|raw| {
                let mut value = raw + self.store.offset(entry.key());
                if entry.channel_type == ChannelType::Dc
                    && entry.field == FieldId::YieldDay
                    && entry.channel != ChannelNum::Ch0
                {
                    value = self.yield_day.correct(entry.channel, value);
                }
                value
            });
            decoded += value.is_some() as usize;
            self.store.set_at(i, value);
        }

        calc::run(&mut self.store, &self.string_max_power);

        self.last_update = Some(now);
        self.last_update_from_internal = Some(now);

        let expected = assignment.expected_byte_count();
        let received = self.assembler.received_within(expected);
        debug!("decoded {} fields from {} of {} bytes", decoded, received, expected);

        if received < expected {
            warn!("incomplete statistics record: {} of {} bytes", received, expected);
            self.rx_failures.increment();
            return Err(StatisticsError::MalformedRecord { received, expected });
        }

        Ok(())
    }

    /// Raw bytes of the current cycle.
    pub fn record(&self) -> &[u8] {
        self.assembler.record()
    }
    // }}}

    // Field access {{{
    pub fn assignment_by_channel_field(
        &self,
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
    ) -> Option<&ByteAssign> {
        self.store.descriptor(ChannelField(channel_type, channel, field))
    }

    pub fn setting_by_channel_field(
        &self,
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
    ) -> Option<&FieldSetting> {
        self.store.setting(ChannelField(channel_type, channel, field))
    }

    pub fn channel_field_value(&self, channel_type: ChannelType, channel: ChannelNum, field: FieldId) -> Option<f32> {
        self.store.value(ChannelField(channel_type, channel, field))
    }

    /// Value formatted with the field's number of decimal places.
    pub fn channel_field_value_string(
        &self,
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
    ) -> Option<String> {
        let digits = self.channel_field_digits(channel_type, channel, field)?;
        let value = self.channel_field_value(channel_type, channel, field)?;
        Some(format!("{:.*}", digits as usize, value))
    }

    pub fn has_channel_field_value(&self, channel_type: ChannelType, channel: ChannelNum, field: FieldId) -> bool {
        self.store.has_value(ChannelField(channel_type, channel, field))
    }

    pub fn channel_field_unit(
        &self,
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
    ) -> Option<&'static str> {
        self.assignment_by_channel_field(channel_type, channel, field)
            .map(|a| a.unit.symbol())
    }

    pub fn channel_field_name(
        &self,
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
    ) -> Option<&'static str> {
        self.assignment_by_channel_field(channel_type, channel, field)
            .map(|a| a.field.name())
    }

    pub fn channel_field_digits(&self, channel_type: ChannelType, channel: ChannelNum, field: FieldId) -> Option<u8> {
        self.assignment_by_channel_field(channel_type, channel, field)
            .map(|a| a.digits)
    }

    pub fn set_channel_field_value(
        &mut self,
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
        value: f32,
    ) -> Result<(), StatisticsError> {
        self.set_channel_field_value_at(channel_type, channel, field, value, Utc::now())
    }

    /// Injects a value without touching the raw record, e.g. for manually
    /// entered data. Computed fields are refreshed afterwards and `now`
    /// becomes the internal update time.
    pub fn set_channel_field_value_at(
        &mut self,
        channel_type: ChannelType,
        channel: ChannelNum,
        field: FieldId,
        value: f32,
        now: DateTime<Utc>,
    ) -> Result<(), StatisticsError> {
        let key = ChannelField(channel_type, channel, field);
        let (index, is_calc) = self
            .store
            .position(key)
            .zip(self.store.descriptor(key).map(|a| a.is_calc()))
            .ok_or(StatisticsError::MissingDescriptor {
                channel_type,
                channel,
                field,
            })?;
        if is_calc {
            return Err(StatisticsError::ComputedField {
                channel_type,
                channel,
                field,
            });
        }

        self.store.set_at(index, Some(value));
        calc::run(&mut self.store, &self.string_max_power);
        self.last_update_from_internal = Some(now);
        Ok(())
    }

    pub fn channel_field_offset(&self, channel_type: ChannelType, channel: ChannelNum, field: FieldId) -> f32 {
        self.store.offset(ChannelField(channel_type, channel, field))
    }

    /// Takes effect from the next decoded record.
    pub fn set_channel_field_offset(&mut self, channel_type: ChannelType, channel: ChannelNum, field: FieldId, offset: f32) {
        self.store
            .set_offset(ChannelField(channel_type, channel, field), offset);
    }

    pub fn channel_types(&self) -> Vec<ChannelType> {
        self.store.channel_types()
    }

    pub fn channel_type_name(&self, channel_type: ChannelType) -> &'static str {
        channel_type.name()
    }

    pub fn channels_by_type(&self, channel_type: ChannelType) -> Vec<ChannelNum> {
        self.store.channels_by_type(channel_type)
    }
    // }}}

    // Local configuration {{{
    pub fn string_max_power(&self, channel: u8) -> Option<u16> {
        self.string_max_power.get(channel as usize).copied()
    }

    pub fn set_string_max_power(&mut self, channel: u8, power: u16) -> Result<(), StatisticsError> {
        let slot = self
            .string_max_power
            .get_mut(channel as usize)
            .ok_or(StatisticsError::InvalidChannel(channel))?;
        *slot = power;
        calc::run(&mut self.store, &self.string_max_power);
        Ok(())
    }

    pub fn yield_day_correction(&self) -> bool {
        self.yield_day.enabled()
    }

    pub fn set_yield_day_correction(&mut self, enabled: bool) {
        self.yield_day.set_enabled(enabled);
    }
    // }}}

    // Health {{{
    pub fn rx_failure_count(&self) -> u32 {
        self.rx_failures.get()
    }

    pub fn increment_rx_failure_count(&mut self) {
        self.rx_failures.increment();
    }

    pub fn reset_rx_failure_count(&mut self) {
        self.rx_failures.reset();
    }
    // }}}

    // Housekeeping {{{
    pub fn zero_runtime_data(&mut self) {
        self.zero_runtime_data_at(Utc::now());
    }

    /// Zeroes values that mean nothing while the inverter is offline.
    /// Lifetime and daily yields are kept, as are fields never received.
    pub fn zero_runtime_data_at(&mut self, now: DateTime<Utc>) {
        self.zero_fields(&FieldId::RUNTIME, now);
    }

    pub fn zero_daily_data(&mut self) {
        self.zero_daily_data_at(Utc::now());
    }

    /// Zeroes runtime values and the daily yields. Lifetime yields are kept.
    pub fn zero_daily_data_at(&mut self, now: DateTime<Utc>) {
        self.zero_fields(&FieldId::RUNTIME, now);
        self.zero_fields(&FieldId::DAILY, now);
    }

    fn zero_fields(&mut self, fields: &[FieldId], now: DateTime<Utc>) {
        if self.store.zero_fields(fields) {
            calc::run(&mut self.store, &self.string_max_power);
            self.last_update_from_internal = Some(now);
        }
    }

    pub fn reset_yield_day_correction(&mut self) {
        self.yield_day.reset();
    }
    // }}}

    // Timestamps {{{
    /// Records new data from the inverter; also counts as an internal change.
    pub fn set_last_update(&mut self, at: DateTime<Utc>) {
        self.last_update = Some(at);
        self.last_update_from_internal = Some(at);
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn last_update_from_internal(&self) -> Option<DateTime<Utc>> {
        self.last_update_from_internal
    }

    pub fn set_last_update_from_internal(&mut self, at: DateTime<Utc>) {
        self.last_update_from_internal = Some(at);
    }
    // }}}
}

/// Shared handle to one inverter's statistics.
///
/// The reception path mutates through `write()` and holds the guard for a
/// whole decode cycle; readers take `read()` and see either the previous
/// or the next cycle in full.
#[derive(Clone, Debug, Default)]
pub struct Statistics(Arc<RwLock<StatisticsParser>>);

impl Statistics {
    pub fn new(parser: StatisticsParser) -> Self {
        Self(Arc::new(RwLock::new(parser)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, StatisticsParser> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, StatisticsParser> {
        self.0.write()
    }
}
