use crate::prelude::*;

use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Periodic housekeeping on inverter statistics: clears daily values at
/// local midnight and runtime values of inverters that went quiet.
#[derive(Clone)]
pub struct Scheduler {
    config: ConfigWrapper,
    channels: Channels,
    inverters: Vec<(config::Inverter, Statistics)>,
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    day: Option<NaiveDate>,
    // last_update already zeroed for, per inverter
    zeroed_at: HashMap<Serial, DateTime<Utc>>,
}

impl Scheduler {
    pub fn new(config: ConfigWrapper, channels: Channels, inverters: Vec<(config::Inverter, Statistics)>) -> Self {
        Self {
            config,
            channels,
            inverters,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let period = std::time::Duration::from_secs(self.config.housekeeping_interval_secs());
        let mut interval = tokio::time::interval(period);
        let mut receiver = self.channels.to_inverter.subscribe();

        loop {
            tokio::select! {
                _ = interval.tick() => self.tick(Local::now()),
                msg = receiver.recv() => match msg {
                    Ok(crate::hoymiles::inverter::ChannelData::Shutdown)
                    | Err(broadcast::error::RecvError::Closed) => break,
                    _ => (),
                },
            }
        }

        debug!("scheduler stopped");
        Ok(())
    }

    pub fn tick(&self, now: DateTime<Local>) {
        let mut state = self.state.lock();

        let today = now.date_naive();
        let midnight = state.day.is_some_and(|day| day != today);
        state.day = Some(today);

        for (inverter, statistics) in &self.inverters {
            if midnight {
                let mut parser = statistics.write();
                if inverter.zero_yield_day_on_midnight() {
                    info!("inverter {}: new day, clearing daily values", inverter.serial());
                    parser.zero_daily_data_at(now.with_timezone(&Utc));
                }
                parser.reset_yield_day_correction();
            }

            if inverter.zero_runtime_data_if_unreachable() {
                Self::check_reachable(&mut state, inverter, statistics, now.with_timezone(&Utc));
            }
        }
    }

    fn check_reachable(state: &mut State, inverter: &config::Inverter, statistics: &Statistics, now: DateTime<Utc>) {
        let serial = inverter.serial();
        let Some(last_update) = statistics.read().last_update() else {
            return;
        };
        if state.zeroed_at.get(&serial) == Some(&last_update) {
            return;
        }

        let silent = now.signed_duration_since(last_update).num_seconds();
        if silent >= inverter.unreachable_after_secs() as i64 {
            info!("inverter {}: no data for {}s, clearing runtime values", serial, silent);
            statistics.write().zero_runtime_data_at(now);
            state.zeroed_at.insert(serial, last_update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hoymiles::{ChannelNum, ChannelType, FieldId};
    use chrono::TimeZone;

    const YAML: &str = r#"
inverters:
  - name: roof
    serial: "112183200001"
    zero_runtime_data_if_unreachable: true
    zero_yield_day_on_midnight: true
    unreachable_after_secs: 600
"#;

    fn scheduler() -> Result<(Scheduler, Statistics)> {
        scheduler_from(YAML)
    }

    fn scheduler_from(yaml: &str) -> Result<(Scheduler, Statistics)> {
        let config = Config::from_yaml(yaml)?;
        let config = ConfigWrapper::from_config(config);
        let inverter = config.inverters()[0].clone();
        let statistics = Statistics::new(inverter.statistics_parser()?);
        let scheduler = Scheduler::new(config, Channels::new(), vec![(inverter, statistics.clone())]);
        Ok((scheduler, statistics))
    }

    fn set(statistics: &Statistics, field: FieldId, value: f32) -> Result<()> {
        statistics
            .write()
            .set_channel_field_value(ChannelType::Dc, ChannelNum::Ch1, field, value)?;
        Ok(())
    }

    fn get(statistics: &Statistics, field: FieldId) -> Option<f32> {
        statistics
            .read()
            .channel_field_value(ChannelType::Dc, ChannelNum::Ch1, field)
    }

    #[test]
    fn zeroes_runtime_once_when_unreachable() -> Result<()> {
        let (scheduler, statistics) = scheduler()?;
        let last = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        set(&statistics, FieldId::Pdc, 250.0)?;
        set(&statistics, FieldId::YieldTotal, 1234.5)?;
        statistics.write().set_last_update(last);

        scheduler.tick((last + chrono::Duration::seconds(60)).with_timezone(&Local));
        assert_eq!(get(&statistics, FieldId::Pdc), Some(250.0));

        let zeroed = last + chrono::Duration::seconds(900);
        scheduler.tick(zeroed.with_timezone(&Local));
        assert_eq!(get(&statistics, FieldId::Pdc), Some(0.0));
        assert_eq!(get(&statistics, FieldId::YieldTotal), Some(1234.5));
        assert_eq!(statistics.read().last_update(), Some(last));
        assert_eq!(statistics.read().last_update_from_internal(), Some(zeroed));

        // not zeroed again for the same last_update
        set(&statistics, FieldId::Pdc, 10.0)?;
        statistics.write().set_last_update(last);
        scheduler.tick((last + chrono::Duration::seconds(1200)).with_timezone(&Local));
        assert_eq!(get(&statistics, FieldId::Pdc), Some(10.0));
        Ok(())
    }

    #[test]
    fn clears_daily_values_at_midnight() -> Result<()> {
        let (scheduler, statistics) = scheduler()?;
        let evening = Local.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap();
        set(&statistics, FieldId::YieldDay, 1500.0)?;
        set(&statistics, FieldId::YieldTotal, 1234.5)?;
        statistics.write().set_last_update(evening.with_timezone(&Utc));

        scheduler.tick(evening);
        assert_eq!(get(&statistics, FieldId::YieldDay), Some(1500.0));

        scheduler.tick(evening + chrono::Duration::seconds(120));
        assert_eq!(get(&statistics, FieldId::YieldDay), Some(0.0));
        assert_eq!(get(&statistics, FieldId::YieldTotal), Some(1234.5));
        Ok(())
    }

    fn receive_yield_day(statistics: &Statistics, model: crate::hoymiles::InverterModel, value: f32) -> Result<()> {
        let record = crate::replay::encode_record(
            model,
            &[crate::replay::FieldValue {
                channel_type: ChannelType::Dc,
                channel: ChannelNum::Ch1,
                field: FieldId::YieldDay,
                value,
            }],
        )?;
        let mut parser = statistics.write();
        parser.clear_buffer();
        parser.append_fragment(0, &record)?;
        parser.end_append_fragment()?;
        Ok(())
    }

    #[test]
    fn new_day_restarts_correction_without_zeroing() -> Result<()> {
        let (scheduler, statistics) = scheduler_from(
            r#"
inverters:
  - name: roof
    serial: "112183200001"
    yield_day_correction: true
"#,
        )?;
        let model = crate::hoymiles::InverterModel::Hm1Ch;
        let evening = Local.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap();

        receive_yield_day(&statistics, model, 1500.0)?;
        scheduler.tick(evening);
        scheduler.tick(evening + chrono::Duration::seconds(120));
        // daily values are kept when zeroing is off
        assert_eq!(get(&statistics, FieldId::YieldDay), Some(1500.0));

        // the device's fresh day counter is not carried over yesterday's
        receive_yield_day(&statistics, model, 5.0)?;
        assert_eq!(get(&statistics, FieldId::YieldDay), Some(5.0));
        Ok(())
    }
}
