use crate::prelude::*;
use crate::file_error;
use crate::hoymiles::{ChannelNum, ChannelType, FieldId, InverterModel, StatisticsParser, CH_CNT};

use parking_lot::RwLock;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub inverters: Vec<Inverter>,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    /// Optional path to write decoded cycles to, one JSON object per line
    pub datalog_file: Option<String>,

    #[serde(default = "Config::default_housekeeping_interval_secs")]
    pub housekeeping_interval_secs: u64,
}

// Inverter {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Inverter {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub name: String,
    pub serial: Serial,
    pub model: Option<InverterModel>,

    #[serde(default)]
    pub yield_day_correction: bool,
    #[serde(default)]
    pub zero_runtime_data_if_unreachable: bool,
    #[serde(default)]
    pub zero_yield_day_on_midnight: bool,
    pub unreachable_after_secs: Option<u64>,

    /// Peak power per input in W, indexed by channel number
    #[serde(default)]
    pub string_max_power: Vec<u16>,
    #[serde(default)]
    pub field_offsets: Vec<FieldOffset>,
}

impl Inverter {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }

    /// Explicit model, else the one implied by the serial number.
    pub fn model(&self) -> Option<InverterModel> {
        self.model.or_else(|| InverterModel::from_serial(self.serial))
    }

    pub fn yield_day_correction(&self) -> bool {
        self.yield_day_correction
    }

    pub fn zero_runtime_data_if_unreachable(&self) -> bool {
        self.zero_runtime_data_if_unreachable
    }

    pub fn zero_yield_day_on_midnight(&self) -> bool {
        self.zero_yield_day_on_midnight
    }

    pub fn unreachable_after_secs(&self) -> u64 {
        self.unreachable_after_secs.unwrap_or(300) // 5 minutes
    }

    /// A parser bound to this inverter's layout with its local settings
    /// applied.
    pub fn statistics_parser(&self) -> Result<StatisticsParser> {
        let model = self
            .model()
            .ok_or_else(|| file_error!("inverter {} ({}): unknown model", self.name, self.serial))?;

        let mut parser = StatisticsParser::for_model(model)?;
        parser.set_yield_day_correction(self.yield_day_correction);
        for (channel, power) in self.string_max_power.iter().enumerate() {
            parser.set_string_max_power(channel as u8, *power)?;
        }
        for o in &self.field_offsets {
            parser.set_channel_field_offset(o.channel_type, o.channel, o.field, o.offset);
        }

        Ok(parser)
    }
} // }}}

// FieldOffset {{{
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FieldOffset {
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub channel: ChannelNum,
    pub field: FieldId,
    pub offset: f32,
} // }}}

/// Shared configuration. Writers replace the whole config under one lock
/// and bump the version; readers take an immutable snapshot.
pub struct ConfigWrapper {
    inner: Arc<RwLock<Versioned>>,
}

struct Versioned {
    version: u64,
    config: Arc<Config>,
}

impl Clone for ConfigWrapper {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl ConfigWrapper {
    pub fn new(file: String) -> Result<Self> {
        Ok(Self::from_config(Config::new(file)?))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Versioned {
                version: 0,
                config: Arc::new(config),
            })),
        }
    }

    pub fn snapshot(&self) -> Arc<Config> {
        self.inner.read().config.clone()
    }

    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    /// Applies `f` to a copy of the current config, validates it and
    /// publishes it. Returns the new version.
    pub fn update<F>(&self, f: F) -> Result<u64>
    where
        F: FnOnce(&mut Config),
    {
        let mut guard = self.inner.write();
        let mut config = (*guard.config).clone();
        f(&mut config);
        config.validate()?;

        guard.config = Arc::new(config);
        guard.version += 1;
        debug!("config updated to version {}", guard.version);
        Ok(guard.version)
    }

    pub fn inverters(&self) -> Vec<Inverter> {
        self.snapshot().inverters.clone()
    }

    pub fn enabled_inverters(&self) -> Vec<Inverter> {
        self.inverters().into_iter().filter(|i| i.enabled()).collect()
    }

    pub fn inverter_with_serial(&self, serial: Serial) -> Option<Inverter> {
        self.inverters().into_iter().find(|i| i.serial() == serial)
    }

    pub fn inverter_with_name(&self, name: &str) -> Option<Inverter> {
        self.inverters().into_iter().find(|i| i.name() == name)
    }

    pub fn loglevel(&self) -> String {
        self.snapshot().loglevel.clone()
    }

    pub fn datalog_file(&self) -> Option<String> {
        self.snapshot().datalog_file.clone()
    }

    pub fn housekeeping_interval_secs(&self) -> u64 {
        self.snapshot().housekeeping_interval_secs
    }
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        info!("Reading configuration from {}", file);
        let content = std::fs::read_to_string(&file)
            .map_err(|err| file_error!("error reading {}: {}", file, err))?;

        Self::from_yaml(&content)
    }

    /// Logs every setting, once the logger is set up at the configured level.
    pub fn log_summary(&self) {
        info!("Configuration loaded successfully:");
        info!(
            "  Inverters: {} configured, {} enabled",
            self.inverters.len(),
            self.inverters.iter().filter(|i| i.enabled).count()
        );
        for (i, inv) in self.inverters.iter().enumerate() {
            info!("    Inverter[{}]:", i);
            info!("      Name: {}", inv.name);
            info!("      Enabled: {}", inv.enabled);
            info!("      Serial: {}", inv.serial);
            info!(
                "      Model: {}",
                inv.model().map(|m| m.to_string()).unwrap_or_default()
            );
            info!("      Yield Day Correction: {}", inv.yield_day_correction);
            info!("      Zero Runtime If Unreachable: {}", inv.zero_runtime_data_if_unreachable);
            info!("      Zero Yield Day On Midnight: {}", inv.zero_yield_day_on_midnight);
            info!("      String Max Power: {:?}", inv.string_max_power);
            info!("      Field Offsets: {}", inv.field_offsets.len());
        }
        info!("  Datalog File: {}", self.datalog_file.as_deref().unwrap_or("none"));
        info!("  Log Level: {}", self.loglevel);
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.housekeeping_interval_secs == 0 {
            bail!("housekeeping_interval_secs must be at least 1");
        }

        for (i, inv) in self.inverters.iter().enumerate() {
            if inv.name.is_empty() {
                bail!("inverter[{}].name cannot be empty", i);
            }
            if inv.model().is_none() {
                bail!(
                    "inverter[{}]: cannot infer model from serial {}, set model explicitly",
                    i,
                    inv.serial
                );
            }
            if inv.string_max_power.len() > CH_CNT {
                bail!(
                    "inverter[{}].string_max_power has {} entries, at most {} channels",
                    i,
                    inv.string_max_power.len(),
                    CH_CNT
                );
            }
            if self.inverters[..i].iter().any(|other| other.serial == inv.serial) {
                bail!("inverter[{}]: duplicate serial {}", i, inv.serial);
            }
        }

        Ok(())
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_housekeeping_interval_secs() -> u64 {
        60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
inverters:
  - name: roof
    serial: "114172220000"
    yield_day_correction: true
    string_max_power: [0, 400, 380]
    field_offsets:
      - { type: dc, channel: 1, field: yield_total, offset: 12.5 }
"#;

    #[test]
    fn parses_with_defaults() -> Result<()> {
        let config = Config::from_yaml(YAML)?;
        assert_eq!(config.loglevel, "info");
        assert_eq!(config.housekeeping_interval_secs, 60);

        let inverter = &config.inverters[0];
        assert!(inverter.enabled());
        assert_eq!(inverter.model(), Some(InverterModel::Hm2Ch));
        assert_eq!(inverter.unreachable_after_secs(), 300);
        assert_eq!(
            inverter.field_offsets[0],
            FieldOffset {
                channel_type: ChannelType::Dc,
                channel: ChannelNum::Ch1,
                field: FieldId::YieldTotal,
                offset: 12.5,
            }
        );

        let parser = inverter.statistics_parser()?;
        assert!(parser.yield_day_correction());
        assert_eq!(parser.string_max_power(2), Some(380));
        assert_eq!(
            parser.channel_field_offset(ChannelType::Dc, ChannelNum::Ch1, FieldId::YieldTotal),
            12.5
        );
        Ok(())
    }

    #[test]
    fn rejects_unknown_model() {
        let yaml = "inverters:\n  - name: x\n    serial: \"999900000001\"\n";
        assert!(Config::from_yaml(yaml).is_err());

        let yaml = "inverters:\n  - name: x\n    serial: \"999900000001\"\n    model: hm-1ch\n";
        assert!(Config::from_yaml(yaml).is_ok());
    }

    #[test]
    fn rejects_duplicate_serials() {
        let yaml = "inverters:\n  - name: a\n    serial: \"112100000001\"\n  - name: b\n    serial: \"112100000001\"\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn update_publishes_new_snapshot() -> Result<()> {
        let wrapper = ConfigWrapper::from_config(Config::from_yaml(YAML)?);
        let before = wrapper.snapshot();

        let version = wrapper.update(|c| c.inverters[0].enabled = false)?;
        assert_eq!(version, 1);
        assert!(before.inverters[0].enabled);
        assert!(wrapper.enabled_inverters().is_empty());

        // invalid updates are not published
        assert!(wrapper.update(|c| c.housekeeping_interval_secs = 0).is_err());
        assert_eq!(wrapper.version(), 1);
        Ok(())
    }
}
