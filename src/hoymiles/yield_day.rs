use log::info;

use crate::hoymiles::{ChannelNum, CH_CNT};

/// Regressions smaller than this are float noise, not a device day rollover.
pub const YIELD_DAY_ROLLOVER_EPSILON: f32 = 0.01;

/// Keeps the reported daily yield from dropping when the inverter resets
/// its own day counter before the host does.
#[derive(Clone, Debug, Default)]
pub struct YieldDayCorrector {
    enabled: bool,
    last_yield_day: [Option<f32>; CH_CNT],
    offset: [f32; CH_CNT],
}

impl YieldDayCorrector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Feeds a freshly decoded daily yield for `channel` and returns the
    /// value to store.
    pub fn correct(&mut self, channel: ChannelNum, raw: f32) -> f32 {
        let ch = channel.index();

        if self.enabled {
            if let Some(last) = self.last_yield_day[ch] {
                if raw < last - YIELD_DAY_ROLLOVER_EPSILON {
                    self.offset[ch] += last;
                    info!(
                        "yield day of channel {} dropped from {} to {}, carrying {} forward",
                        channel, last, raw, self.offset[ch]
                    );
                }
            }
        }
        self.last_yield_day[ch] = Some(raw);

        if self.enabled {
            raw + self.offset[ch]
        } else {
            raw
        }
    }

    /// Forgets observed values and carried offsets, called at local
    /// midnight after the daily data was zeroed.
    pub fn reset(&mut self) {
        self.last_yield_day = [None; CH_CNT];
        self.offset = [0.0; CH_CNT];
    }

    pub fn offset(&self, channel: ChannelNum) -> f32 {
        self.offset[channel.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compensates_device_rollover() {
        let mut corrector = YieldDayCorrector::new(true);
        assert_eq!(corrector.correct(ChannelNum::Ch1, 12.5), 12.5);
        assert!((corrector.correct(ChannelNum::Ch1, 0.3) - 12.8).abs() < 1e-4);
        assert!((corrector.correct(ChannelNum::Ch1, 0.5) - 13.0).abs() < 1e-4);

        corrector.reset();
        assert_eq!(corrector.correct(ChannelNum::Ch1, 0.1), 0.1);
    }

    #[test]
    fn disabled_passes_values_through() {
        let mut corrector = YieldDayCorrector::new(false);
        corrector.correct(ChannelNum::Ch2, 500.0);
        assert_eq!(corrector.correct(ChannelNum::Ch2, 3.0), 3.0);
        assert_eq!(corrector.offset(ChannelNum::Ch2), 0.0);
    }

    #[test]
    fn ignores_noise_and_other_channels() {
        let mut corrector = YieldDayCorrector::new(true);
        corrector.correct(ChannelNum::Ch1, 100.0);
        corrector.correct(ChannelNum::Ch2, 10.0);
        assert_eq!(corrector.correct(ChannelNum::Ch1, 99.995), 99.995);
        assert_eq!(corrector.offset(ChannelNum::Ch2), 0.0);
    }
}
