// The settings wavepaint reads at startup and the session it restores.

use serde::{Deserialize, Serialize};
use crate::shared::Tool;
use crate::wave::WaveformKind;

const MAX_SAMPLE_RATE: u32 = 768_000;
// 2^26 samples keeps every WAV size field inside u32
const MAX_BUFFER_LEN: usize = 1 << 26;

// Engine constants; fixed for the life of the process once loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,      // native rate of the loop buffer, also the export rate
    pub loop_seconds: f64,     // loop length; N = sample_rate * loop_seconds
    pub amplitude: f32,        // hard ceiling A for every sample
    pub min_frequency: f64,    // floor for the frequency-down control
    pub default_frequency: f64,
    pub export_prefix: String, // exports are <prefix>001.wav, <prefix>002.wav, ...
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            loop_seconds: 2.0,
            amplitude: 0.35,
            min_frequency: 20.0,
            default_frequency: 440.0,
            export_prefix: String::from("waveform_"),
        }
    }
}

impl EngineConfig {
    pub fn buffer_len(&self) -> usize {
        (self.sample_rate as f64 * self.loop_seconds).round() as usize
    }

    // Reject values the engine can't run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            anyhow::bail!("sample_rate must be in 1..={MAX_SAMPLE_RATE}, got {}", self.sample_rate);
        }
        if !(self.loop_seconds.is_finite() && self.loop_seconds > 0.0) {
            anyhow::bail!("loop_seconds must be positive, got {}", self.loop_seconds);
        }
        if !(self.amplitude > 0.0 && self.amplitude <= 1.0) {
            anyhow::bail!("amplitude must be in (0, 1], got {}", self.amplitude);
        }
        if !(self.min_frequency.is_finite() && self.min_frequency > 0.0) {
            anyhow::bail!("min_frequency must be positive, got {}", self.min_frequency);
        }
        if !self.default_frequency.is_finite() {
            anyhow::bail!("default_frequency must be finite");
        }
        let len = self.buffer_len();
        if !(2..=MAX_BUFFER_LEN).contains(&len) {
            anyhow::bail!("loop buffer would hold {len} samples, must be 2..={MAX_BUFFER_LEN}");
        }
        if self.export_prefix.contains(['/', '\\']) {
            anyhow::bail!("export_prefix must be a plain file name prefix");
        }
        Ok(())
    }
}

// What we restore on the next launch. The buffer itself is never saved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub brush_intensity: f32,
    pub smear_span: f32,
    pub tool: Tool,
    pub kind: WaveformKind,
    pub frequency: f64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            brush_intensity: 0.7,
            smear_span: 0.5,
            tool: Tool::Free,
            kind: WaveformKind::Sine,
            frequency: 440.0,
        }
    }
}

impl SessionState {
    pub fn for_config(config: &EngineConfig) -> Self {
        Self {
            frequency: config.default_frequency,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.buffer_len(), 96_000);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let bad = [
            EngineConfig { sample_rate: 0, ..EngineConfig::default() },
            EngineConfig { loop_seconds: -1.0, ..EngineConfig::default() },
            EngineConfig { loop_seconds: f64::NAN, ..EngineConfig::default() },
            EngineConfig { amplitude: 1.5, ..EngineConfig::default() },
            EngineConfig { amplitude: 0.0, ..EngineConfig::default() },
            EngineConfig { sample_rate: 1, loop_seconds: 1.0, ..EngineConfig::default() },
            EngineConfig { export_prefix: "../escape".into(), ..EngineConfig::default() },
            EngineConfig { loop_seconds: 1e12, ..EngineConfig::default() },
            EngineConfig { sample_rate: 1_073_741_824, loop_seconds: 0.01, ..EngineConfig::default() },
            EngineConfig { sample_rate: 768_001, loop_seconds: 1.0, ..EngineConfig::default() },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn largest_accepted_config_fits_wav_fields() {
        let config = EngineConfig { sample_rate: 768_000, loop_seconds: 87.0, ..EngineConfig::default() };
        assert!(config.validate().is_ok());
        assert!(config.buffer_len() <= MAX_BUFFER_LEN);
        assert!((config.sample_rate as u64) * 4 <= u32::MAX as u64);
        assert!((config.buffer_len() as u64) * 4 + 36 <= u32::MAX as u64);

        let too_long = EngineConfig { loop_seconds: 88.0, ..config };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{ "sample_rate": 44100 }"#).unwrap();
        assert_eq!(config.sample_rate, 44_100);
        assert_eq!(config.amplitude, 0.35);
        assert_eq!(config.buffer_len(), 88_200);

        let session: SessionState = serde_json::from_str(r#"{ "tool": "Smear" }"#).unwrap();
        assert_eq!(session.tool, Tool::Smear);
        assert_eq!(session.brush_intensity, 0.7);
    }
}
