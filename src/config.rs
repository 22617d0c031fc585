use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed engine sample rate. Also written into every WAV header.
pub const SAMPLE_RATE: u32 = 48_000;
/// Loop capacity in samples: five minutes of mono audio.
pub const MAX_SAMPLES: usize = 48_000 * 60 * 5;

/// Byte capacity of the buffered WAV writer.
pub const WAV_TRANSFER_SIZE: usize = 8192;
/// Progress is reported every this many samples during WAV export.
pub const WAV_PROGRESS_STRIDE: usize = 4096;
/// Samples per write during raw export.
pub const RAW_CHUNK_SAMPLES: usize = 1024;
/// Samples per read during raw import.
pub const IMPORT_CHUNK_SAMPLES: usize = 256;
/// Progress cadence during raw import.
pub const IMPORT_PROGRESS_STRIDE: usize = 1024;

/// Files saved per format per session.
pub const MAX_SAVES: u32 = 10;
/// Entries kept by the file catalog.
pub const MAX_FILES: usize = 10;
/// Rows of the file list visible at once.
pub const VISIBLE_FILES: usize = 3;
/// Suffix of files offered for recall.
pub const RAW_SUFFIX: &str = ".BIN";

/// Full wet is allowed to exceed unity.
pub const WET_CEILING: f32 = 1.5;
/// Resolution of the dry/wet encoder.
pub const MIX_STEPS: i32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LooperConfig {
    /// Directory standing in for the mounted SD card.
    pub storage_root: PathBuf,
    /// Name of the JACK client.
    pub client_name: String,
    /// How long both buttons must be held to erase the loop.
    pub reset_hold_ms: u64,
    /// Multiplier applied to every status message hold time.
    pub message_scale: f32,
    /// GPIO pin map. Without it the keyboard is the only control surface.
    pub gpio: Option<GpioConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpioConfig {
    pub play_button: u8,
    pub record_button: u8,
    pub menu_encoder: EncoderPins,
    pub menu_press: u8,
    pub mix_encoder: EncoderPins,
    pub play_led: u8,
    pub record_led: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EncoderPins {
    pub a: u8,
    pub b: u8,
}

impl Default for LooperConfig {
    fn default() -> Self {
        LooperConfig {
            storage_root: PathBuf::from("sd"),
            client_name: "sdlooper".to_string(),
            reset_hold_ms: 1000,
            message_scale: 1.0,
            gpio: None,
        }
    }
}

/// Load the configuration from a YAML file.
///
/// A missing or unreadable file is not an error: the defaults are used and
/// the reason is logged.
pub fn load_config(path: &Path) -> LooperConfig {
    if !path.exists() {
        log::info!("load_config: {path:?} not found, using defaults");
        return LooperConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<LooperConfig>(&contents) {
            Ok(config) => {
                log::info!("load_config: loaded {path:?}");
                config
            }
            Err(e) => {
                log::warn!("load_config: failed to parse {path:?}: {e}, using defaults");
                LooperConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: failed to read {path:?}: {e}, using defaults");
            LooperConfig::default()
        }
    }
}
