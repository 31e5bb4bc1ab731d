//! Audio format constants referenced by the codec and the websocket layer.

/// Client microphone input: 16 kHz, mono, 16-bit little-endian PCM.
pub const INPUT_SAMPLE_RATE_HZ: u32 = 16_000;

/// Model-produced audio output: 24 kHz, mono, 16-bit little-endian PCM.
pub const OUTPUT_SAMPLE_RATE_HZ: u32 = 24_000;

pub const SAMPLE_BITS: u16 = 16;
pub const CHANNELS: u16 = 1;
