/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
/// The engine is driven entirely by GameEvents; the sim never calls
/// audio directly.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_jump: Arc<Vec<u8>>,
        sfx_land: Arc<Vec<u8>>,
        sfx_stomp: Arc<Vec<u8>>,
        sfx_die: Arc<Vec<u8>>,
        sfx_clear: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_jump: Arc::new(make_wav(&gen_jump())),
                sfx_land: Arc::new(make_wav(&gen_land())),
                sfx_stomp: Arc::new(make_wav(&gen_stomp())),
                sfx_die: Arc::new(make_wav(&gen_die())),
                sfx_clear: Arc::new(make_wav(&gen_clear())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_jump(&self) {
            self.play(&self.sfx_jump);
        }
        pub fn play_land(&self) {
            self.play(&self.sfx_land);
        }
        pub fn play_stomp(&self) {
            self.play(&self.sfx_stomp);
        }
        pub fn play_die(&self) {
            self.play(&self.sfx_die);
        }
        pub fn play_clear(&self) {
            self.play(&self.sfx_clear);
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    /// Square wave with a soft clip, the classic jump voice.
    fn square(t: f32, freq: f32) -> f32 {
        let s = (t * freq * 2.0 * std::f32::consts::PI).sin();
        (s * 4.0).clamp(-1.0, 1.0)
    }

    /// Jump: fast upward square sweep 220Hz → 660Hz.
    fn gen_jump() -> Vec<f32> {
        let duration = 0.14;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 220.0 + t * 440.0;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.4);
                square(ti, freq) * env * 0.18
            })
            .collect()
    }

    /// Landing: one very short low thump.
    fn gen_land() -> Vec<f32> {
        let duration = 0.05;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(1.5);
                (ti * 90.0 * 2.0 * std::f32::consts::PI).sin() * env * 0.2
            })
            .collect()
    }

    /// Stomp: mid-pitch thud with a noise tail.
    fn gen_stomp() -> Vec<f32> {
        let duration = 0.09;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut rng: u32 = 0xBEEF;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 320.0 - t * 180.0;
                let tone = (ti * freq * 2.0 * std::f32::consts::PI).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(1.2);
                (tone * 0.7 + noise * 0.3) * env * 0.25
            })
            .collect()
    }

    /// Death: slow descending slide, a full octave down.
    fn gen_die() -> Vec<f32> {
        let duration = 0.55;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 494.0 * (1.0 - 0.5 * t); // B4 sliding to B3
                let env = 1.0 - t * t;
                square(ti, freq) * env * 0.14
            })
            .collect()
    }

    /// Level clear: four-note fanfare with a sustained top note.
    fn gen_clear() -> Vec<f32> {
        let notes = [(349.0_f32, 0.09), (440.0, 0.09), (523.0, 0.09), (698.0, 0.3)];
        let mut samples = Vec::new();
        for &(freq, dur) in &notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.6;
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.25
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.15;
                samples.push(wave * env * 0.28);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let clamped = s.max(-1.0).min(1.0);
            let val = (clamped * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play_jump(&self) {}
    pub fn play_land(&self) {}
    pub fn play_stomp(&self) {}
    pub fn play_die(&self) {}
    pub fn play_clear(&self) {}
}
