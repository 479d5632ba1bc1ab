/// Background music channel via rodio.
///
/// Plays the first configured track that exists on disk, looped forever.
/// With no track on disk it falls back to a short synthesized pentatonic
/// tune, generated once at init as an in-memory WAV buffer.
///
/// Pause keeps the sink (and its position). Stop drops the sink, so the
/// next start begins from the top.
///
/// Compile without the "sound" feature to get a channel whose every start
/// is rejected.

use std::path::PathBuf;

#[cfg(feature = "sound")]
mod inner {
    use std::fs::File;
    use std::io::{BufReader, Cursor};
    use std::path::PathBuf;
    use std::sync::Arc;

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use tracing::{info, warn};

    use crate::error::MediaError;
    use crate::media::MediaChannel;
    use crate::sim::event::Channel;

    const SAMPLE_RATE: u32 = 22050;

    pub struct MusicChannel {
        _stream: Option<OutputStream>,
        handle: Option<OutputStreamHandle>,
        tracks: Vec<PathBuf>,
        fallback: Arc<Vec<u8>>,
        sink: Option<Sink>,
    }

    fn rejected(err: impl std::fmt::Display) -> MediaError {
        MediaError::rejected(Channel::Audio, err.to_string())
    }

    impl MusicChannel {
        pub fn new(tracks: Vec<PathBuf>) -> Self {
            let (stream, handle) = match OutputStream::try_default() {
                Ok((s, h)) => (Some(s), Some(h)),
                Err(e) => {
                    warn!(error = %e, "no audio output, music disabled");
                    (None, None)
                }
            };
            MusicChannel {
                _stream: stream,
                handle,
                tracks,
                fallback: Arc::new(make_wav(&gen_festive_loop())),
                sink: None,
            }
        }

        fn open_sink(&self) -> Result<Sink, MediaError> {
            let handle = self.handle.as_ref().ok_or(MediaError::NoOutputDevice)?;
            let sink = Sink::try_new(handle).map_err(rejected)?;

            match self.tracks.iter().find(|p| p.is_file()) {
                Some(path) => {
                    let file = File::open(path).map_err(rejected)?;
                    let src = Decoder::new_looped(BufReader::new(file)).map_err(rejected)?;
                    info!(track = %path.display(), "background music loaded");
                    sink.append(src);
                }
                None => {
                    let cursor = Cursor::new(self.fallback.as_ref().clone());
                    let src = Decoder::new_looped(cursor).map_err(rejected)?;
                    sink.append(src);
                }
            }
            Ok(sink)
        }
    }

    impl MediaChannel for MusicChannel {
        fn start(&mut self, _source: Option<&str>) -> Result<(), MediaError> {
            if let Some(sink) = &self.sink {
                sink.play();
                return Ok(());
            }
            let sink = self.open_sink()?;
            sink.play();
            self.sink = Some(sink);
            Ok(())
        }

        fn pause(&mut self) {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
        }

        fn stop(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }

        fn is_active(&self) -> bool {
            self.sink.as_ref().map_or(false, |s| !s.is_paused() && !s.empty())
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Fallback tune
    // ════════════════════════════════════════════════════════════

    /// Gong-shang-jue-zhi-yu on C: a bright loop in the Chinese pentatonic.
    fn gen_festive_loop() -> Vec<f32> {
        // (frequency, beats); 0.0 is a rest
        let phrase: [(f32, f32); 16] = [
            (523.0, 1.0), (587.0, 1.0), (659.0, 2.0), (784.0, 1.0),
            (659.0, 1.0), (587.0, 2.0), (523.0, 1.0), (440.0, 1.0),
            (523.0, 2.0), (587.0, 1.0), (659.0, 1.0), (784.0, 1.0),
            (880.0, 1.0), (784.0, 2.0), (659.0, 2.0), (0.0, 2.0),
        ];
        let beat = 0.18;
        let mut samples = Vec::new();
        for &(freq, beats) in &phrase {
            let n = (SAMPLE_RATE as f32 * beat * beats) as usize;
            for i in 0..n {
                if freq == 0.0 {
                    samples.push(0.0);
                    continue;
                }
                let t = i as f32 / SAMPLE_RATE as f32;
                // Plucked attack, gentle decay
                let env = (1.0 - i as f32 / n as f32).powf(1.5);
                let wave = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.7
                    + (t * freq * 2.0 * 2.0 * std::f32::consts::PI).sin() * 0.2
                    + (t * freq * 3.0 * 2.0 * std::f32::consts::PI).sin() * 0.1;
                samples.push(wave * env * 0.2);
            }
        }
        samples
    }

    /// Wrap mono f32 samples into a 16-bit PCM WAV buffer.
    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits: u16 = 16;
        let block_align: u16 = bits / 8;
        let data_size = samples.len() as u32 * block_align as u32;
        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&(SAMPLE_RATE * block_align as u32).to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&[0.0, 0.5, -0.5, 1.0]);
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..12], b"WAVE");
            assert_eq!(wav.len(), 44 + 8);
            let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
            assert_eq!(data_size, 8);
        }

        #[test]
        fn fallback_tune_is_audible_and_bounded() {
            let tune = gen_festive_loop();
            assert!(!tune.is_empty());
            assert!(tune.iter().all(|s| s.abs() <= 1.0));
            assert!(tune.iter().any(|s| s.abs() > 0.05));
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: a rejecting stub when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::MusicChannel;

#[cfg(not(feature = "sound"))]
pub struct MusicChannel;

#[cfg(not(feature = "sound"))]
impl MusicChannel {
    pub fn new(_tracks: Vec<PathBuf>) -> Self { MusicChannel }
}

#[cfg(not(feature = "sound"))]
impl crate::media::MediaChannel for MusicChannel {
    fn start(&mut self, _source: Option<&str>) -> Result<(), crate::error::MediaError> {
        Err(crate::error::MediaError::NoOutputDevice)
    }
    fn pause(&mut self) {}
    fn stop(&mut self) {}
    fn is_active(&self) -> bool { false }
}

/// Resolve configured track names against the assets directory.
pub fn track_paths(assets_dir: &std::path::Path, names: &[String]) -> Vec<PathBuf> {
    names.iter().map(|n| assets_dir.join(n.trim_start_matches('/'))).collect()
}
