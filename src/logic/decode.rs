//! Audio decoding into the mono PCM the beat detector consumes.

use crate::error::GameError;
use crate::models::Track;
use rodio::{Decoder, Source};
use std::fs::File;
use std::io::BufReader;

/// Mono PCM in [-1.0, 1.0].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Turns a track into mono PCM.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, track: &Track) -> Result<DecodedAudio, GameError>;
}

/// Decodes anything rodio understands (WAV, MP3, FLAC, Vorbis).
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioDecoder;

impl AudioDecoder for RodioDecoder {
    fn decode(&self, track: &Track) -> Result<DecodedAudio, GameError> {
        let file = File::open(&track.path)
            .map_err(|e| GameError::Decode(format!("{}: {}", track.path.display(), e)))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| GameError::Decode(format!("{}: {}", track.path.display(), e)))?;

        let channels = source.channels() as usize;
        let sample_rate = source.sample_rate();
        if channels == 0 || sample_rate == 0 {
            return Err(GameError::Decode(format!(
                "{}: missing format information",
                track.path.display()
            )));
        }

        let estimate = source
            .total_duration()
            .map(|d| (d.as_secs_f64() * sample_rate as f64).ceil() as usize * channels)
            .unwrap_or(0);
        let mut interleaved: Vec<f32> = Vec::new();
        interleaved
            .try_reserve_exact(estimate)
            .map_err(|_| GameError::Buffer {
                requested: estimate,
            })?;

        for sample in source.convert_samples::<f32>() {
            if interleaved.len() == interleaved.capacity() {
                let grow = interleaved.len().max(4096);
                interleaved
                    .try_reserve(grow)
                    .map_err(|_| GameError::Buffer {
                        requested: interleaved.len() + grow,
                    })?;
            }
            interleaved.push(sample);
        }

        let samples = downmix(&interleaved, channels)?;
        log::debug!(
            "AUDIO: Decoded {} into {} frames @ {} Hz ({} ch)",
            track.title,
            samples.len(),
            sample_rate,
            channels
        );
        Ok(DecodedAudio::new(samples, sample_rate))
    }
}

/// Averages interleaved frames into one channel. A trailing partial frame is
/// dropped.
pub fn downmix(interleaved: &[f32], channels: usize) -> Result<Vec<f32>, GameError> {
    if channels <= 1 {
        let mut mono = Vec::new();
        mono.try_reserve_exact(interleaved.len())
            .map_err(|_| GameError::Buffer {
                requested: interleaved.len(),
            })?;
        mono.extend_from_slice(interleaved);
        return Ok(mono);
    }

    let frames = interleaved.len() / channels;
    let mut mono = Vec::new();
    mono.try_reserve_exact(frames)
        .map_err(|_| GameError::Buffer { requested: frames })?;
    mono.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
    Ok(mono)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackId;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Writes interleaved 16-bit PCM.
    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: &[Vec<i16>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for sample in frames.iter().flatten() {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn track_at(path: PathBuf) -> Track {
        Track::new(TrackId::new("test"), path, "test", None)
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stereo.wav");
        let frames: Vec<Vec<i16>> = (0..800).map(|_| vec![16384, 0]).collect();
        write_wav(&path, 8000, 2, &frames);

        let audio = RodioDecoder.decode(&track_at(path)).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples.len(), 800);
        assert!(audio.samples.iter().all(|s| (s - 0.25).abs() < 1e-3));
        assert!((audio.duration() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn garbage_and_missing_files_are_decode_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();
        assert!(matches!(
            RodioDecoder.decode(&track_at(path)),
            Err(GameError::Decode(_))
        ));

        assert!(matches!(
            RodioDecoder.decode(&track_at(PathBuf::from("/no/such/track.wav"))),
            Err(GameError::Decode(_))
        ));
    }

    #[test]
    fn downmix_drops_partial_frames() {
        let mono = downmix(&[1.0, 0.0, 0.5, 0.5, 0.9], 2).unwrap();
        assert_eq!(mono, vec![0.5, 0.5]);
        assert_eq!(downmix(&[0.1, 0.2], 1).unwrap(), vec![0.1, 0.2]);
    }
}
