// Waveform peaks - WAV decoding reduced to min/max buckets for drawing

use crate::error::RendererError;
use crate::timebase::Seconds;
use hound::{SampleFormat, WavReader};
use std::io::{Cursor, Read};
use std::path::Path;

/// Min/max envelope of a mono mixdown, one entry per bucket
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformPeaks {
    pub min: Vec<f32>,
    pub max: Vec<f32>,
    pub duration: Seconds,
}

impl WaveformPeaks {
    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }
}

/// Decoded guide audio, mixed down to one channel
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoAudio {
    pub fn duration(&self) -> Seconds {
        Seconds(self.samples.len() as f64 / self.sample_rate.max(1) as f64)
    }

    pub fn peaks(&self, resolution: usize) -> WaveformPeaks {
        peaks_from_samples(&self.samples, 1, self.sample_rate, resolution)
    }
}

/// Decodes a WAV file into a mono buffer
pub fn decode_wav(path: &Path) -> Result<MonoAudio, RendererError> {
    let reader = WavReader::open(path)
        .map_err(|e| RendererError::SourceUnavailable(format!("{}: {}", path.display(), e)))?;
    audio_from_reader(reader)
}

/// Downloads a WAV over HTTP into a mono buffer
pub fn fetch_wav(url: &str) -> Result<MonoAudio, RendererError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| RendererError::SourceUnavailable(format!("{}: {}", url, e)))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| RendererError::SourceUnavailable(format!("{}: {}", url, e)))?;

    let reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| RendererError::DecodeFailed(e.to_string()))?;
    audio_from_reader(reader)
}

/// Decodes a WAV file and reduces it to `resolution` buckets
pub fn decode_wav_peaks(path: &Path, resolution: usize) -> Result<WaveformPeaks, RendererError> {
    decode_wav(path).map(|audio| audio.peaks(resolution))
}

/// Downloads a WAV over HTTP and reduces it to `resolution` buckets
pub fn fetch_wav_peaks(url: &str, resolution: usize) -> Result<WaveformPeaks, RendererError> {
    fetch_wav(url).map(|audio| audio.peaks(resolution))
}

fn audio_from_reader<R: Read>(reader: WavReader<R>) -> Result<MonoAudio, RendererError> {
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| RendererError::DecodeFailed(e.to_string()))?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| RendererError::DecodeFailed(e.to_string()))?
        }
    };

    let channels = (spec.channels as usize).max(1);
    let samples = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok(MonoAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Reduces interleaved samples to min/max buckets of the channel average
pub fn peaks_from_samples(
    interleaved: &[f32],
    channels: usize,
    sample_rate: u32,
    resolution: usize,
) -> WaveformPeaks {
    let channels = channels.max(1);
    let frames = interleaved.len() / channels;
    let duration = Seconds(frames as f64 / sample_rate.max(1) as f64);

    if frames == 0 || resolution == 0 {
        return WaveformPeaks {
            min: Vec::new(),
            max: Vec::new(),
            duration,
        };
    }

    let buckets = resolution.min(frames);
    let mut min = vec![0.0_f32; buckets];
    let mut max = vec![0.0_f32; buckets];

    for (frame_index, frame) in interleaved.chunks_exact(channels).enumerate() {
        let value = frame.iter().sum::<f32>() / channels as f32;
        let bucket = frame_index * buckets / frames;
        min[bucket] = min[bucket].min(value);
        max[bucket] = max[bucket].max(value);
    }

    WaveformPeaks { min, max, duration }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    #[test]
    fn test_peaks_of_stereo_samples() {
        // Two frames per bucket; left/right averaged
        let samples = [1.0, 0.0, -1.0, 0.0, 0.2, 0.2, 0.4, 0.4];
        let peaks = peaks_from_samples(&samples, 2, 4, 2);

        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks.max, vec![0.5, 0.4]);
        assert_eq!(peaks.min, vec![-0.5, 0.0]);
        assert_eq!(peaks.duration, Seconds(1.0));
    }

    #[test]
    fn test_resolution_capped_by_frames() {
        let peaks = peaks_from_samples(&[0.5, -0.5, 0.25], 1, 3, 800);
        assert_eq!(peaks.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let peaks = peaks_from_samples(&[], 1, 44100, 800);
        assert!(peaks.is_empty());
        assert_eq!(peaks.duration, Seconds(0.0));
    }

    #[test]
    fn test_decode_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..16000 {
            let value = if i % 2 == 0 { i16::MAX } else { i16::MIN };
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let peaks = decode_wav_peaks(&path, 100).unwrap();
        assert_eq!(peaks.duration, Seconds(2.0));
        assert_eq!(peaks.len(), 100);
        assert!(peaks.max[0] > 0.99);
        assert!(peaks.min[0] <= -1.0);
    }

    #[test]
    fn test_decode_from_memory() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(0.5_f32).unwrap();
                writer.write_sample(-0.5_f32).unwrap();
            }
            writer.finalize().unwrap();
        }

        let reader = WavReader::new(Cursor::new(cursor.into_inner())).unwrap();
        let audio = audio_from_reader(reader).unwrap();
        assert_eq!(audio.samples.len(), 100);
        assert_eq!(audio.duration(), Seconds(1.0));

        let peaks = audio.peaks(10);
        assert_eq!(peaks.duration, Seconds(1.0));
        assert_eq!(peaks.max, vec![0.0; 10]);
    }

    #[test]
    fn test_missing_file() {
        let result = decode_wav_peaks(Path::new("/no/such/guide.wav"), 100);
        assert!(matches!(result, Err(RendererError::SourceUnavailable(_))));
    }
}
