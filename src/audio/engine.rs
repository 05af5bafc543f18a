// Preview synth - CPAL output stream playing scheduled sine tones
//
// The stream is opened on the first `start` (a user gesture). The callback
// mixes the shared tone table and advances the audio clock. It never blocks:
// if the table is locked by the UI thread it writes silence for that buffer.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};

use crate::audio::clock::AudioClock;
use crate::audio::tone::{ScheduledTone, ToneEnvelope, ToneTable};
use crate::error::SynthError;
use crate::messaging::{NotificationCategory, Notifier};
use crate::playback::synth::{SynthBackend, SynthVoice};
use crate::timebase::Seconds;

/// Frames rendered per pass inside the callback
const RENDER_CHUNK: usize = 512;

/// Mono signal the output callback pulls from; copied to every channel
pub(crate) trait MonoSource: Send + 'static {
    /// Fills `out` with the next `out.len()` frames; must not block
    fn render(&mut self, out: &mut [f32]);
}

/// Default output device with its preferred configuration
pub(crate) struct OutputDevice {
    device: Device,
    sample_format: SampleFormat,
    config: StreamConfig,
    pub sample_rate: f32,
    pub channels: usize,
}

impl OutputDevice {
    pub fn open_default() -> Result<Self, SynthError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(SynthError::NoDevice)?;

        log::info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| SynthError::Unavailable(e.to_string()))?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = (supported_config.channels() as usize).max(1);

        Ok(Self {
            device,
            sample_format,
            config: supported_config.into(),
            sample_rate,
            channels,
        })
    }

    /// Builds and starts a stream fed by `source`
    pub fn start<S: MonoSource>(&self, source: S, notifier: &Notifier) -> Result<Stream, SynthError> {
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32, S>(source, notifier),
            SampleFormat::I16 => self.build_stream::<i16, S>(source, notifier),
            SampleFormat::U16 => self.build_stream::<u16, S>(source, notifier),
            other => {
                return Err(SynthError::Unavailable(format!(
                    "Unsupported sample format: {:?}",
                    other
                )));
            }
        }?;

        stream
            .play()
            .map_err(|e| SynthError::Stream(e.to_string()))?;
        Ok(stream)
    }

    fn build_stream<T, S>(&self, mut source: S, notifier: &Notifier) -> Result<Stream, SynthError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
        S: MonoSource,
    {
        let notifier = notifier.clone();
        let channels = self.channels;
        // Allocated once here, reused by every callback
        let mut scratch = vec![0.0_f32; RENDER_CHUNK];

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for chunk in data.chunks_mut(RENDER_CHUNK * channels) {
                        let frames = chunk.len() / channels;
                        let mono = &mut scratch[..frames];
                        source.render(mono);
                        for (frame, value) in chunk.chunks_mut(channels).zip(mono.iter()) {
                            let sample = T::from_sample(*value);
                            for channel_sample in frame.iter_mut() {
                                *channel_sample = sample;
                            }
                        }
                    }
                },
                move |err| {
                    notifier.error(
                        NotificationCategory::Playback,
                        format!("Audio stream error: {}", err),
                    );
                },
                None,
            )
            .map_err(|e| SynthError::Stream(e.to_string()))
    }
}

/// Tone table mixer driving the audio clock
struct ToneSource {
    clock: AudioClock,
    tones: Arc<Mutex<ToneTable>>,
    gain: f32,
}

impl MonoSource for ToneSource {
    fn render(&mut self, out: &mut [f32]) {
        let start = self.clock.current_sample();

        if let Ok(mut table) = self.tones.try_lock() {
            for (i, value) in out.iter_mut().enumerate() {
                *value = (table.next_sample(start + i as u64) * self.gain).tanh();
            }
            table.prune(start + out.len() as u64);
        } else {
            out.fill(0.0);
        }

        self.clock.advance(out.len());
    }
}

struct RunningStream {
    _stream: Stream,
    clock: AudioClock,
    tones: Arc<Mutex<ToneTable>>,
}

/// Sine synth on the default output device
pub struct CpalSynth {
    running: Option<RunningStream>,
    gain: f32,
    envelope: ToneEnvelope,
    next_voice: u64,
    notifier: Notifier,
}

impl CpalSynth {
    pub fn new(gain: f32, notifier: Notifier) -> Self {
        Self {
            running: None,
            gain: gain.clamp(0.0, 1.0),
            envelope: ToneEnvelope::default(),
            next_voice: 1,
            notifier,
        }
    }

    pub fn is_started(&self) -> bool {
        self.running.is_some()
    }

    fn open_stream(&self) -> Result<RunningStream, SynthError> {
        let output = OutputDevice::open_default()?;

        let clock = AudioClock::new(output.sample_rate);
        let tones = Arc::new(Mutex::new(ToneTable::new(output.sample_rate, self.envelope)));
        let source = ToneSource {
            clock: clock.clone(),
            tones: Arc::clone(&tones),
            gain: self.gain,
        };
        let stream = output.start(source, &self.notifier)?;

        log::info!(
            "Preview synth started: {} Hz, {} channels",
            output.sample_rate,
            output.channels
        );

        Ok(RunningStream {
            _stream: stream,
            clock,
            tones,
        })
    }
}

impl SynthBackend for CpalSynth {
    type Voice = CpalVoice;

    fn start(&mut self) -> Result<(), SynthError> {
        if self.running.is_some() {
            return Ok(());
        }
        match self.open_stream() {
            Ok(running) => {
                self.running = Some(running);
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .error(NotificationCategory::Playback, e.to_string());
                Err(e)
            }
        }
    }

    fn now(&self) -> Seconds {
        self.running
            .as_ref()
            .map(|r| r.clock.now())
            .unwrap_or(Seconds::ZERO)
    }

    fn create_voice(&mut self) -> Result<CpalVoice, SynthError> {
        let running = self
            .running
            .as_ref()
            .ok_or_else(|| SynthError::Unavailable("synth not started".to_string()))?;
        let id = self.next_voice;
        self.next_voice += 1;
        Ok(CpalVoice {
            id,
            clock: running.clock.clone(),
            tones: Arc::clone(&running.tones),
            disposed: false,
        })
    }
}

/// Handle on the tones one playback session scheduled
pub struct CpalVoice {
    id: u64,
    clock: AudioClock,
    tones: Arc<Mutex<ToneTable>>,
    disposed: bool,
}

impl SynthVoice for CpalVoice {
    fn trigger_attack_release(&mut self, frequency_hz: f64, duration: Seconds, at: Seconds) {
        if self.disposed {
            return;
        }
        let tone = ScheduledTone {
            voice: self.id,
            start_sample: self.clock.seconds_to_sample(at),
            release_sample: self.clock.seconds_to_sample(at + duration),
            frequency_hz: frequency_hz as f32,
        };
        match self.tones.lock() {
            Ok(mut table) => {
                if !table.schedule(tone) {
                    log::warn!("Tone table full, dropping {:.1} Hz at {}", frequency_hz, at);
                }
            }
            Err(_) => log::error!("Tone table poisoned, dropping trigger"),
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Ok(mut table) = self.tones.lock() {
            let cancelled = table.cancel_voice(self.id);
            log::debug!("Voice {} disposed, {} tones cancelled", self.id, cancelled);
        }
    }
}

impl Drop for CpalVoice {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_requires_started_synth() {
        let mut synth = CpalSynth::new(0.3, Notifier::silent());
        assert!(!synth.is_started());
        assert_eq!(synth.now(), Seconds::ZERO);
        assert!(matches!(synth.create_voice(), Err(SynthError::Unavailable(_))));
    }

    #[test]
    fn test_voice_dispose_cancels_its_tones() {
        let clock = AudioClock::new(1000.0);
        let tones = Arc::new(Mutex::new(ToneTable::new(1000.0, ToneEnvelope::default())));
        let mut first = CpalVoice {
            id: 1,
            clock: clock.clone(),
            tones: Arc::clone(&tones),
            disposed: false,
        };
        let mut second = CpalVoice {
            id: 2,
            clock,
            tones: Arc::clone(&tones),
            disposed: false,
        };

        first.trigger_attack_release(440.0, Seconds(0.5), Seconds(0.0));
        first.trigger_attack_release(440.0, Seconds(0.5), Seconds(0.5));
        second.trigger_attack_release(220.0, Seconds(1.0), Seconds(0.0));

        first.dispose();
        first.trigger_attack_release(440.0, Seconds(0.5), Seconds(1.0));

        let table = tones.lock().unwrap();
        assert_eq!(table.voice_tones(1), 0);
        assert_eq!(table.voice_tones(2), 1);
    }

    #[test]
    fn test_tone_source_advances_clock_even_when_locked() {
        let clock = AudioClock::new(1000.0);
        let tones = Arc::new(Mutex::new(ToneTable::new(1000.0, ToneEnvelope::default())));
        let mut source = ToneSource {
            clock: clock.clone(),
            tones: Arc::clone(&tones),
            gain: 1.0,
        };
        let mut out = [1.0_f32; 64];

        {
            let _held = tones.lock().unwrap();
            source.render(&mut out);
        }
        assert!(out.iter().all(|v| *v == 0.0));
        assert_eq!(clock.current_sample(), 64);

        source.render(&mut out);
        assert_eq!(clock.current_sample(), 128);
    }
}
