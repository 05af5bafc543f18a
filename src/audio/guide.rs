// Guide output - plays the decoded guide WAV on the default device
//
// The cursor walks the mono buffer at a fractional step so a guide at any
// sample rate plays at the right speed on the device's rate.

use cpal::Stream;
use std::sync::{Arc, Mutex};

use crate::audio::engine::{MonoSource, OutputDevice};
use crate::error::SynthError;
use crate::messaging::{NotificationCategory, Notifier};
use crate::playback::guide::GuideOutput;
use crate::timebase::Seconds;
use crate::waveform::MonoAudio;

/// Read position into a decoded guide
#[derive(Debug, Clone, Default)]
pub struct GuideCursor {
    audio: Option<Arc<MonoAudio>>,
    /// In source frames
    position: f64,
    /// Source frames per output frame
    step: f64,
    output_rate: f32,
    playing: bool,
}

impl GuideCursor {
    pub fn new(output_rate: f32) -> Self {
        Self {
            output_rate: output_rate.max(1.0),
            step: 1.0,
            ..Self::default()
        }
    }

    /// Swaps in a new guide, rewound and paused
    pub fn load(&mut self, audio: Arc<MonoAudio>) {
        self.audio = Some(audio);
        self.position = 0.0;
        self.playing = false;
        self.update_step();
    }

    pub fn set_output_rate(&mut self, output_rate: f32) {
        self.output_rate = output_rate.max(1.0);
        self.update_step();
    }

    fn update_step(&mut self) {
        self.step = self
            .audio
            .as_ref()
            .map(|a| a.sample_rate.max(1) as f64 / self.output_rate as f64)
            .unwrap_or(1.0);
    }

    /// Starts at `from`; does nothing without a guide or past its end
    pub fn start(&mut self, from: Seconds) {
        let Some(audio) = &self.audio else {
            return;
        };
        self.position = from.value().max(0.0) * audio.sample_rate as f64;
        self.playing = self.position < audio.samples.len() as f64;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> Seconds {
        self.audio
            .as_ref()
            .map(|a| Seconds(self.position / a.sample_rate.max(1) as f64))
            .unwrap_or(Seconds::ZERO)
    }

    /// Next output frame, linearly interpolated; stops at the end
    pub fn next_sample(&mut self) -> f32 {
        if !self.playing {
            return 0.0;
        }
        let Some(audio) = &self.audio else {
            self.playing = false;
            return 0.0;
        };

        let index = self.position as usize;
        let Some(&current) = audio.samples.get(index) else {
            self.playing = false;
            return 0.0;
        };
        let next = audio.samples.get(index + 1).copied().unwrap_or(0.0);
        let frac = (self.position - index as f64) as f32;

        self.position += self.step;
        current + (next - current) * frac
    }
}

/// Cursor plus gain, as the callback owns it
struct GuideSource {
    cursor: Arc<Mutex<GuideCursor>>,
    gain: f32,
}

impl MonoSource for GuideSource {
    fn render(&mut self, out: &mut [f32]) {
        if let Ok(mut cursor) = self.cursor.try_lock() {
            for value in out.iter_mut() {
                *value = cursor.next_sample() * self.gain;
            }
        } else {
            out.fill(0.0);
        }
    }
}

/// Guide playback on the default output device
///
/// The stream is opened on the first `play`, like the preview synth.
pub struct CpalGuideOutput {
    cursor: Arc<Mutex<GuideCursor>>,
    stream: Option<Stream>,
    gain: f32,
    notifier: Notifier,
}

impl CpalGuideOutput {
    pub fn new(gain: f32, notifier: Notifier) -> Self {
        Self {
            cursor: Arc::new(Mutex::new(GuideCursor::new(1.0))),
            stream: None,
            gain: gain.clamp(0.0, 1.0),
            notifier,
        }
    }

    pub fn is_started(&self) -> bool {
        self.stream.is_some()
    }

    fn ensure_stream(&mut self) -> Result<(), SynthError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let output = OutputDevice::open_default()?;
        if let Ok(mut cursor) = self.cursor.lock() {
            cursor.set_output_rate(output.sample_rate);
        }
        let source = GuideSource {
            cursor: Arc::clone(&self.cursor),
            gain: self.gain,
        };
        self.stream = Some(output.start(source, &self.notifier)?);
        log::info!("Guide output started: {} Hz", output.sample_rate);
        Ok(())
    }
}

impl GuideOutput for CpalGuideOutput {
    fn load(&mut self, audio: Arc<MonoAudio>) {
        match self.cursor.lock() {
            Ok(mut cursor) => cursor.load(audio),
            Err(_) => log::error!("Guide cursor poisoned, guide not loaded"),
        }
    }

    fn play(&mut self, from: Seconds) -> Result<(), SynthError> {
        if let Err(e) = self.ensure_stream() {
            self.notifier
                .error(NotificationCategory::Playback, e.to_string());
            return Err(e);
        }
        match self.cursor.lock() {
            Ok(mut cursor) => {
                cursor.start(from);
                Ok(())
            }
            Err(_) => Err(SynthError::Unavailable("guide cursor poisoned".to_string())),
        }
    }

    fn pause(&mut self) {
        if let Ok(mut cursor) = self.cursor.lock() {
            cursor.pause();
        }
    }

    fn position(&self) -> (Seconds, bool) {
        self.cursor
            .lock()
            .map(|c| (c.position(), c.is_playing()))
            .unwrap_or((Seconds::ZERO, false))
    }
}
