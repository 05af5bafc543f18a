// Waveform module - WAV peak decoding and the renderer lanes draw with

pub mod peaks;
pub mod renderer;

pub use peaks::{
    MonoAudio, WaveformPeaks, decode_wav, decode_wav_peaks, fetch_wav, fetch_wav_peaks,
    peaks_from_samples,
};
pub use renderer::{PeakRenderer, PeakRendererFactory};
