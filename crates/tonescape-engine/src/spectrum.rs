//! Spectrum sampling.
//!
//! An [`Analyser`] turns the latest window of time-domain samples into byte
//! magnitudes (one per frequency bin), the way a browser analysis node does:
//! Blackman window, FFT, temporal smoothing, then a decibel range mapped onto
//! `0..=255`. The [`SpectrumSampler`] pulls samples from an [`AnalysisTap`]
//! once per tick and keeps the resulting [`SpectrumFrame`].

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::Arc;

use crate::error::SignalError;

/// Transform size used by every mode
pub const DEFAULT_FFT_SIZE: usize = 512;

/// One tick's worth of per-bin magnitudes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectrumFrame {
    bins: Vec<u8>,
}

impl SpectrumFrame {
    pub fn from_bins(bins: Vec<u8>) -> Self {
        Self { bins }
    }

    /// A frame of `len` zero magnitudes
    pub fn silent(len: usize) -> Self {
        Self { bins: vec![0; len] }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bin `index` wrapped around the frame length, scaled to 0-1
    pub fn wrapped(&self, index: usize) -> Option<f32> {
        if self.bins.is_empty() {
            return None;
        }
        Some(self.bins[index % self.bins.len()] as f32 / 255.0)
    }

    /// A non-empty slice of bins.
    ///
    /// Band boundaries derived from the frame length can collapse on short
    /// frames; those come back as [`SignalError::EmptyBand`] instead of an
    /// empty slice.
    pub fn band(&self, range: Range<usize>) -> Result<&[u8], SignalError> {
        let len = self.bins.len();
        if range.start >= range.end || range.end > len {
            return Err(SignalError::EmptyBand {
                start: range.start,
                end: range.end,
                len,
            });
        }
        Ok(&self.bins[range])
    }

    fn bins_mut(&mut self) -> &mut [u8] {
        &mut self.bins
    }
}

/// A connectable source of time-domain samples (the analysis tap)
pub trait AnalysisTap {
    /// Fill `out` with the most recent mono samples, oldest first.
    /// Slots with no audio behind them are zero.
    fn read_time_domain(&self, out: &mut [f32]);
}

/// Analysis node settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyserSettings {
    pub fft_size: usize,
    /// Weight of the previous frame's magnitude (0 = no smoothing)
    pub smoothing: f32,
    pub min_db: f32,
    pub max_db: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

/// FFT analysis node producing byte spectra
pub struct Analyser {
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex<f32>>,
    window: Vec<f32>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(settings: AnalyserSettings) -> Self {
        let size = settings.fft_size.max(2);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);

        // Blackman window
        let window: Vec<f32> = (0..size)
            .map(|i| {
                let phase = std::f32::consts::TAU * i as f32 / size as f32;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            })
            .collect();

        Self {
            settings: AnalyserSettings {
                fft_size: size,
                ..settings
            },
            fft,
            fft_buffer: vec![Complex::new(0.0, 0.0); size],
            window,
            smoothed: vec![0.0; size / 2],
        }
    }

    pub fn fft_size(&self) -> usize {
        self.settings.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.settings.fft_size / 2
    }

    /// Forget the smoothing history (used when the audio source changes)
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|s| *s = 0.0);
    }

    /// Analyse the trailing `fft_size` samples of `time_domain` into `out`.
    /// Missing leading samples count as silence.
    pub fn process(&mut self, time_domain: &[f32], out: &mut [u8]) {
        let size = self.settings.fft_size;
        let pad = size.saturating_sub(time_domain.len());
        let tail = &time_domain[time_domain.len().saturating_sub(size)..];

        for (i, slot) in self.fft_buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        let tau = self.settings.smoothing.clamp(0.0, 1.0);
        let db_span = self.settings.max_db - self.settings.min_db;
        let bins = self.frequency_bin_count();

        for k in 0..bins {
            let magnitude = self.fft_buffer[k].norm() / size as f32;
            self.smoothed[k] = tau * self.smoothed[k] + (1.0 - tau) * magnitude;

            if let Some(slot) = out.get_mut(k) {
                let db = 20.0 * self.smoothed[k].log10();
                let scaled = (255.0 / db_span) * (db - self.settings.min_db);
                // -inf (exact silence) and NaN both land on 0
                *slot = if scaled.is_nan() {
                    0
                } else {
                    scaled.floor().clamp(0.0, 255.0) as u8
                };
            }
        }
    }
}

/// Pulls the current spectrum from a tap, once per tick
pub struct SpectrumSampler {
    analyser: Analyser,
    time_domain: Vec<f32>,
    frame: SpectrumFrame,
}

impl SpectrumSampler {
    pub fn new(settings: AnalyserSettings) -> Self {
        let analyser = Analyser::new(settings);
        let size = analyser.fft_size();
        let bins = analyser.frequency_bin_count();
        Self {
            analyser,
            time_domain: vec![0.0; size],
            frame: SpectrumFrame::silent(bins),
        }
    }

    /// Read the tap and replace the current frame
    pub fn sample(&mut self, tap: &dyn AnalysisTap) -> &SpectrumFrame {
        tap.read_time_domain(&mut self.time_domain);
        self.analyser
            .process(&self.time_domain, self.frame.bins_mut());
        &self.frame
    }

    /// The last sampled frame (silent before the first sample)
    pub fn frame(&self) -> &SpectrumFrame {
        &self.frame
    }

    pub fn reset(&mut self) {
        self.analyser.reset();
        self.frame = SpectrumFrame::silent(self.analyser.frequency_bin_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tap producing a pure sine that completes `cycles` periods per window
    struct SineTap {
        cycles: f32,
        amplitude: f32,
    }

    impl AnalysisTap for SineTap {
        fn read_time_domain(&self, out: &mut [f32]) {
            let n = out.len() as f32;
            for (i, s) in out.iter_mut().enumerate() {
                *s = self.amplitude
                    * (std::f32::consts::TAU * self.cycles * i as f32 / n).sin();
            }
        }
    }

    struct SilentTap;

    impl AnalysisTap for SilentTap {
        fn read_time_domain(&self, out: &mut [f32]) {
            out.iter_mut().for_each(|s| *s = 0.0);
        }
    }

    #[test]
    fn test_frame_length_is_half_fft_size() {
        let sampler = SpectrumSampler::new(AnalyserSettings::default());
        assert_eq!(sampler.frame().len(), DEFAULT_FFT_SIZE / 2);
    }

    #[test]
    fn test_silence_yields_zero_frame() {
        let mut sampler = SpectrumSampler::new(AnalyserSettings::default());
        let frame = sampler.sample(&SilentTap);
        assert!(frame.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut sampler = SpectrumSampler::new(AnalyserSettings::default());
        let tap = SineTap {
            cycles: 32.0,
            amplitude: 1.0,
        };
        for _ in 0..30 {
            sampler.sample(&tap);
        }
        let frame = sampler.frame();
        assert!(frame.bins()[32] > 200, "peak was {}", frame.bins()[32]);
        assert!(frame.bins()[100] < 50, "far bin was {}", frame.bins()[100]);
    }

    #[test]
    fn test_smoothing_keeps_energy_after_silence() {
        let mut sampler = SpectrumSampler::new(AnalyserSettings::default());
        let tap = SineTap {
            cycles: 16.0,
            amplitude: 1.0,
        };
        for _ in 0..30 {
            sampler.sample(&tap);
        }
        let frame = sampler.sample(&SilentTap);
        assert!(frame.bins()[16] > 0);

        sampler.reset();
        assert!(sampler.frame().bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let mut analyser = Analyser::new(AnalyserSettings::default());
        let mut out = vec![0u8; analyser.frequency_bin_count()];
        analyser.process(&[0.0; 10], &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_band_guards_empty_ranges() {
        let frame = SpectrumFrame::from_bins(vec![1, 2, 3, 4]);
        assert_eq!(frame.band(1..3), Ok(&[2u8, 3][..]));
        assert!(frame.band(2..2).is_err());
        assert!(frame.band(3..9).is_err());
        assert_eq!(SpectrumFrame::default().wrapped(3), None);
        assert_eq!(frame.wrapped(5), Some(2.0 / 255.0));
    }
}
