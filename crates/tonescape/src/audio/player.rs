//! Track playback through the default output device.
//!
//! The cpal callback and the UI thread share one [`Playback`] behind a
//! mutex. The callback advances the cursor and records what it played into
//! a small ring, which the engine reads back through [`AnalysisTap`].

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tonescape_engine::AnalysisTap;

use super::Track;

/// Samples kept for analysis; at least one FFT window
pub const TAP_CAPACITY: usize = 2048;

struct Playback {
    samples: Vec<f32>,
    cursor: f64,
    paused: bool,
    recent: VecDeque<f32>,
}

impl Playback {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            cursor: 0.0,
            paused: true,
            recent: VecDeque::with_capacity(TAP_CAPACITY),
        }
    }

    fn finished(&self) -> bool {
        self.cursor as usize >= self.samples.len()
    }

    /// Fill an interleaved output buffer, stepping `step` source samples per
    /// output frame (nearest-sample resampling)
    fn render(&mut self, out: &mut [f32], channels: usize, step: f64) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let sample = if self.paused {
                0.0
            } else {
                match self.samples.get(self.cursor as usize) {
                    Some(&s) => {
                        self.cursor += step;
                        s
                    }
                    None => {
                        self.paused = true;
                        0.0
                    }
                }
            };
            frame.fill(sample);

            if self.recent.len() == TAP_CAPACITY {
                self.recent.pop_front();
            }
            self.recent.push_back(sample);
        }
    }

    fn read_recent(&self, out: &mut [f32]) {
        out.fill(0.0);
        let n = out.len().min(self.recent.len());
        let skip = self.recent.len() - n;
        let start = out.len() - n;
        for (slot, &s) in out[start..].iter_mut().zip(self.recent.iter().skip(skip)) {
            *slot = s;
        }
    }
}

pub struct Player {
    name: String,
    shared: Arc<Mutex<Playback>>,
    _stream: Stream,
}

impl Player {
    /// Open the default output device for `track`. Playback starts paused.
    pub fn new(track: Track) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device found"))?;
        let config = device
            .default_output_config()
            .context("Failed to get output config")?;

        let output_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        let step = track.sample_rate as f64 / output_rate as f64;
        log::info!(
            "Output: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            output_rate,
            channels
        );

        let shared = Arc::new(Mutex::new(Playback::new(track.samples)));
        let callback_state = Arc::clone(&shared);
        let err_fn = |err| log::warn!("Audio stream error: {}", err);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    match callback_state.lock() {
                        Ok(mut playback) => playback.render(data, channels, step),
                        Err(_) => data.fill(0.0),
                    }
                },
                err_fn,
                None,
            )
            .context("Failed to build output stream")?;
        stream.play().context("Failed to start output stream")?;

        Ok(Self {
            name: track.name,
            shared,
            _stream: stream,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().map(|p| p.paused).unwrap_or(true)
    }

    /// Play or pause; a finished track restarts from the top
    pub fn toggle(&self) -> bool {
        match self.shared.lock() {
            Ok(mut playback) => {
                if playback.paused && playback.finished() {
                    playback.cursor = 0.0;
                }
                playback.paused = !playback.paused;
                !playback.paused
            }
            Err(_) => false,
        }
    }

    pub fn pause(&self) {
        if let Ok(mut playback) = self.shared.lock() {
            playback.paused = true;
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.pause();
        log::debug!("Dropped player for {}", self.name);
    }
}

impl AnalysisTap for Player {
    fn read_time_domain(&self, out: &mut [f32]) {
        match self.shared.lock() {
            Ok(playback) => playback.read_recent(out),
            Err(_) => out.fill(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paused_renders_silence() {
        let mut playback = Playback::new(vec![0.5; 16]);
        let mut out = [1.0; 8];
        playback.render(&mut out, 2, 1.0);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(playback.cursor, 0.0);
    }

    #[test]
    fn test_render_duplicates_across_channels() {
        let mut playback = Playback::new(vec![0.1, 0.2, 0.3]);
        playback.paused = false;
        let mut out = [0.0; 4];
        playback.render(&mut out, 2, 1.0);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_nearest_sample_resampling() {
        let mut playback = Playback::new(vec![0.0, 1.0, 2.0, 3.0]);
        playback.paused = false;
        let mut out = [0.0; 4];
        // source at half the output rate
        playback.render(&mut out, 1, 0.5);
        assert_eq!(out, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_end_of_track_pauses() {
        let mut playback = Playback::new(vec![0.5, 0.5]);
        playback.paused = false;
        let mut out = [0.0; 4];
        playback.render(&mut out, 1, 1.0);
        assert_eq!(out, [0.5, 0.5, 0.0, 0.0]);
        assert!(playback.paused);
        assert!(playback.finished());
    }

    #[test]
    fn test_tap_returns_latest_samples_padded() {
        let mut playback = Playback::new(vec![0.1, 0.2, 0.3]);
        playback.paused = false;
        let mut out = [0.0; 3];
        playback.render(&mut out, 1, 1.0);

        let mut tap = [9.0; 5];
        playback.read_recent(&mut tap);
        assert_eq!(tap, [0.0, 0.0, 0.1, 0.2, 0.3]);

        let mut short = [9.0; 2];
        playback.read_recent(&mut short);
        assert_eq!(short, [0.2, 0.3]);
    }

    #[test]
    fn test_ring_is_bounded() {
        let mut playback = Playback::new(vec![0.0; TAP_CAPACITY * 2]);
        playback.paused = false;
        let mut out = vec![0.0; TAP_CAPACITY + 10];
        playback.render(&mut out, 1, 1.0);
        assert_eq!(playback.recent.len(), TAP_CAPACITY);
    }
}
