use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::Context;
use arc_swap::ArcSwapOption;
use atomic_float::AtomicF32;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::AudioCommand;

mod resampler;

pub use resampler::PlaybackResampler;

// State the UI thread and the audio callback both see. The callback only ever
// reads a complete snapshot of the loop; edits publish a new one.
pub struct LoopShared {
    pub samples: ArcSwapOption<Vec<f32>>,
    pub playhead: AtomicF32, // read position as a fraction of the loop
}

impl LoopShared {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            samples: ArcSwapOption::from(None),
            playhead: AtomicF32::new(0.0),
        })
    }
}

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    shared: Arc<LoopShared>,
    device_rate: Option<u32>,
    _output_stream: Option<cpal::Stream>, // None when no output device could be opened
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.tx.try_send(cmd);
    }

    // Hand the audio thread a fresh copy of the loop
    pub fn publish(&self, samples: &[f32]) {
        self.shared.samples.store(Some(Arc::new(samples.to_vec())));
    }

    pub fn playhead(&self) -> f32 {
        self.shared.playhead.load(Ordering::Relaxed)
    }

    pub fn device_rate(&self) -> Option<u32> {
        self.device_rate
    }
}

// Open the default output device and start streaming the loop. A missing or
// unusable device is reported and yields a silent handle; it never stops the app.
pub fn start_audio(native_rate: u32) -> AudioHandle {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);
    let shared = LoopShared::new();

    match open_output(native_rate, rx, shared.clone()) {
        Ok((stream, device_rate)) => {
            log::info!(
                "audio output running at {device_rate} Hz (loop native rate {native_rate} Hz)"
            );
            AudioHandle {
                tx,
                shared,
                device_rate: Some(device_rate),
                _output_stream: Some(stream),
            }
        }
        Err(e) => {
            log::warn!("audio output unavailable, playback will be silent: {e:#}");
            AudioHandle {
                tx,
                shared,
                device_rate: None,
                _output_stream: None,
            }
        }
    }
}

fn open_output(
    native_rate: u32,
    rx: Receiver<AudioCommand>,
    shared: Arc<LoopShared>,
) -> anyhow::Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let device_rate = config.sample_rate();
    let resampler = PlaybackResampler::new(PlaybackResampler::increment_for(native_rate, device_rate));

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_output_stream::<f32>(&device, &config.into(), rx, shared, resampler)?,
        cpal::SampleFormat::I16 => build_output_stream::<i16>(&device, &config.into(), rx, shared, resampler)?,
        cpal::SampleFormat::U16 => build_output_stream::<u16>(&device, &config.into(), rx, shared, resampler)?,
        other => anyhow::bail!("unsupported sample format {other:?}"),
    };
    stream.play().context("failed to play output stream")?;
    Ok((stream, device_rate))
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    shared: Arc<LoopShared>,
    mut resampler: PlaybackResampler,
) -> anyhow::Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = (config.channels as usize).max(1);
    let err_fn = |err| log::error!("audio output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _info| {
            while let Ok(cmd) = rx.try_recv() {
                resampler.handle_cmd(cmd);
            }

            let snapshot = shared.samples.load();
            let loop_data = snapshot.as_deref().map(|v| v.as_slice());
            for frame in data.chunks_mut(channels) {
                let s = T::from_sample(resampler.next_sample(loop_data));
                for ch in frame.iter_mut() {
                    *ch = s;
                }
            }

            if let Some(samples) = loop_data.filter(|s| !s.is_empty() && resampler.is_playing()) {
                let pos = (resampler.phase() / samples.len() as f64) as f32;
                shared.playhead.store(pos, Ordering::Relaxed);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
