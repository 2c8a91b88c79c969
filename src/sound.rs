// Shutter feedback sound.
// With the `sound` feature a short synthesized click goes to the default
// audio output; otherwise the terminal bell rings. Either way a failure is
// only worth a warning: the photo still gets taken.

use std::io::Write;

/// Deterministic xorshift32; plenty for click noise.
#[cfg(any(feature = "sound", test))]
#[derive(Clone)]
struct Rng32 {
    state: u32,
}

#[cfg(any(feature = "sound", test))]
impl Rng32 {
    fn from_seed(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform [-1, 1)
    #[inline]
    fn next_signed(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / ((1u32 << 23) as f32) - 1.0
    }
}

/// Mono click: a burst of noise with a fast exponential decay.
#[cfg(any(feature = "sound", test))]
pub fn click_samples(sample_rate: u32) -> Vec<f32> {
    let len = (sample_rate as usize * 60) / 1000; // 60 ms
    let mut rng = Rng32::from_seed(0x5EED_C11C);
    let tau = sample_rate as f32 * 0.008;
    (0..len)
        .map(|i| 0.6 * rng.next_signed() * (-(i as f32) / tau).exp())
        .collect()
}

pub struct ShutterSound {
    enabled: bool,
    #[cfg(feature = "sound")]
    stream: Option<cpal::Stream>,
}

impl ShutterSound {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            #[cfg(feature = "sound")]
            stream: None,
        }
    }

    pub fn play(&mut self) {
        if !self.enabled {
            return;
        }
        #[cfg(feature = "sound")]
        match output::play_click() {
            Ok(stream) => {
                // dropping the previous stream stops it; the click is long over
                self.stream = Some(stream);
                return;
            }
            Err(e) => log::warn!("shutter sound: {e}"),
        }
        let mut err = std::io::stderr();
        if let Err(e) = err.write_all(b"\x07").and_then(|_| err.flush()) {
            log::warn!("shutter bell: {e}");
        }
    }
}

#[cfg(feature = "sound")]
mod output {
    use std::sync::Arc;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};

    use super::click_samples;

    pub fn play_click() -> Result<Stream, String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "no output device".to_string())?;
        let supported = device
            .default_output_config()
            .map_err(|e| format!("output config: {e}"))?;
        let config: StreamConfig = supported.config();
        let samples = Arc::new(click_samples(config.sample_rate.0));

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build::<f32>(&device, &config, samples),
            SampleFormat::I16 => build::<i16>(&device, &config, samples),
            SampleFormat::U16 => build::<u16>(&device, &config, samples),
            other => Err(format!("unsupported sample format {other:?}")),
        }?;
        stream.play().map_err(|e| format!("play: {e}"))?;
        Ok(stream)
    }

    fn build<T>(device: &cpal::Device, config: &StreamConfig, samples: Arc<Vec<f32>>) -> Result<Stream, String>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        let mut pos = 0usize;
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let s = samples.get(pos).copied().unwrap_or(0.0);
                        pos += 1;
                        let v = T::from_sample(s);
                        for out in frame.iter_mut() {
                            *out = v;
                        }
                    }
                },
                |e| log::warn!("shutter sound stream: {e}"),
                None,
            )
            .map_err(|e| format!("build stream: {e}"))
    }
}
