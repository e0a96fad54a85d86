//! Audio sources feeding the analysis thread
//!
//! Both sources push mono samples into an `rtrb` ring buffer. Samples that
//! do not fit are dropped; the analysis side only ever sees a gap.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

/// Samples buffered between a source and the analysis thread
const RING_CAPACITY: usize = 1 << 16;

/// Sample rate of the generated test signal
const SYNTHETIC_SAMPLE_RATE: f32 = 48_000.0;

/// Samples generated per wake-up of the synthetic source
const SYNTHETIC_BLOCK: usize = 512;

/// A running source plus the consumer end of its sample queue.
pub struct Capture {
    pub samples: Consumer<f32>,
    pub sample_rate: f32,
    pub label: String,
    _source: Source,
}

enum Source {
    Device(cpal::Stream),
    Synthetic(SyntheticSource),
}

impl Capture {
    /// Open the default input device, mixing all channels down to mono.
    pub fn open_device() -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| eyre!("no default input device available"))?;
        let config = device
            .default_input_config()
            .wrap_err("failed to fetch default input config")?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(eyre!(
                "unsupported input sample format {:?}",
                config.sample_format()
            ));
        }

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels().max(1) as usize;
        let label = device.name().unwrap_or_else(|_| "input".to_string());

        let (mut producer, consumer) = RingBuffer::<f32>::new(RING_CAPACITY);

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let scale = 1.0 / channels as f32;
                    for frame in data.chunks(channels) {
                        let sample = frame.iter().sum::<f32>() * scale;
                        // Full queue: drop rather than block the callback
                        let _ = producer.push(sample);
                    }
                },
                |err| warn!("input stream error: {err}"),
                None,
            )
            .wrap_err("failed to build input stream")?;

        stream.play().wrap_err("failed to start input stream")?;
        info!(device = %label, sample_rate, channels, "capturing from input device");

        Ok(Self {
            samples: consumer,
            sample_rate,
            label,
            _source: Source::Device(stream),
        })
    }

    /// Start the generated test signal on its own thread.
    pub fn synthetic() -> EyreResult<Self> {
        let (producer, consumer) = RingBuffer::<f32>::new(RING_CAPACITY);
        let source = SyntheticSource::spawn(producer, SYNTHETIC_SAMPLE_RATE)?;
        info!(sample_rate = SYNTHETIC_SAMPLE_RATE, "generating synthetic partials");

        Ok(Self {
            samples: consumer,
            sample_rate: SYNTHETIC_SAMPLE_RATE,
            label: "synthetic".to_string(),
            _source: Source::Synthetic(source),
        })
    }
}

/// Background thread writing [`PartialSet`] output in real time.
struct SyntheticSource {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    fn spawn(mut producer: Producer<f32>, sample_rate: f32) -> EyreResult<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let block_time = Duration::from_secs_f32(SYNTHETIC_BLOCK as f32 / sample_rate);

        let worker = std::thread::Builder::new()
            .name("partials-synth".into())
            .spawn(move || {
                let mut partials = PartialSet::demo(sample_rate);
                let mut block = [0.0f32; SYNTHETIC_BLOCK];
                while flag.load(Ordering::Relaxed) {
                    partials.render(&mut block);
                    for &sample in &block {
                        let _ = producer.push(sample);
                    }
                    std::thread::sleep(block_time);
                }
            })
            .wrap_err("failed to spawn synthetic source thread")?;

        Ok(Self {
            running,
            worker: Some(worker),
        })
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// One gliding, gated sine.
struct Partial {
    base_freq: f32,
    /// Glide depth as a fraction of `base_freq`
    glide_depth: f32,
    glide_rate: f32,
    amplitude: f32,
    /// Gate cycle length in seconds
    gate_period: f32,
    /// Fraction of the gate cycle the partial sounds
    duty: f32,
    gate_offset: f32,
    phase: f32,
}

impl Partial {
    fn is_gated_on(&self, time: f32) -> bool {
        ((time / self.gate_period) + self.gate_offset).fract() < self.duty
    }
}

/// A handful of partials that glide, cross, start and stop.
pub struct PartialSet {
    partials: Vec<Partial>,
    sample_rate: f32,
    time: f32,
    noise_state: u32,
}

impl PartialSet {
    pub fn demo(sample_rate: f32) -> Self {
        let partial = |base_freq, glide_depth, glide_rate, amplitude, gate_period, duty, gate_offset| {
            Partial {
                base_freq,
                glide_depth,
                glide_rate,
                amplitude,
                gate_period,
                duty,
                gate_offset,
                phase: 0.0,
            }
        };

        Self {
            partials: vec![
                partial(220.0, 0.02, 0.25, 0.30, 7.0, 0.85, 0.0),
                partial(440.0, 0.01, 0.50, 0.20, 5.0, 0.70, 0.3),
                partial(660.0, 0.00, 0.00, 0.12, 3.0, 0.60, 0.5),
                // Sweeps across the 880 Hz partial
                partial(1000.0, 0.25, 0.08, 0.15, 11.0, 0.90, 0.1),
                partial(880.0, 0.005, 4.0, 0.10, 4.0, 0.50, 0.7),
                partial(1760.0, 0.03, 0.15, 0.05, 9.0, 0.40, 0.2),
            ],
            sample_rate,
            time: 0.0,
            noise_state: 0x1234_5678,
        }
    }

    pub fn render(&mut self, out: &mut [f32]) {
        let dt = 1.0 / self.sample_rate;
        for sample in out.iter_mut() {
            let mut acc = 0.0;
            for partial in &mut self.partials {
                let glide = (TAU * partial.glide_rate * self.time).sin();
                let freq = partial.base_freq * (1.0 + partial.glide_depth * glide);
                partial.phase = (partial.phase + TAU * freq * dt) % TAU;
                if partial.is_gated_on(self.time) {
                    acc += partial.amplitude * partial.phase.sin();
                }
            }
            *sample = acc + 0.002 * self.next_noise();
            self.time += dt;
        }
    }

    /// Xorshift white noise in `[-1, 1)`
    fn next_noise(&mut self) -> f32 {
        let mut x = self.noise_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise_state = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}
