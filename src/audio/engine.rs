// Audio output - CPAL stream rendering scheduled click tones
//
// The control side pushes `ScheduledTone`s through a lock-free ring buffer;
// the real-time callback activates each tone when the sample counter reaches
// its start time and synthesizes a sine pulse with an exponential decay
// envelope. The same sample counter backs the `AudioClock` handed to the
// scheduler, so "schedule time" and "render time" live on one timeline.
//
// Suspension is a flag checked by the callback: while set, the callback
// writes silence and does not advance the counter, which freezes the clock
// without touching the (not `Send`) cpal `Stream` from another thread.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use ringbuf::{
    HeapRb,
    traits::{Consumer, Producer, Split},
};
use std::f32::consts::PI;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use thiserror::Error;

use crate::audio::clock::{AudioClock, ClockState};
use crate::audio::parameters::AtomicF32;
use crate::audio::timing::AudioTiming;
use crate::audio::tone::ToneSink;

/// Capacity of the scheduled-tone queue (control side -> audio callback)
/// At the maximum click density (300 BPM, four subdivisions per beat) the
/// 100 ms scheduling horizon holds at most a handful of tones; 256 leaves
/// generous slack for bursts after a stalled poll.
const TONE_QUEUE_CAPACITY: usize = 256;

/// Tones waiting inside the callback for their start sample
const PENDING_TONE_CAPACITY: usize = 64;

/// Simultaneous click voices (clicks are short; overlap is rare)
const VOICE_POOL_SIZE: usize = 8;

/// Exponential envelope target, near-silence by the end of the pulse
const GAIN_FLOOR: f32 = 0.001;

/// Audio subsystem errors - all fatal at initialization, surfaced to the caller
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No audio output device found")]
    NoDevice,

    #[error("Failed to query device configuration: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("Unsupported sample format: {0:?}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(SampleFormat),

    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// Output device health, shared with the error callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Connecting = 0,
    Connected = 1,
    Error = 2,
}

impl From<u8> for DeviceStatus {
    fn from(value: u8) -> Self {
        match value {
            0 => DeviceStatus::Connecting,
            1 => DeviceStatus::Connected,
            _ => DeviceStatus::Error,
        }
    }
}

/// Atomic wrapper to share device status between threads
#[derive(Clone)]
pub struct AtomicDeviceStatus {
    inner: Arc<AtomicU8>,
}

impl AtomicDeviceStatus {
    pub fn new(status: DeviceStatus) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(status as u8)),
        }
    }

    pub fn get(&self) -> DeviceStatus {
        DeviceStatus::from(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, status: DeviceStatus) {
        self.inner.store(status as u8, Ordering::Relaxed);
    }
}

/// A click committed to the audio timeline
#[derive(Debug, Clone, Copy)]
struct ScheduledTone {
    start_sample: u64,
    frequency: f32,
    duration_samples: u32,
    volume: f32,
}

type ToneProducer = ringbuf::HeapProd<ScheduledTone>;
type ToneConsumer = ringbuf::HeapCons<ScheduledTone>;

/// One rendering voice: sine oscillator with exponential decay
/// Starting at peak and decaying to `GAIN_FLOOR` avoids audible edges at the
/// tone's start and stop.
#[derive(Debug, Clone, Copy)]
struct ToneVoice {
    remaining: u32,
    phase: f32,
    phase_inc: f32,
    gain: f32,
    decay: f32,
}

impl ToneVoice {
    const fn idle() -> Self {
        Self {
            remaining: 0,
            phase: 0.0,
            phase_inc: 0.0,
            gain: 0.0,
            decay: 1.0,
        }
    }

    fn is_active(&self) -> bool {
        self.remaining > 0
    }

    fn start(&mut self, tone: &ScheduledTone, sample_rate: f32) {
        let samples = tone.duration_samples.max(1);
        self.remaining = samples;
        self.phase = 0.0;
        self.phase_inc = 2.0 * PI * tone.frequency / sample_rate;
        self.gain = tone.volume;
        self.decay = if tone.volume > GAIN_FLOOR {
            (GAIN_FLOOR / tone.volume).powf(1.0 / samples as f32)
        } else {
            1.0
        };
    }

    fn next_sample(&mut self) -> f32 {
        if self.remaining == 0 {
            return 0.0;
        }

        let sample = self.phase.sin() * self.gain;

        self.phase += self.phase_inc;
        if self.phase >= 2.0 * PI {
            self.phase -= 2.0 * PI;
        }
        self.gain *= self.decay;
        self.remaining -= 1;

        sample
    }
}

/// Soft saturation keeping overlapping clicks inside [-1, 1]
#[inline]
fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Write one mono f32 sample to all channels of an interleaved frame,
/// converting to the device's sample format
#[inline]
fn write_mono_to_interleaved_frame<T>(sample: f32, frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    let converted = T::from_sample(sample);
    for out in frame.iter_mut() {
        *out = converted;
    }
}

/// `AudioClock` backed by the output stream's sample counter
#[derive(Clone)]
pub struct StreamClock {
    timing: AudioTiming,
    suspended: Arc<AtomicBool>,
}

impl AudioClock for StreamClock {
    fn now(&self) -> f64 {
        self.timing.current_seconds()
    }

    fn resume(&self) {
        self.suspended.store(false, Ordering::Relaxed);
    }

    fn suspend(&self) {
        self.suspended.store(true, Ordering::Relaxed);
    }

    fn state(&self) -> ClockState {
        if self.suspended.load(Ordering::Relaxed) {
            ClockState::Suspended
        } else {
            ClockState::Running
        }
    }
}

/// `ToneSink` feeding the output stream's tone queue
pub struct StreamToneSink {
    producer: ToneProducer,
    timing: AudioTiming,
}

impl ToneSink for StreamToneSink {
    fn schedule(&mut self, time: f64, frequency: f32, duration: f64, volume: f32) {
        let tone = ScheduledTone {
            start_sample: self.timing.seconds_to_samples(time),
            frequency,
            duration_samples: self.timing.seconds_to_samples(duration) as u32,
            volume,
        };

        // try_push is non-blocking; a full queue only drops this click
        if self.producer.try_push(tone).is_err() {
            eprintln!("Tone queue full, dropping click");
        }
    }
}

/// CPAL-backed audio output
///
/// Owns the device and stream; must stay alive for the duration of playback.
/// The stream is kept on the opening thread (it is not `Send` on every
/// platform); cross-thread control goes through the atomic handles instead.
pub struct AudioOutput {
    _device: Device,
    _stream: Stream,
    timing: AudioTiming,
    /// Master output volume, adjustable from any thread
    pub volume: AtomicF32,
    /// Device health; flips to `Error` when the stream reports a fault
    pub status: AtomicDeviceStatus,
}

impl AudioOutput {
    /// Open the default output device and start the stream
    ///
    /// Returns the output plus the clock and tone-sink handles to hand to the
    /// scheduler. A missing device, an unsupported format, or a stream
    /// failure is returned as an error, never masked.
    pub fn open() -> Result<(Self, StreamClock, StreamToneSink), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        println!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0 as f32;
        let channels = supported_config.channels() as usize;
        let config: StreamConfig = supported_config.into();

        let timing = AudioTiming::new(sample_rate);
        let suspended = Arc::new(AtomicBool::new(false));
        let volume = AtomicF32::new(1.0);
        let status = AtomicDeviceStatus::new(DeviceStatus::Connecting);

        let (tone_tx, tone_rx) = HeapRb::<ScheduledTone>::new(TONE_QUEUE_CAPACITY).split();

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &config,
                channels,
                timing.clone(),
                Arc::clone(&suspended),
                volume.clone(),
                status.clone(),
                tone_rx,
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &config,
                channels,
                timing.clone(),
                Arc::clone(&suspended),
                volume.clone(),
                status.clone(),
                tone_rx,
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &config,
                channels,
                timing.clone(),
                Arc::clone(&suspended),
                volume.clone(),
                status.clone(),
                tone_rx,
            ),
            other => return Err(AudioError::UnsupportedFormat(other)),
        }?;

        stream.play()?;
        status.set(DeviceStatus::Connected);

        let clock = StreamClock {
            timing: timing.clone(),
            suspended,
        };
        let sink = StreamToneSink {
            producer: tone_tx,
            timing: timing.clone(),
        };
        let output = Self {
            _device: device,
            _stream: stream,
            timing,
            volume,
            status,
        };

        Ok((output, clock, sink))
    }

    pub fn sample_rate(&self) -> f32 {
        self.timing.sample_rate()
    }

    #[allow(clippy::too_many_arguments)]
    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        timing: AudioTiming,
        suspended: Arc<AtomicBool>,
        volume: AtomicF32,
        status: AtomicDeviceStatus,
        mut tone_rx: ToneConsumer,
    ) -> Result<Stream, AudioError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let sample_rate = timing.sample_rate();
        let mut pending: Vec<ScheduledTone> = Vec::with_capacity(PENDING_TONE_CAPACITY);
        let mut voices = [ToneVoice::idle(); VOICE_POOL_SIZE];
        let error_status = status.clone();

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Real-time zone: no allocations, no I/O, no blocking locks

                // Pull newly committed tones into the pending list
                while pending.len() < PENDING_TONE_CAPACITY {
                    match tone_rx.try_pop() {
                        Some(tone) => pending.push(tone),
                        None => break,
                    }
                }

                // While suspended: silence, counter frozen (the clock stops)
                if suspended.load(Ordering::Relaxed) {
                    for out in data.iter_mut() {
                        *out = T::EQUILIBRIUM;
                    }
                    return;
                }

                let block_start = timing.current_sample();
                let master = volume.get();

                for (frame_index, frame) in data.chunks_mut(channels).enumerate() {
                    let now = block_start + frame_index as u64;

                    // Activate tones whose start time has arrived
                    let mut i = 0;
                    while i < pending.len() {
                        if pending[i].start_sample <= now {
                            let tone = pending.swap_remove(i);
                            if let Some(voice) =
                                voices.iter_mut().find(|voice| !voice.is_active())
                            {
                                voice.start(&tone, sample_rate);
                            }
                        } else {
                            i += 1;
                        }
                    }

                    let mut mixed = 0.0;
                    for voice in voices.iter_mut() {
                        mixed += voice.next_sample();
                    }

                    write_mono_to_interleaved_frame(soft_clip(mixed * master), frame);
                }

                timing.advance(data.len() / channels);
            },
            move |err| {
                // Lost or failing device: report as an engine fault, no retry
                error_status.set(DeviceStatus::Error);
                eprintln!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}
