use std::sync::Arc;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Decoded PCM as it comes out of the decoder: interleaved, owned, mutable.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Immutable, cheaply clonable PCM handed to the output thread.
///
/// The samples sit behind an `Arc<[f32]>` so the engine thread and the
/// controller side can both hold the same audio without copying it. Samples
/// are interleaved (`[L, R, L, R, ...]` for stereo).
///
/// ```
/// use player_transport::AudioArc;
///
/// let audio = AudioArc::new(vec![0.0, 0.5, 1.0, 0.5], 44100, 2);
/// let shared = audio.clone();
/// assert_eq!(shared.frames(), 2);
/// assert_eq!(audio.frame(1), &[1.0, 0.5]);
/// ```
#[derive(Clone)]
pub struct AudioArc {
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: u16,
}

impl AudioArc {
    /// # Panics
    ///
    /// Panics if `channels` is 0 or `samples.len()` is not a whole number of frames.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        assert!(channels > 0, "channels must be greater than 0");
        assert_eq!(
            samples.len() % channels as usize,
            0,
            "samples.len() must be divisible by channels"
        );
        Self {
            samples: Arc::from(samples),
            sample_rate,
            channels,
        }
    }

    pub fn from_buffer(buffer: AudioBuffer) -> Self {
        Self::new(buffer.samples, buffer.sample_rate, buffer.channels)
    }

    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_arc(&self) -> &Arc<[f32]> {
        &self.samples
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// All channel samples of one frame.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.frames()`.
    #[inline]
    pub fn frame(&self, index: usize) -> &[f32] {
        let channels = self.channels as usize;
        &self.samples[index * channels..(index + 1) * channels]
    }

    /// Resample to `target_sample_rate`. Same-rate input returns a shared clone.
    pub fn resample(&self, target_sample_rate: u32) -> anyhow::Result<Self> {
        if self.sample_rate == target_sample_rate {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(Self::new(Vec::new(), target_sample_rate, self.channels));
        }

        let channels = self.channels as usize;
        let input_frames = self.frames();
        let ratio = target_sample_rate as f64 / self.sample_rate as f64;

        // rubato works on planar data
        let mut planar = vec![Vec::with_capacity(input_frames); channels];
        for frame in self.samples.chunks_exact(channels) {
            for (ch, sample) in frame.iter().enumerate() {
                planar[ch].push(*sample);
            }
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, input_frames, channels)?;
        let output = resampler.process(&planar, None)?;

        let output_frames = output.first().map_or(0, Vec::len);
        let mut interleaved = Vec::with_capacity(output_frames * channels);
        for frame_idx in 0..output_frames {
            for plane in &output {
                interleaved.push(plane[frame_idx]);
            }
        }

        Ok(Self::new(interleaved, target_sample_rate, self.channels))
    }
}

impl std::fmt::Debug for AudioArc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioArc")
            .field("frames", &self.frames())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("duration_secs", &self.duration_secs())
            .finish()
    }
}

/// Transport commands sent from the control side to the output thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    /// Pause and rewind to the first frame.
    Stop,
}

/// Reports sent back from the output thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Current read position, in frames of the device-rate audio.
    Position(u64),
    /// The last frame was rendered and playback halted on its own.
    Finished,
}

pub fn frames_to_secs(frames: u64, sample_rate: u32) -> f64 {
    frames as f64 / sample_rate as f64
}
