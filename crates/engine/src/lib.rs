use std::sync::mpsc;
use std::thread::JoinHandle;

use cpal::{
    FromSample, SizedSample,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use player_transport::{AudioArc, Command, Status};
use tracing::{debug, error, info};

const COMMAND_CAPACITY: usize = 64;
const STATUS_CAPACITY: usize = 64;

/// Control side of one running output stream.
///
/// The cpal stream lives on its own thread for the whole lifetime of the
/// handle, which keeps the handle `Send` on every platform. Dropping the handle
/// stops the stream and joins that thread.
pub struct AudioEngineHandle {
    pub commands: rtrb::Producer<Command>,
    pub status: rtrb::Consumer<Status>,
    sample_rate: u32,
    total_frames: u64,
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

/// What the output thread reported since the last drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusSummary {
    pub position: Option<u64>,
    pub finished: bool,
}

impl AudioEngineHandle {
    pub fn play(&mut self) -> anyhow::Result<()> {
        self.send(Command::Play)
    }

    pub fn pause(&mut self) -> anyhow::Result<()> {
        self.send(Command::Pause)
    }

    pub fn stop(&mut self) -> anyhow::Result<()> {
        self.send(Command::Stop)
    }

    fn send(&mut self, command: Command) -> anyhow::Result<()> {
        if self.thread.as_ref().is_none_or(|t| t.is_finished()) {
            anyhow::bail!("audio output thread is not running");
        }
        self.commands
            .push(command)
            .map_err(|_| anyhow::anyhow!("command queue full, dropped {command:?}"))
    }

    pub fn drain_status(&mut self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        while let Ok(status) = self.status.pop() {
            match status {
                Status::Position(frame) => summary.position = Some(frame),
                Status::Finished => summary.finished = true,
            }
        }
        summary
    }

    /// Device sample rate the audio was resampled to.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Stop the stream and wait for the output thread to exit.
    pub fn shutdown(mut self) -> anyhow::Result<()> {
        self.join()
    }

    fn join(&mut self) -> anyhow::Result<()> {
        // dropping the sender also wakes the thread
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| anyhow::anyhow!("audio output thread panicked"))?;
            debug!("audio output thread joined");
        }
        Ok(())
    }
}

impl Drop for AudioEngineHandle {
    fn drop(&mut self) {
        if let Err(e) = self.join() {
            error!("failed to shut down audio output: {e}");
        }
    }
}

/// Open the default output device and start a paused stream for `audio`.
///
/// Blocks until the stream is built (or failed to build) on the output thread.
pub fn start(audio: AudioArc) -> anyhow::Result<AudioEngineHandle> {
    let (command_tx, command_rx) = rtrb::RingBuffer::<Command>::new(COMMAND_CAPACITY);
    let (status_tx, status_rx) = rtrb::RingBuffer::<Status>::new(STATUS_CAPACITY);
    let (ready_tx, ready_rx) = mpsc::sync_channel::<anyhow::Result<(u32, u64)>>(1);
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

    let thread = std::thread::Builder::new()
        .name("audio-output".into())
        .spawn(move || {
            let stream = match open_stream(audio, command_rx, status_tx) {
                Ok((stream, sample_rate, frames)) => {
                    let _ = ready_tx.send(Ok((sample_rate, frames)));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            // park until the handle asks us to stop or goes away
            let _ = shutdown_rx.recv();
            drop(stream);
        })?;

    let (sample_rate, total_frames) = match ready_rx.recv() {
        Ok(Ok(ready)) => ready,
        Ok(Err(e)) => {
            let _ = thread.join();
            return Err(e);
        }
        Err(_) => {
            let _ = thread.join();
            anyhow::bail!("audio output thread exited before the stream was ready");
        }
    };

    Ok(AudioEngineHandle {
        commands: command_tx,
        status: status_rx,
        sample_rate,
        total_frames,
        shutdown: Some(shutdown_tx),
        thread: Some(thread),
    })
}

fn open_stream(
    audio: AudioArc,
    commands: rtrb::Consumer<Command>,
    status: rtrb::Producer<Status>,
) -> anyhow::Result<(cpal::Stream, u32, u64)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("no output device found"))?;

    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0;
    info!(
        device = %device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate,
        channels = config.channels(),
        "opening audio output"
    );

    let audio = audio.resample(sample_rate)?;
    let frames = audio.frames() as u64;
    let renderer = Renderer::new(audio, commands, status);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), renderer)?,
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), renderer)?,
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), renderer)?,
        sample_format => anyhow::bail!("unsupported sample format '{sample_format}'"),
    };

    stream.play()?;
    Ok((stream, sample_rate, frames))
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: Renderer,
) -> anyhow::Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let output_channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            renderer.render(data, output_channels);
        },
        |err| error!("stream error: {err}"),
        None,
    )?;

    Ok(stream)
}

/// Realtime half of the engine: reads one file's frames into device buffers.
///
/// Runs inside the audio callback, so it never allocates, locks or logs.
pub struct Renderer {
    audio: AudioArc,
    position: usize,
    playing: bool,
    commands: rtrb::Consumer<Command>,
    status: rtrb::Producer<Status>,
}

impl Renderer {
    pub fn new(
        audio: AudioArc,
        commands: rtrb::Consumer<Command>,
        status: rtrb::Producer<Status>,
    ) -> Self {
        Self {
            audio,
            position: 0,
            playing: false,
            commands,
            status,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn render<T>(&mut self, data: &mut [T], output_channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        let total_frames = self.audio.frames();

        while let Ok(command) = self.commands.pop() {
            match command {
                Command::Play => {
                    if self.position >= total_frames {
                        self.position = 0;
                    }
                    self.playing = true;
                }
                Command::Pause => self.playing = false,
                Command::Stop => {
                    self.playing = false;
                    self.position = 0;
                }
            }
        }

        for frame in data.chunks_mut(output_channels) {
            if !self.playing || self.position >= total_frames {
                frame.fill(T::from_sample(0.0));
                continue;
            }

            let source = self.audio.frame(self.position);
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = T::from_sample(source[ch % source.len()]);
            }

            self.position += 1;
            if self.position == total_frames {
                self.playing = false;
                let _ = self.status.push(Status::Finished);
            }
        }

        // positions are best effort; one slot always stays free for Finished
        if self.status.slots() > 1 {
            let _ = self.status.push(Status::Position(self.position as u64));
        }
    }
}
