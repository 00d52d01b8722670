use std::fs::File;
use std::path::Path;

use player_transport::AudioBuffer;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decode the first audio track of `path` into interleaved f32 PCM.
///
/// Corrupt packets are skipped. A file that yields no audio at all is an error,
/// so callers never get a silent, zero-length buffer back.
pub fn decode_file(path: &Path) -> anyhow::Result<AudioBuffer> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| anyhow::anyhow!("no audio track in {}", path.display()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2) as u16;

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;
    let mut decoded_channels = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                skipped += 1;
                debug!(%reason, "skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        // decoded spec wins over container params
        let spec = *decoded.spec();
        sample_rate = spec.rate;
        channels = stable_channel_count(&mut decoded_channels, spec.channels.count() as u16)?;

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "some packets could not be decoded");
    }
    if samples.is_empty() || channels == 0 {
        anyhow::bail!("no decodable audio in {}", path.display());
    }

    Ok(AudioBuffer {
        samples,
        sample_rate,
        channels,
    })
}

/// Interleaved samples only stay frame-aligned if every packet has the same
/// channel count as the first one.
fn stable_channel_count(first: &mut Option<u16>, channels: u16) -> anyhow::Result<u16> {
    match *first {
        None => {
            *first = Some(channels);
            Ok(channels)
        }
        Some(expected) if expected == channels => Ok(channels),
        Some(expected) => {
            anyhow::bail!("channel count changed mid-stream from {expected} to {channels}")
        }
    }
}
