use std::path::PathBuf;
use std::time::Duration;

use player_engine::start;
use player_transport::{AudioArc, frames_to_secs};

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: play_file <audio file>"))?;

    let audio = AudioArc::from_buffer(player_decode::decode_file(&path)?);
    let mut handle = start(audio)?;
    handle.play()?;

    loop {
        let status = handle.drain_status();
        if let Some(frame) = status.position {
            println!("position: {:.2}s", frames_to_secs(frame, handle.sample_rate()));
        }
        if status.finished {
            break;
        }
        std::thread::sleep(Duration::from_millis(250));
    }

    handle.shutdown()
}
