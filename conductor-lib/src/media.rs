//! Loop media inspection.
//!
//! Before a session starts the host probes the track it is about to loop, so
//! an unreadable file fails fast instead of surfacing as a silent backend.

use std::fs::File;
use std::path::Path;

use serde::Serialize;
use symphonia::core::codecs::{CodecParameters, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::MediaError;

/// Basic facts about a media file's first audio track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MediaInfo {
    pub sample_rate: u32,
    pub channels: u32,
    /// `None` when the container does not declare a frame count.
    pub duration_secs: Option<f64>,
}

/// Probe `path` and describe its first decodable audio track.
pub fn probe(path: impl AsRef<Path>) -> Result<MediaInfo, MediaError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| MediaError::Probe(err.to_string()))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(MediaError::NoAudioTrack)?;

    let params = &track.codec_params;
    let info = MediaInfo {
        sample_rate: params.sample_rate.unwrap_or(0),
        channels: params.channels.map(|c| c.count() as u32).unwrap_or(0),
        duration_secs: duration_secs(params),
    };
    log::debug!("probed {}: {:?}", path.display(), info);
    Ok(info)
}

fn duration_secs(params: &CodecParameters) -> Option<f64> {
    let frames = params.n_frames?;
    if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(params.start_ts + frames);
        return Some(time.seconds as f64 + time.frac);
    }
    params
        .sample_rate
        .filter(|&rate| rate > 0)
        .map(|rate| frames as f64 / rate as f64)
}
