use std::fmt::{self, Display, Formatter};

use conductor_lib::playback::PlaybackRamp;
use conductor_lib::{StepReport, TransportAction};

/// Session counters printed when a replay ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub frames: usize,
    pub auto_pauses: usize,
    pub auto_resumes: usize,
    pub last_bpm: Option<f64>,
    pub final_rate: f64,
    pub final_volume: u8,
}

impl Summary {
    pub fn record(&mut self, report: &StepReport) {
        self.frames += 1;
        match report.action {
            Some(TransportAction::AutoPaused) => self.auto_pauses += 1,
            Some(TransportAction::AutoResumed) => self.auto_resumes += 1,
            None => {}
        }
        if report.bpm.is_some() {
            self.last_bpm = report.bpm;
        }
    }

    /// Capture the final playback state.
    pub fn finish(&mut self, playback: &PlaybackRamp) {
        let snapshot = playback.snapshot();
        self.final_rate = snapshot.rate;
        self.final_volume = snapshot.current_volume.round().clamp(0.0, 100.0) as u8;
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} auto_pauses={} auto_resumes={}",
            self.frames, self.auto_pauses, self.auto_resumes
        )?;
        if let Some(bpm) = self.last_bpm {
            write!(f, " bpm={:.1}", bpm)?;
        }
        write!(f, " rate={:.3} volume={}", self.final_rate, self.final_volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_lib::MusicStatus;

    fn report(action: Option<TransportAction>, bpm: Option<f64>) -> StepReport {
        StepReport {
            bpm,
            rate: 1.0,
            volume: None,
            music_status: MusicStatus::Playing,
            action,
            volume_enabled: true,
            tempo_enabled: true,
            auto_paused: false,
        }
    }

    #[test]
    fn counts_actions_and_keeps_last_tempo() {
        let mut summary = Summary::default();
        summary.record(&report(Some(TransportAction::AutoResumed), None));
        summary.record(&report(None, Some(118.0)));
        summary.record(&report(Some(TransportAction::AutoPaused), None));
        summary.final_rate = 0.98;
        summary.final_volume = 64;

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.last_bpm, Some(118.0));
        assert_eq!(
            summary.to_string(),
            "frames=3 auto_pauses=1 auto_resumes=1 bpm=118.0 rate=0.980 volume=64"
        );
    }
}
