//! Hand traces: recorded frames on disk and synthetic conducting.

use std::error::Error;
use std::f64::consts::TAU;
use std::fs;
use std::path::Path;

use conductor_lib::{HandFrame, HandPoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Control toggle requested on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Volume,
    Tempo,
}

/// One tracked frame. Coordinates are `[x, y]` pixels, `null` when the hand
/// was not detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub t: f64,
    #[serde(default)]
    pub left: Option<HandPoint>,
    #[serde(default)]
    pub right: Option<HandPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggle: Option<Toggle>,
}

impl TraceFrame {
    pub fn hands(&self) -> HandFrame {
        HandFrame::new(self.left, self.right)
    }
}

/// Read a trace and check that its timestamps never go backwards.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<TraceFrame>, Box<dyn Error>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .map_err(|err| format!("failed to read trace {}: {}", path.display(), err))?;
    let frames: Vec<TraceFrame> = serde_json::from_str(&data)?;
    if let Some(pair) = frames.windows(2).find(|pair| pair[1].t < pair[0].t) {
        return Err(format!("trace time goes backwards at t={}", pair[1].t).into());
    }
    Ok(frames)
}

pub fn save(path: impl AsRef<Path>, frames: &[TraceFrame]) -> Result<(), Box<dyn Error>> {
    fs::write(path, serde_json::to_string_pretty(frames)?)?;
    Ok(())
}

/// Parameters of a synthetic conducting performance.
#[derive(Debug, Clone)]
pub struct SyntheticTrace {
    pub bpm: f64,
    pub seconds: f64,
    pub fps: f64,
    /// Window `[start, end)` without any tracked hands.
    pub dropout: Option<(f64, f64)>,
    pub jitter: f64,
    pub seed: Option<u64>,
}

const CENTER_X: f64 = 640.0;
const REST_Y: f64 = 360.0;
const STROKE_PX: f64 = 80.0;
const SPREAD_PERIOD: f64 = 8.0;
const MAX_FALL_SECS: f64 = 0.2;

impl SyntheticTrace {
    /// Vertical offset of the right hand: a quick fall onto each beat and a
    /// slow rise back. The fall never lasts longer than the beat detector's
    /// refractory period, so each stroke counts once.
    fn stroke_offset(&self, t: f64) -> f64 {
        let period = 60.0 / self.bpm;
        let fall = (period * 0.3).min(MAX_FALL_SECS);
        let phase = t.rem_euclid(period);
        if phase < fall {
            -STROKE_PX / 2.0 + STROKE_PX * phase / fall
        } else {
            STROKE_PX / 2.0 - STROKE_PX * (phase - fall) / (period - fall)
        }
    }

    /// The right hand strokes down once per beat; the hands drift
    /// between close together and wide apart over a slow cycle.
    pub fn generate(&self) -> Vec<TraceFrame> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let count = (self.seconds * self.fps).round().max(0.0) as usize;

        (0..count)
            .map(|i| {
                let t = i as f64 / self.fps;
                let hidden = self
                    .dropout
                    .map_or(false, |(start, end)| t >= start && t < end);
                if hidden {
                    return TraceFrame {
                        t,
                        left: None,
                        right: None,
                        toggle: None,
                    };
                }

                let spread = 120.0 + 400.0 * (1.0 - (TAU * t / SPREAD_PERIOD).cos()) / 2.0;
                let stroke = self.stroke_offset(t);
                let mut noise = || {
                    if self.jitter > 0.0 {
                        rng.gen_range(-self.jitter..=self.jitter)
                    } else {
                        0.0
                    }
                };
                let left = HandPoint::new(CENTER_X - spread / 2.0 + noise(), REST_Y + noise());
                let right = HandPoint::new(
                    CENTER_X + spread / 2.0 + noise(),
                    REST_Y + stroke + noise(),
                );
                TraceFrame {
                    t,
                    left: Some(left),
                    right: Some(right),
                    toggle: None,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor_lib::gesture::BeatDetector;

    fn synthetic(bpm: f64) -> SyntheticTrace {
        SyntheticTrace {
            bpm,
            seconds: 12.0,
            fps: 30.0,
            dropout: None,
            jitter: 0.0,
            seed: Some(7),
        }
    }

    #[test]
    fn frame_json_uses_pairs_and_nulls() {
        let json = r#"[{"t":0.5,"left":[10,20],"right":null,"toggle":"tempo"},{"t":0.6}]"#;
        let frames: Vec<TraceFrame> = serde_json::from_str(json).expect("parse trace");
        assert_eq!(frames[0].left, Some(HandPoint::new(10.0, 20.0)));
        assert_eq!(frames[0].right, None);
        assert_eq!(frames[0].toggle, Some(Toggle::Tempo));
        assert_eq!(frames[1].hands(), HandFrame::empty());
    }

    #[test]
    fn backwards_time_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("trace.json");
        fs::write(&path, r#"[{"t":1.0},{"t":0.5}]"#).expect("write");
        let err = load(&path).expect_err("backwards trace");
        assert!(err.to_string().contains("backwards"));
    }

    #[test]
    fn synthetic_strokes_carry_the_tempo() {
        for bpm in [90.0, 120.0, 150.0] {
            let mut detector = BeatDetector::default();
            let mut estimate = None;
            for frame in synthetic(bpm).generate() {
                let right = frame.right.expect("right hand");
                estimate = detector.update(right.y, frame.t);
            }
            let estimate = estimate.expect("bpm estimate");
            assert!((estimate - bpm).abs() < bpm * 0.1, "{} vs {}", estimate, bpm);
        }
    }

    #[test]
    fn dropout_hides_both_hands() {
        let trace = SyntheticTrace {
            dropout: Some((2.0, 3.0)),
            ..synthetic(120.0)
        };
        let frames = trace.generate();
        assert_eq!(frames.len(), 360);
        for frame in &frames {
            let hidden = frame.t >= 2.0 && frame.t < 3.0;
            assert_eq!(frame.left.is_none(), hidden, "t={}", frame.t);
            assert_eq!(frame.right.is_none(), hidden, "t={}", frame.t);
        }
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let trace = SyntheticTrace {
            jitter: 3.0,
            ..synthetic(120.0)
        };
        assert_eq!(trace.generate(), trace.generate());
    }
}
