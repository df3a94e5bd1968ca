//! The seven freestyle mutations and how they are drawn.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{RemixConfig, StemName};
use crate::freestyle::edits::SampleEdit;

/// Volume range for boosts.
const BOOST_MIN: f32 = 1.5;
const BOOST_MAX: f32 = 2.0;
/// Pitch drift range in semitones.
const DRIFT_SEMITONES: f32 = 2.0;
/// Stretch applied to drums and bass for a half-time feel.
const HALF_TIME_STRETCH: f32 = 2.0;
/// Chop note divisions (1/8 and 1/16 notes).
const CHOP_DIVISIONS: [u32; 2] = [8, 16];
/// Bars eligible for reversal.
const REVERSE_BARS: usize = 4;

/// Mutation taxonomy, drawn uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    StemMute,
    StemBoost,
    PitchDrift,
    HalfTime,
    Chop,
    ReverseBar,
    Isolate,
}

impl MutationKind {
    pub const ALL: [MutationKind; 7] = [
        MutationKind::StemMute,
        MutationKind::StemBoost,
        MutationKind::PitchDrift,
        MutationKind::HalfTime,
        MutationKind::Chop,
        MutationKind::ReverseBar,
        MutationKind::Isolate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::StemMute => "stem_mute",
            MutationKind::StemBoost => "stem_boost",
            MutationKind::PitchDrift => "pitch_drift",
            MutationKind::HalfTime => "half_time",
            MutationKind::Chop => "chop",
            MutationKind::ReverseBar => "reverse_bar",
            MutationKind::Isolate => "isolate",
        }
    }
}

/// One drawn mutation, as recorded in the manifest.
///
/// Numeric parameters are stored already rounded, and the rounded value is
/// what gets rendered, so a manifest entry reproduces its variation exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    Mute { stem: StemName },
    Boost { stem: StemName, gain: f32 },
    Pitch { stem: StemName, semitones: f32 },
    HalfTime { stems: Vec<StemName> },
    Chop { stem: StemName, division: u32 },
    ReverseBar { stem: StemName, bar: usize },
    Isolate { stem: StemName },
}

impl Mutation {
    /// Draws a kind, then a target stem, then the kind's parameter.
    ///
    /// Every kind consumes the target draw so the sequence of draws per
    /// variation has the same shape regardless of kind.
    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        let kind = MutationKind::ALL[rng.gen_range(0..MutationKind::ALL.len())];
        let stem = StemName::ALL[rng.gen_range(0..StemName::ALL.len())];

        match kind {
            MutationKind::StemMute => Mutation::Mute { stem },
            MutationKind::StemBoost => Mutation::Boost {
                stem,
                gain: round2(rng.gen_range(BOOST_MIN..=BOOST_MAX)),
            },
            MutationKind::PitchDrift => Mutation::Pitch {
                stem,
                semitones: round2(rng.gen_range(-DRIFT_SEMITONES..=DRIFT_SEMITONES)),
            },
            MutationKind::HalfTime => Mutation::HalfTime {
                stems: vec![StemName::Drums, StemName::Bass],
            },
            MutationKind::Chop => Mutation::Chop {
                stem,
                division: CHOP_DIVISIONS[rng.gen_range(0..CHOP_DIVISIONS.len())],
            },
            MutationKind::ReverseBar => Mutation::ReverseBar {
                stem,
                bar: rng.gen_range(0..REVERSE_BARS),
            },
            MutationKind::Isolate => Mutation::Isolate { stem },
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Mute { .. } => MutationKind::StemMute,
            Mutation::Boost { .. } => MutationKind::StemBoost,
            Mutation::Pitch { .. } => MutationKind::PitchDrift,
            Mutation::HalfTime { .. } => MutationKind::HalfTime,
            Mutation::Chop { .. } => MutationKind::Chop,
            Mutation::ReverseBar { .. } => MutationKind::ReverseBar,
            Mutation::Isolate { .. } => MutationKind::Isolate,
        }
    }

    /// Single target stem, if the mutation has one.
    pub fn target(&self) -> Option<StemName> {
        match *self {
            Mutation::Mute { stem }
            | Mutation::Boost { stem, .. }
            | Mutation::Pitch { stem, .. }
            | Mutation::Chop { stem, .. }
            | Mutation::ReverseBar { stem, .. }
            | Mutation::Isolate { stem } => Some(stem),
            Mutation::HalfTime { .. } => None,
        }
    }

    /// Per-stem config for this mutation, starting from all defaults.
    ///
    /// Chop and reverse-bar leave the config untouched; see [`Mutation::edit`].
    pub fn remix_config(&self) -> RemixConfig {
        let mut config = RemixConfig::all_default();
        match self {
            Mutation::Mute { stem } => config.entry(*stem).mute = true,
            Mutation::Boost { stem, gain } => config.entry(*stem).volume = *gain,
            Mutation::Pitch { stem, semitones } => config.entry(*stem).pitch = *semitones,
            Mutation::HalfTime { stems } => {
                for &stem in stems {
                    config.entry(stem).stretch = HALF_TIME_STRETCH;
                }
            }
            Mutation::Isolate { stem } => {
                for name in StemName::ALL {
                    if name != *stem {
                        config.entry(name).mute = true;
                    }
                }
            }
            Mutation::Chop { .. } | Mutation::ReverseBar { .. } => {}
        }
        config
    }

    /// Sample edit to run on the stem set before rendering, if any.
    pub fn edit(&self) -> Option<SampleEdit> {
        match *self {
            Mutation::Chop { stem, division } => Some(SampleEdit::Chop { stem, division }),
            Mutation::ReverseBar { stem, bar } => Some(SampleEdit::ReverseBar { stem, bar }),
            _ => None,
        }
    }
}

#[inline]
fn round2(x: f32) -> f32 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_rng_draws_first_kind_and_stem() {
        let mut rng = StepRng::new(0, 0);
        assert_eq!(
            Mutation::draw(&mut rng),
            Mutation::Mute {
                stem: StemName::Vocals
            }
        );
    }

    #[test]
    fn test_seeded_draws_repeat() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(Mutation::draw(&mut a), Mutation::draw(&mut b));
        }
    }

    #[test]
    fn test_draw_covers_taxonomy_and_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let m = Mutation::draw(&mut rng);
            seen.insert(m.kind());
            match m {
                Mutation::Boost { gain, .. } => assert!((1.5..=2.0).contains(&gain)),
                Mutation::Pitch { semitones, .. } => assert!((-2.0..=2.0).contains(&semitones)),
                Mutation::Chop { division, .. } => assert!(division == 8 || division == 16),
                Mutation::ReverseBar { bar, .. } => assert!(bar < 4),
                _ => {}
            }
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn test_isolate_config() {
        let cfg = Mutation::Isolate {
            stem: StemName::Drums,
        }
        .remix_config();
        for name in StemName::ALL {
            assert_eq!(cfg.get(name).mute, name != StemName::Drums, "{}", name);
        }
    }

    #[test]
    fn test_half_time_config() {
        let cfg = Mutation::HalfTime {
            stems: vec![StemName::Drums, StemName::Bass],
        }
        .remix_config();
        assert_eq!(cfg.get(StemName::Drums).stretch, 2.0);
        assert_eq!(cfg.get(StemName::Bass).stretch, 2.0);
        assert_eq!(cfg.get(StemName::Vocals).stretch, 1.0);
    }

    #[test]
    fn test_edits_leave_config_default() {
        let chop = Mutation::Chop {
            stem: StemName::Other,
            division: 16,
        };
        assert_eq!(chop.remix_config(), RemixConfig::all_default());
        assert!(chop.edit().is_some());
        assert!(Mutation::Mute {
            stem: StemName::Bass
        }
        .edit()
        .is_none());
    }

    #[test]
    fn test_serialized_shapes() {
        let boost = Mutation::Boost {
            stem: StemName::Bass,
            gain: 1.73,
        };
        assert_eq!(
            serde_json::to_string(&boost).unwrap(),
            r#"{"type":"boost","stem":"bass","gain":1.73}"#
        );
        let half = Mutation::HalfTime {
            stems: vec![StemName::Drums, StemName::Bass],
        };
        assert_eq!(
            serde_json::to_string(&half).unwrap(),
            r#"{"type":"half_time","stems":["drums","bass"]}"#
        );
        let rev = Mutation::ReverseBar {
            stem: StemName::Vocals,
            bar: 2,
        };
        assert_eq!(
            serde_json::to_string(&rev).unwrap(),
            r#"{"type":"reverse_bar","stem":"vocals","bar":2}"#
        );
        let back: Mutation = serde_json::from_str(r#"{"type":"chop","stem":"drums","division":8}"#).unwrap();
        assert_eq!(
            back,
            Mutation::Chop {
                stem: StemName::Drums,
                division: 8
            }
        );
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.734_9), 1.73);
        assert_eq!(round2(-0.005_1), -0.01);
    }
}
