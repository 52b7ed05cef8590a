//! Affect model based on Russell's circumplex: a point in Valence × Arousal.
//!
//! Both axes live in [-1, 1]. Continuous state is mapped onto five discrete
//! behavioral directives for the generation step; the mapping uses strict
//! thresholds so that values sitting exactly on ±0.3 read as neutral.

use serde::{Deserialize, Serialize};

/// Quadrant threshold on each axis. Strict comparison on both sides.
pub const QUADRANT_THRESHOLD: f32 = 0.3;

/// Description used when no affect has ever been recorded.
pub const SYSTEM_START_DESCRIPTION: &str = "neutral — system start";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affect {
    /// Pleasantness (-1.0 to 1.0)
    pub valence: f32,
    /// Energy (-1.0 to 1.0)
    pub arousal: f32,
}

impl Default for Affect {
    fn default() -> Self {
        Self {
            valence: 0.0,
            arousal: 0.0,
        }
    }
}

impl Affect {
    pub fn new(valence: f32, arousal: f32) -> Self {
        Self {
            valence: clamp_axis(valence),
            arousal: clamp_axis(arousal),
        }
    }

    pub fn neutral() -> Self {
        Self::default()
    }

    /// Pull both axes toward the origin by `factor`.
    pub fn decayed(&self, factor: f32) -> Self {
        Self::new(self.valence * factor, self.arousal * factor)
    }

    /// Apply caller-supplied deltas, clamping the result.
    pub fn shifted(&self, delta_valence: f32, delta_arousal: f32) -> Self {
        Self::new(self.valence + delta_valence, self.arousal + delta_arousal)
    }

    pub fn quadrant(&self) -> MoodQuadrant {
        let t = QUADRANT_THRESHOLD;
        let (v, a) = (self.valence, self.arousal);
        if v > t && a > t {
            MoodQuadrant::Euphoric
        } else if v > t && a < -t {
            MoodQuadrant::Serene
        } else if v < -t && a > t {
            MoodQuadrant::Irate
        } else if v < -t && a < -t {
            MoodQuadrant::Depressive
        } else {
            MoodQuadrant::Analytical
        }
    }

    /// Behavioral directive handed to the generation step.
    pub fn describe(&self) -> &'static str {
        self.quadrant().directive()
    }
}

/// NaN collapses to neutral.
fn clamp_axis(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(-1.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodQuadrant {
    Euphoric,
    Serene,
    Irate,
    Depressive,
    Analytical,
}

impl MoodQuadrant {
    pub fn directive(&self) -> &'static str {
        match self {
            MoodQuadrant::Euphoric => "euphoric/manic — intense, exclamatory",
            MoodQuadrant::Serene => "relaxed/serene — benevolent, peaceful",
            MoodQuadrant::Irate => "irate/aggressive — confrontational, cutting",
            MoodQuadrant::Depressive => "depressive/nihilistic — dark, terse, hopeless",
            MoodQuadrant::Analytical => "analytical/detached — neutral",
        }
    }
}

/// Mood as presented to the rest of a cycle, and as snapshotted into the action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSnapshot {
    pub valence: f32,
    pub arousal: f32,
    pub description: String,
}

impl MoodSnapshot {
    pub fn affect(&self) -> Affect {
        Affect::new(self.valence, self.arousal)
    }
}

impl From<Affect> for MoodSnapshot {
    fn from(affect: Affect) -> Self {
        Self {
            valence: affect.valence,
            arousal: affect.arousal,
            description: affect.describe().to_string(),
        }
    }
}
