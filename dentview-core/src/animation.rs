//! Angle-driven part animation.
//!
//! Every part maps the controller's cumulative rotation, folded into
//! `[0, 360)` degrees, onto an opacity and a pose. Parts are independent;
//! the animator holds nothing but their configuration.
//!
//! Poses are blended per component, Euler angles included, so a large
//! rotation delta between `start` and `peak` sweeps the long way round.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// Fold any angle into `[0, 360)`; non-finite input maps to 0
pub fn normalize_degrees(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let d = degrees.rem_euclid(360.0);
    // Tiny negative inputs round up to exactly 360
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Angle → opacity mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpacityProfile {
    /// Always fully opaque
    #[default]
    Constant,
    /// Opaque around 0°, fades out over (90°, 135°), hidden through
    /// [135°, 225°], fades back in over (225°, 270°)
    SymmetricFade,
    /// Linear 1 → 0 over the first half turn, 0 → 1 over the second
    Sweep,
}

impl OpacityProfile {
    pub fn opacity(self, degrees: f32) -> f32 {
        let d = degrees;
        match self {
            OpacityProfile::Constant => 1.0,
            OpacityProfile::SymmetricFade => {
                if (135.0..=225.0).contains(&d) {
                    0.0
                } else if d > 90.0 && d < 135.0 {
                    1.0 - (d - 90.0) / 45.0
                } else if d > 225.0 && d < 270.0 {
                    (d - 225.0) / 45.0
                } else {
                    1.0
                }
            }
            OpacityProfile::Sweep => {
                if d <= 180.0 {
                    1.0 - d / 180.0
                } else {
                    (d - 180.0) / 180.0
                }
            }
        }
    }
}

/// Scale, translation and XYZ Euler rotation (radians) of one part
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub scale: f32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: [0.0; 3],
            rotation: [0.0; 3],
        }
    }
}

impl Pose {
    pub fn new(scale: f32, position: [f32; 3], rotation: [f32; 3]) -> Self {
        Self {
            scale,
            position,
            rotation,
        }
    }

    /// Component-wise blend; exact at `t = 0` and `t = 1`
    pub fn lerp(&self, other: &Pose, t: f32) -> Pose {
        let mix = |a: f32, b: f32| a * (1.0 - t) + b * t;
        let mix3 = |a: [f32; 3], b: [f32; 3]| [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])];

        Pose {
            scale: mix(self.scale, other.scale),
            position: mix3(self.position, other.position),
            rotation: mix3(self.rotation, other.rotation),
        }
    }
}

/// How a part's pose follows the angle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionProfile {
    /// Always at `start`
    #[default]
    Static,
    /// Rise start → peak over [0°, 135°], hold peak through (135°, 225°),
    /// fall peak → start over [225°, 360°]
    Cycle,
    /// Rise start → peak over the first half of `[start, end]` and fall back
    /// over the second; `start` pose outside the window
    Window { start: f32, end: f32 },
}

impl MotionProfile {
    pub const RISE_END: f32 = 135.0;
    pub const FALL_START: f32 = 225.0;

    /// The window in which `Cycle` parts hold their peak
    pub const HELD_WINDOW: MotionProfile = MotionProfile::Window {
        start: Self::RISE_END,
        end: Self::FALL_START,
    };

    /// Band sample as `(from_peak, progress)`: progress runs from `start`
    /// toward `peak`, or from `peak` back toward `start` when `from_peak`
    fn sample(self, d: f32) -> (bool, f32) {
        match self {
            MotionProfile::Static => (false, 0.0),
            MotionProfile::Cycle => {
                if (0.0..=Self::RISE_END).contains(&d) {
                    (false, d / Self::RISE_END)
                } else if (Self::FALL_START..=360.0).contains(&d) {
                    (true, (d - Self::FALL_START) / (360.0 - Self::FALL_START))
                } else if d > Self::RISE_END && d < Self::FALL_START {
                    (false, 1.0)
                } else {
                    (false, 0.0)
                }
            }
            MotionProfile::Window { start, end } => {
                let half = (end - start) / 2.0;
                if half <= 0.0 || d < start || d > end {
                    return (false, 0.0);
                }
                let mid = start + half;
                if d <= mid {
                    (false, (d - start) / half)
                } else {
                    (false, 1.0 - (d - mid) / half)
                }
            }
        }
    }
}

/// Static configuration for one animated part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartConfig {
    pub name: String,
    pub opacity: OpacityProfile,
    pub motion: MotionProfile,
    pub easing: Easing,
    pub start: Pose,
    pub peak: Pose,
    /// Hidden parts sample at zero opacity and are left out of camera framing
    pub visible: bool,
}

impl Default for PartConfig {
    fn default() -> Self {
        Self {
            name: "part".to_string(),
            opacity: OpacityProfile::Constant,
            motion: MotionProfile::Static,
            easing: Easing::QuadraticInOut,
            start: Pose::default(),
            peak: Pose::default(),
            visible: true,
        }
    }
}

impl PartConfig {
    /// Upper and lower arches that spread apart and fade out, plus a middle
    /// element that comes forward while they are hidden
    pub fn dental_set() -> Vec<PartConfig> {
        vec![
            PartConfig {
                name: "upper".to_string(),
                opacity: OpacityProfile::SymmetricFade,
                motion: MotionProfile::Cycle,
                start: Pose::new(0.7, [0.0, 5.0, 0.0], [0.0; 3]),
                peak: Pose::new(1.0, [0.0, 15.0, 0.0], [0.3, 0.0, 0.0]),
                ..PartConfig::default()
            },
            PartConfig {
                name: "lower".to_string(),
                opacity: OpacityProfile::SymmetricFade,
                motion: MotionProfile::Cycle,
                start: Pose::new(0.7, [0.0, -5.0, 0.0], [0.0; 3]),
                peak: Pose::new(1.0, [0.0, -15.0, 0.0], [-0.3, 0.0, 0.0]),
                ..PartConfig::default()
            },
            PartConfig {
                name: "appliance".to_string(),
                opacity: OpacityProfile::Constant,
                motion: MotionProfile::HELD_WINDOW,
                start: Pose::new(0.7, [0.0; 3], [0.0; 3]),
                peak: Pose::new(1.5, [0.0, 0.0, 10.0], [0.0; 3]),
                ..PartConfig::default()
            },
        ]
    }

    /// Poses the part can reach; every blend lies between them per component
    pub fn extreme_poses(&self) -> Vec<Pose> {
        match self.motion {
            MotionProfile::Static => vec![self.start],
            MotionProfile::Cycle | MotionProfile::Window { .. } => vec![self.start, self.peak],
        }
    }

    pub fn sample(&self, degrees: f32) -> PartSample {
        let d = normalize_degrees(degrees);
        let (from_peak, progress) = self.motion.sample(d);
        let eased = self.easing.evaluate(progress);

        let pose = if from_peak {
            self.peak.lerp(&self.start, eased)
        } else {
            self.start.lerp(&self.peak, eased)
        };

        PartSample {
            opacity: if self.visible { self.opacity.opacity(d) } else { 0.0 },
            pose,
        }
    }
}

/// Output for one part at one angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartSample {
    pub opacity: f32,
    pub pose: Pose,
}

/// All parts at one angle, in configuration order
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    /// Normalized angle in degrees
    pub degrees: f32,
    pub parts: Vec<PartSample>,
}

/// Evaluates a set of independently configured parts against one angle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animator {
    parts: Vec<PartConfig>,
}

impl Animator {
    pub fn new(parts: Vec<PartConfig>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[PartConfig] {
        &self.parts
    }

    pub fn evaluate(&self, rotation_degrees: f32) -> AnimationFrame {
        let degrees = normalize_degrees(rotation_degrees);
        AnimationFrame {
            degrees,
            parts: self.parts.iter().map(|part| part.sample(degrees)).collect(),
        }
    }

    /// Evaluate against the controller's rotation signal, in radians
    pub fn evaluate_radians(&self, rotation: f32) -> AnimationFrame {
        self.evaluate(rotation.to_degrees())
    }
}
