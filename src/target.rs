//! Tracked-target records and template quality states.

/// Integer pixel position in the coordinate space of the level handling it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Maps the position into the next coarser pyramid level.
    pub(crate) fn half(self) -> Self {
        Self {
            x: self.x / 2,
            y: self.y / 2,
        }
    }
}

/// Lifetime state of a target's reference template.
///
/// Valid transitions are `Uninitialized -> JustAcquired -> Scored(_)`.
/// `JustAcquired` marks a template captured this frame whose confidence has
/// not been measured yet; `Scored` carries the confidence recorded at
/// acquisition time, used as a per-target quality floor afterwards.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum FeatureQuality {
    #[default]
    Uninitialized,
    JustAcquired,
    Scored(u8),
}

impl FeatureQuality {
    /// Whether a template has been captured at least once.
    pub fn acquired(self) -> bool {
        !matches!(self, FeatureQuality::Uninitialized)
    }

    /// Whether the recorded quality clears the confidence threshold.
    pub(crate) fn passes(self, threshold: u8) -> bool {
        match self {
            FeatureQuality::Uninitialized => false,
            FeatureQuality::JustAcquired => true,
            FeatureQuality::Scored(quality) => quality >= threshold,
        }
    }
}

/// One tracked point target.
///
/// `feature` is the adaptive working template, an interleaved RGB patch of
/// `(2 * template_radius + 1)^2` pixels matched against every frame.
#[derive(Clone, Debug, Default)]
pub struct Target {
    pub used: bool,
    pub visible: bool,
    pub position: Point,
    pub confidence: u8,
    pub quality: FeatureQuality,
    pub(crate) feature: Vec<u8>,
}

impl Target {
    /// Returns the current adaptive template bytes.
    pub fn feature(&self) -> &[u8] {
        &self.feature
    }

    /// Clears tracking state while keeping buffers allocated.
    pub(crate) fn reset(&mut self) {
        self.visible = false;
        self.confidence = 0;
        self.quality = FeatureQuality::Uninitialized;
        self.feature.fill(0);
    }
}
