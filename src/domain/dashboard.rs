// Latest-reading readouts shown above the chart
use super::sample::Sample;

#[derive(Debug, Clone, PartialEq)]
pub struct Readouts {
    pub speed_text: String,
    pub direction_text: String,
    /// Rotation applied to the direction indicator, in degrees.
    pub rotation_deg: f64,
}

impl Readouts {
    pub fn from_sample(sample: &Sample) -> Self {
        Self {
            speed_text: format!("{:.1}", sample.speed),
            direction_text: format!("{}", sample.direction.round() as i64),
            rotation_deg: sample.direction,
        }
    }

    pub fn arrow(&self) -> char {
        compass_arrow(self.rotation_deg)
    }
}

impl Default for Readouts {
    fn default() -> Self {
        Self {
            speed_text: "--".to_string(),
            direction_text: "--".to_string(),
            rotation_deg: 0.0,
        }
    }
}

/// Nearest of eight arrow glyphs for a clockwise rotation from north.
pub fn compass_arrow(rotation_deg: f64) -> char {
    const ARROWS: [char; 8] = ['↑', '↗', '→', '↘', '↓', '↙', '←', '↖'];
    let normalized = rotation_deg.rem_euclid(360.0);
    let index = ((normalized + 22.5) / 45.0) as usize % ARROWS.len();
    ARROWS[index]
}
