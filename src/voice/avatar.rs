//! Animated SVG avatar
//!
//! The mouth loops through [`MOUTH_FRAMES`] while speech is playing and
//! rests on the first frame otherwise.

use std::time::{Duration, Instant};

/// Mouth path frames, one loop per [`MOUTH_CYCLE`]
pub const MOUTH_FRAMES: [&str; 3] = [
    "M80 150 Q100 160 120 150",
    "M80 150 Q100 155 120 150",
    "M80 150 Q100 160 120 150",
];

/// Duration of one open/close loop
pub const MOUTH_CYCLE: Duration = Duration::from_millis(200);

const SVG_TEMPLATE: &str = r##"<svg viewBox="0 0 200 200" xmlns="http://www.w3.org/2000/svg">
  <circle cx="100" cy="100" r="80" fill="#FFB6C1"/>
  <path d="M40 50 Q100 20 160 50 C180 70 190 100 170 130 C150 160 50 160 30 130 C10 100 20 70 40 50" fill="#8B4513"/>
  <ellipse cx="100" cy="120" rx="60" ry="70" fill="#FFA07A"/>
  <g id="eyes">
    <ellipse cx="70" cy="100" rx="8" ry="10" fill="#000000"/>
    <ellipse cx="130" cy="100" rx="8" ry="10" fill="#000000"/>
    <path d="M62 90 Q70 85 78 90" stroke="#000000" stroke-width="2" fill="none"/>
    <path d="M122 90 Q130 85 138 90" stroke="#000000" stroke-width="2" fill="none"/>
  </g>
  <path d="M55 80 Q70 70 85 80" stroke="#000000" stroke-width="2" fill="none"/>
  <path d="M115 80 Q130 70 145 80" stroke="#000000" stroke-width="2" fill="none"/>
  <path d="M100 110 Q105 120 100 130" stroke="#000000" stroke-width="2" fill="none"/>
  <path id="mouth" d="{mouth}" stroke="#000000" stroke-width="2" fill="none">
    <animate id="speak" attributeName="d" dur="0.2s" repeatCount="indefinite" values="{frames}" begin="{begin}"/>
  </path>
</svg>
"##;

/// Avatar with a mouth animation bound to speech start/end
#[derive(Debug, Default)]
pub struct Avatar {
    speaking_since: Option<Instant>,
}

impl Avatar {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            speaking_since: None,
        }
    }

    /// Start the mouth loop. No-op if already running
    pub fn begin(&mut self) {
        if self.speaking_since.is_none() {
            self.speaking_since = Some(Instant::now());
            tracing::trace!("avatar mouth animation started");
        }
    }

    /// Stop the mouth loop. No-op if not running
    pub fn end(&mut self) {
        if self.speaking_since.take().is_some() {
            tracing::trace!("avatar mouth animation stopped");
        }
    }

    #[must_use]
    pub const fn is_animating(&self) -> bool {
        self.speaking_since.is_some()
    }

    /// Current mouth path
    #[must_use]
    pub fn mouth_path(&self) -> &'static str {
        self.speaking_since
            .map_or(MOUTH_FRAMES[0], |since| mouth_frame_at(since.elapsed()))
    }

    /// Render the avatar markup with the current mouth path
    #[must_use]
    pub fn render_svg(&self) -> String {
        render_svg(self.mouth_path(), self.is_animating())
    }
}

/// Mouth path shown `elapsed` into the animation
#[must_use]
pub fn mouth_frame_at(elapsed: Duration) -> &'static str {
    let cycle = MOUTH_CYCLE.as_nanos();
    let phase = elapsed.as_nanos() % cycle;
    let frame = phase * MOUTH_FRAMES.len() as u128 / cycle;
    MOUTH_FRAMES[usize::try_from(frame).unwrap_or(0)]
}

/// Render avatar markup for a given mouth path
#[must_use]
pub fn render_svg(mouth: &str, animating: bool) -> String {
    SVG_TEMPLATE
        .replace("{mouth}", mouth)
        .replace("{frames}", &MOUTH_FRAMES.join(";"))
        .replace("{begin}", if animating { "0s" } else { "indefinite" })
}
