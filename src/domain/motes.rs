/// Floating background motes: golden specks that drift up the screen forever.
///
/// Each mote picks a column, a rise time of 15-25 s and a start delay of
/// up to 10 s at creation. Opacity and size swell mid-flight and fade at
/// both ends.

use rand::Rng;

pub const MOTE_COUNT: usize = 15;

#[derive(Clone, Debug)]
pub struct Mote {
    /// Column as a fraction of screen width.
    pub x: f32,
    rise_ms: u64,
    delay_ms: u64,
}

/// Where a mote is at a given moment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotePos {
    pub x: f32,
    /// 1.0 is the bottom edge, 0.0 the top; runs slightly past the top.
    pub y: f32,
    pub opacity: f32,
    /// True in the middle third of the rise.
    pub large: bool,
}

impl Mote {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Mote {
            x: rng.gen_range(0.0..1.0),
            rise_ms: rng.gen_range(15_000..25_000),
            delay_ms: rng.gen_range(0..10_000),
        }
    }

    /// Position at `elapsed_ms` since the scene started. `None` while the
    /// mote is still waiting out its initial delay.
    pub fn at(&self, elapsed_ms: u64) -> Option<MotePos> {
        if elapsed_ms < self.delay_ms || self.rise_ms == 0 {
            return None;
        }
        let t = ((elapsed_ms - self.delay_ms) % self.rise_ms) as f32 / self.rise_ms as f32;
        // Bottom of screen to 20% above the top.
        let y = 1.0 - t * 1.2;
        let opacity = if t < 0.5 { t * 2.0 * 0.8 } else { (1.0 - t) * 2.0 * 0.8 };
        Some(MotePos { x: self.x, y, opacity, large: (1.0 / 3.0..2.0 / 3.0).contains(&t) })
    }
}

pub fn spawn_motes<R: Rng + ?Sized>(rng: &mut R) -> Vec<Mote> {
    (0..MOTE_COUNT).map(|_| Mote::random(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_delay_then_rises() {
        let m = Mote { x: 0.5, rise_ms: 20_000, delay_ms: 1_000 };
        assert!(m.at(500).is_none());

        let start = m.at(1_000).unwrap();
        assert!((start.y - 1.0).abs() < 1e-6);
        assert!(start.opacity.abs() < 1e-6);

        let mid = m.at(11_000).unwrap();
        assert!(mid.y < start.y);
        assert!((mid.opacity - 0.8).abs() < 1e-3);
        assert!(mid.large);
    }

    #[test]
    fn repeats_after_each_rise() {
        let m = Mote { x: 0.1, rise_ms: 15_000, delay_ms: 0 };
        assert_eq!(m.at(3_000), m.at(18_000));
    }
}
