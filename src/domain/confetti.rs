/// Confetti burst: a one-shot timed particle effect.
///
/// Each frame during the burst a batch of particles is emitted from a
/// random origin. Batch size decays linearly to zero over the burst
/// duration: `count = base_count * time_left / duration`.
/// Particles fly outward, slow down, fall under gravity and fade.
///
/// Coordinates are normalized: x and y in `[0, 1)` span the screen, y grows
/// downward. The renderer maps them to terminal cells.
///
/// Nothing waits on a burst. The owner ticks it each frame and drops it
/// once `is_finished` reports true.

use std::f32::consts::PI;

use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Gold, orange, orange-red, crimson.
pub const WARM_PALETTE: [Rgb; 4] = [
    Rgb(0xFF, 0xD7, 0x00),
    Rgb(0xFF, 0xA5, 0x00),
    Rgb(0xFF, 0x45, 0x00),
    Rgb(0xDC, 0x14, 0x3C),
];

const GLYPHS: [char; 6] = ['*', '✦', '•', '▪', '✧', '·'];

/// Normalized screen units per second for one unit of start velocity.
const VELOCITY_SCALE: f32 = 0.012;

/// Hard cap on live particles so a slow terminal is not flooded.
const MAX_PARTICLES: usize = 600;

#[derive(Clone, Debug)]
pub struct ConfettiParams {
    pub duration_ms: u64,
    pub base_count: f32,
    pub start_velocity: f32,
    pub spread_deg: f32,
    pub gravity: f32,
    /// Velocity retained per second.
    pub decay: f32,
    pub palette: &'static [Rgb],
}

impl Default for ConfettiParams {
    fn default() -> Self {
        ConfettiParams {
            duration_ms: 3500,
            base_count: 50.0,
            start_velocity: 30.0,
            spread_deg: 360.0,
            gravity: 0.35,
            decay: 0.15,
            palette: &WARM_PALETTE,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    vx: f32,
    vy: f32,
    pub color: Rgb,
    pub glyph: char,
    age_ms: u64,
    life_ms: u64,
}

impl Particle {
    /// Remaining life in `[0, 1]`; 1.0 when freshly spawned.
    pub fn opacity(&self) -> f32 {
        if self.life_ms == 0 { return 0.0; }
        1.0 - (self.age_ms as f32 / self.life_ms as f32).min(1.0)
    }

    fn alive(&self) -> bool {
        self.age_ms < self.life_ms
    }
}

pub struct ConfettiBurst {
    params: ConfettiParams,
    started_ms: u64,
    last_ms: u64,
    particles: Vec<Particle>,
}

impl ConfettiBurst {
    pub fn new(now_ms: u64, params: ConfettiParams) -> Self {
        ConfettiBurst {
            params,
            started_ms: now_ms,
            last_ms: now_ms,
            particles: Vec::with_capacity(256),
        }
    }

    /// Particles to emit in a frame at `now_ms`. Zero once the burst is over.
    pub fn particle_count(&self, now_ms: u64) -> usize {
        let end = self.started_ms + self.params.duration_ms;
        if now_ms >= end || self.params.duration_ms == 0 {
            return 0;
        }
        let time_left = (end - now_ms) as f32;
        (self.params.base_count * time_left / self.params.duration_ms as f32) as usize
    }

    pub fn emitting(&self, now_ms: u64) -> bool {
        now_ms < self.started_ms + self.params.duration_ms
    }

    /// Advance live particles, then emit this frame's batch.
    pub fn tick<R: Rng + ?Sized>(&mut self, now_ms: u64, rng: &mut R) {
        let dt_ms = now_ms.saturating_sub(self.last_ms);
        self.last_ms = now_ms;
        self.advance(dt_ms);

        let count = self
            .particle_count(now_ms)
            .min(MAX_PARTICLES.saturating_sub(self.particles.len()));
        if count == 0 {
            return;
        }

        let origin_x: f32 = rng.gen_range(0.0..1.0);
        let origin_y: f32 = rng.gen_range(0.0..1.0) - 0.2;
        let spread = self.params.spread_deg.to_radians();
        for _ in 0..count {
            // Centered on "up" so narrow spreads fire upward.
            let angle = -PI / 2.0 + rng.gen_range(-0.5..0.5) * spread;
            let speed = self.params.start_velocity
                * VELOCITY_SCALE
                * rng.gen_range(0.5..1.0);
            let palette = self.params.palette;
            self.particles.push(Particle {
                x: origin_x,
                y: origin_y,
                vx: angle.cos() * speed,
                vy: angle.sin() * speed,
                color: palette[rng.gen_range(0..palette.len())],
                glyph: GLYPHS[rng.gen_range(0..GLYPHS.len())],
                age_ms: 0,
                life_ms: rng.gen_range(1200..2000),
            });
        }
    }

    fn advance(&mut self, dt_ms: u64) {
        if dt_ms == 0 { return; }
        let dt = dt_ms as f32 / 1000.0;
        let keep = self.params.decay.powf(dt);
        for p in &mut self.particles {
            p.vx *= keep;
            p.vy = p.vy * keep + self.params.gravity * dt;
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            p.age_ms += dt_ms;
        }
        self.particles.retain(|p| p.alive() && p.y < 1.2);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Emission is over and every particle has faded.
    pub fn is_finished(&self, now_ms: u64) -> bool {
        !self.emitting(now_ms) && self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn count_decays_over_duration() {
        let burst = ConfettiBurst::new(1000, ConfettiParams::default());
        assert_eq!(burst.particle_count(1000), 50);
        assert_eq!(burst.particle_count(1000 + 1750), 25);
        assert_eq!(burst.particle_count(1000 + 3500), 0);
        assert_eq!(burst.particle_count(1000 + 9000), 0);
    }

    #[test]
    fn particles_use_warm_palette_only() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut burst = ConfettiBurst::new(0, ConfettiParams::default());
        for t in (0..600).step_by(33) {
            burst.tick(t, &mut rng);
        }
        assert!(!burst.particles().is_empty());
        assert!(burst.particles().iter().all(|p| WARM_PALETTE.contains(&p.color)));
    }

    #[test]
    fn particle_cap_holds() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut burst = ConfettiBurst::new(0, ConfettiParams::default());
        for t in (0..2000).step_by(10) {
            burst.tick(t, &mut rng);
            assert!(burst.particles().len() <= MAX_PARTICLES);
        }
    }

    #[test]
    fn burst_self_terminates() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut burst = ConfettiBurst::new(0, ConfettiParams::default());
        let mut t = 0;
        while t < 3500 {
            burst.tick(t, &mut rng);
            t += 33;
        }
        assert!(!burst.emitting(3500));
        // Longest particle life is under two seconds.
        for step in 0..80 {
            burst.tick(3500 + step * 33, &mut rng);
        }
        assert!(burst.is_finished(3500 + 80 * 33));
    }
}
