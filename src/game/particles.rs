//! Cosmetic particles, simulated locally on every instance

use rand::Rng;

use super::physics::{GRAVITY, GROUND_Y};

pub const PARTICLE_SPREAD: f32 = 10.0;
pub const PARTICLE_DECAY: f32 = 0.05;
pub const PARTICLE_BOUNCE: f32 = -0.6;

/// Request to emit a burst; the only particle data that crosses the wire
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSpawn {
    pub x: f32,
    pub y: f32,
    pub color: String,
    pub count: u32,
}

impl ParticleSpawn {
    pub fn new(x: f32, y: f32, color: &str, count: u32) -> Self {
        Self {
            x,
            y,
            color: color.to_string(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: f32,
    pub color: String,
    pub size: f32,
}

#[derive(Debug, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<R: Rng + ?Sized>(&mut self, burst: &ParticleSpawn, rng: &mut R) {
        for _ in 0..burst.count {
            self.particles.push(Particle {
                x: burst.x,
                y: burst.y,
                vx: (rng.gen::<f32>() - 0.5) * PARTICLE_SPREAD,
                vy: (rng.gen::<f32>() - 0.5) * PARTICLE_SPREAD,
                life: 1.0,
                color: burst.color.clone(),
                size: rng.gen::<f32>() * 8.0 + 2.0,
            });
        }
    }

    /// Advance every particle one tick and drop the dead ones
    pub fn update(&mut self) {
        for pt in self.particles.iter_mut() {
            pt.x += pt.vx;
            pt.y += pt.vy;
            pt.vy += GRAVITY * 0.5;
            pt.life -= PARTICLE_DECAY;
            if pt.y >= GROUND_Y {
                pt.y = GROUND_Y;
                pt.vy *= PARTICLE_BOUNCE;
            }
        }
        self.particles.retain(|pt| pt.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
