use rand::seq::SliceRandom;
use rand::Rng;
use std::time::SystemTime;

const SYMBOLS: [char; 6] = ['*', '+', 'o', '.', '~', '^'];
const GRAVITY: f64 = 12.0;
const TIMESTEP: f64 = 0.1;

/// One confetti particle launched when a training completes
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    vel_x: f64,
    vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    age: f64,
    max_age: f64,
}

impl Particle {
    fn new(x: f64, y: f64) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            x,
            y,
            vel_x: rng.gen_range(-4.0..4.0),
            vel_y: rng.gen_range(-5.0..-1.5),
            symbol: *SYMBOLS.choose(&mut rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
        }
    }

    /// Advance one timestep; false once the particle has expired.
    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += GRAVITY * dt;
        self.age += dt;
        self.age < self.max_age
    }
}

/// Confetti burst over the summary screen, self-deactivating after its
/// duration. Updated from the app's tick events.
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    started_at: SystemTime,
    duration_secs: f64,
    pub is_active: bool,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            started_at: SystemTime::now(),
            duration_secs: 3.0,
            is_active: false,
            width: 80.0,
            height: 24.0,
        }
    }

    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.started_at = SystemTime::now();
        self.is_active = true;
        self.width = f64::from(width);
        self.height = f64::from(height);

        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;
        for _ in 0..40 {
            let offset_x = rng.gen_range(-18.0..18.0);
            let offset_y = rng.gen_range(-6.0..6.0);
            self.particles
                .push(Particle::new(center_x + offset_x, center_y + offset_y));
        }
    }

    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        let elapsed = self.started_at.elapsed().unwrap_or_default().as_secs_f64();
        if elapsed >= self.duration_secs {
            self.is_active = false;
            self.particles.clear();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|p| {
            let alive = p.update(TIMESTEP);
            let buffer = 5.0;
            let off_screen = p.y > height + buffer || p.x < -buffer || p.x > width + buffer;
            alive && !off_screen
        });
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive_and_empty() {
        let celebration = Celebration::new();
        assert!(!celebration.is_active);
        assert!(celebration.particles.is_empty());
    }

    #[test]
    fn start_spawns_particles() {
        let mut celebration = Celebration::new();
        celebration.start(80, 24);
        assert!(celebration.is_active);
        assert!(!celebration.particles.is_empty());
    }

    #[test]
    fn particles_fall_under_gravity() {
        let mut p = Particle::new(10.0, 10.0);
        let initial_vel_y = p.vel_y;
        assert!(p.update(0.1));
        assert!(p.vel_y > initial_vel_y);
    }

    #[test]
    fn particles_expire() {
        let mut p = Particle::new(10.0, 10.0);
        let mut alive = true;
        for _ in 0..40 {
            alive = p.update(0.1);
            if !alive {
                break;
            }
        }
        assert!(!alive, "particle should expire within its max age");
    }

    #[test]
    fn off_screen_particles_are_culled() {
        let mut celebration = Celebration::new();
        celebration.start(20, 10);
        celebration.particles.push(Particle::new(200.0, 200.0));
        celebration.update();
        assert!(celebration
            .particles
            .iter()
            .all(|p| p.x <= 25.0 && p.y <= 15.0));
    }

    #[test]
    fn update_when_inactive_is_a_noop() {
        let mut celebration = Celebration::new();
        celebration.update();
        assert!(!celebration.is_active);
        assert!(celebration.particles.is_empty());
    }
}
