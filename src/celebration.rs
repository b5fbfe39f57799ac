use rand::seq::SliceRandom;
use rand::Rng;

const GRAVITY: f64 = 6.0;
const DRAG: f64 = 0.9;
const BANNERS: [&str; 6] = [
    "CRUSHED IT!",
    "BEAST MODE!",
    "WORKOUT DONE!",
    "UNSTOPPABLE!",
    "NEW PR VIBES!",
    "STRONG WORK!",
];

/// One piece of confetti, in terminal cell coordinates
#[derive(Debug, Clone)]
pub struct Confetti {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    /// Phase of the sideways flutter
    phase: f64,
}

impl Confetti {
    fn launch(x: f64, rng: &mut impl Rng) -> Self {
        Self {
            x,
            y: rng.gen_range(-4.0..0.0),
            vel_x: rng.gen_range(-1.5..1.5),
            vel_y: rng.gen_range(0.5..3.0),
            symbol: *['*', '+', 'o', '~', '#', '%']
                .choose(rng)
                .unwrap_or(&'*'),
            color_index: rng.gen_range(0..6),
            phase: rng.gen_range(0.0..std::f64::consts::TAU),
        }
    }

    fn step(&mut self, dt: f64) {
        self.phase += dt * 4.0;
        self.vel_x *= DRAG;
        self.vel_y = (self.vel_y + GRAVITY * dt).min(8.0);
        self.x += (self.vel_x + self.phase.sin() * 0.8) * dt;
        self.y += self.vel_y * dt;
    }
}

/// Confetti shower with a banner, shown on the Finished page
#[derive(Debug)]
pub struct Celebration {
    pub confetti: Vec<Confetti>,
    pub banner: &'static str,
    pub width: f64,
    pub height: f64,
    elapsed: f64,
    duration: f64,
    active: bool,
}

impl Celebration {
    pub fn new() -> Self {
        Self {
            confetti: Vec::new(),
            banner: BANNERS[0],
            width: 80.0,
            height: 24.0,
            elapsed: 0.0,
            duration: 4.0,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn start(&mut self, width: u16, height: u16) {
        let mut rng = rand::thread_rng();
        self.width = f64::from(width.max(1));
        self.height = f64::from(height.max(1));
        self.elapsed = 0.0;
        self.active = true;
        self.banner = BANNERS.choose(&mut rng).copied().unwrap_or(BANNERS[0]);

        let count = (width as usize).clamp(10, 60);
        self.confetti = (0..count)
            .map(|_| Confetti::launch(rng.gen_range(0.0..self.width), &mut rng))
            .collect();
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.confetti.clear();
    }

    /// Advance by `dt` seconds
    pub fn update(&mut self, dt: f64) {
        if !self.active {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.stop();
            return;
        }

        let (width, height) = (self.width, self.height);
        self.confetti.retain_mut(|c| {
            c.step(dt);
            c.y <= height + 1.0 && c.x >= -2.0 && c.x <= width + 2.0
        });
    }
}

impl Default for Celebration {
    fn default() -> Self {
        Self::new()
    }
}
