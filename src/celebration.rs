use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;
use unicode_width::UnicodeWidthChar;

const SPARKS: [char; 6] = ['✦', '✧', '★', '☆', '•', '+'];
const GRAVITY: f64 = 15.0;

/// Particle for the new-best animation
#[derive(Debug, Clone)]
pub struct Spark {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letter of the banner; flies to `target` and stays there
    pub is_text: bool,
    pub target: (f64, f64),
}

impl Spark {
    fn burst<R: Rng>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(2.0..4.0),
            is_text: false,
            target: (x, y),
        }
    }

    fn letter<R: Rng>(from: (f64, f64), target: (f64, f64), symbol: char, rng: &mut R) -> Self {
        Self {
            x: from.0,
            y: from.1,
            vel_x: target.0 - from.0,
            vel_y: target.1 - from.1,
            symbol,
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(3.0..5.0),
            is_text: true,
            target,
        }
    }

    /// Advance by `dt` seconds; false once the spark has burnt out
    fn update(&mut self, dt: f64) -> bool {
        if self.is_text {
            let dist = ((self.target.0 - self.x).powi(2) + (self.target.1 - self.y).powi(2)).sqrt();
            if dist > 1.0 {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_x *= 0.95;
                self.vel_y *= 0.95;
            } else {
                (self.x, self.y) = self.target;
                self.vel_x = 0.0;
                self.vel_y = 0.0;
            }
        } else {
            self.x += self.vel_x * dt;
            self.y += self.vel_y * dt;
            self.vel_y += GRAVITY * dt;
        }

        self.age += dt;
        self.age < self.max_age
    }

    /// 1.0 when new, 0.0 when burnt out
    pub fn brightness(&self) -> f64 {
        (1.0 - self.age / self.max_age).clamp(0.0, 1.0)
    }
}

/// Fireworks over the results screen after a new personal best
#[derive(Debug)]
pub struct Celebration {
    pub sparks: Vec<Spark>,
    pub is_active: bool,
    duration: f64,
    started_at: Instant,
    last_update: Instant,
    width: f64,
    height: f64,
}

impl Celebration {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            sparks: Vec::new(),
            is_active: false,
            duration: 3.0,
            started_at: now,
            last_update: now,
            width: 80.0,
            height: 24.0,
        }
    }

    /// Start the animation with `banner` spelled out in the middle of the area
    pub fn start(&mut self, width: u16, height: u16, banner: &str) {
        let mut rng = rand::thread_rng();
        let now = Instant::now();

        self.sparks.clear();
        self.is_active = true;
        self.started_at = now;
        self.last_update = now;
        self.width = width as f64;
        self.height = height as f64;

        let center = (self.width / 2.0, self.height / 2.0);
        let banner_width: usize = banner.chars().map(|c| c.width().unwrap_or(0)).sum();
        let mut x = center.0 - banner_width as f64 / 2.0;

        for ch in banner.chars() {
            if !ch.is_whitespace() {
                let from = (
                    center.0 + rng.gen_range(-10.0..10.0),
                    center.1 + rng.gen_range(-5.0..5.0),
                );
                self.sparks
                    .push(Spark::letter(from, (x, center.1 - 2.0), ch, &mut rng));
            }
            x += ch.width().unwrap_or(0) as f64;
        }

        for _ in 0..25 {
            let x = center.0 + rng.gen_range(-15.0..15.0);
            let y = center.1 + rng.gen_range(-8.0..8.0);
            self.sparks.push(Spark::burst(x, y, &mut rng));
        }
    }

    /// Advance to the current instant; called on every tick
    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        let now = Instant::now();
        if now.duration_since(self.started_at).as_secs_f64() >= self.duration {
            self.stop();
            return;
        }

        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        self.step(dt);
    }

    fn step(&mut self, dt: f64) {
        let (width, height) = (self.width, self.height);
        self.sparks.retain_mut(|spark| {
            spark.update(dt)
                && spark.x >= -5.0
                && spark.x <= width + 5.0
                && spark.y >= -5.0
                && spark.y <= height + 5.0
        });

        if self.sparks.is_empty() {
            self.is_active = false;
        }
    }

    pub fn stop(&mut self) {
        self.is_active = false;
        self.sparks.clear();
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
    fn new_celebration_is_idle() {
        let celebration = Celebration::new();
        assert!(!celebration.is_active);
        assert!(celebration.sparks.is_empty());
    }

    #[test]
    fn start_spells_banner_and_adds_bursts() {
        let mut celebration = Celebration::new();
        celebration.start(80, 24, "NEW BEST");

        assert!(celebration.is_active);
        let letters: String = celebration
            .sparks
            .iter()
            .filter(|s| s.is_text)
            .map(|s| s.symbol)
            .collect();
        assert_eq!(letters, "NEWBEST");
        assert_eq!(celebration.sparks.iter().filter(|s| !s.is_text).count(), 25);
    }

    #[test]
    fn letters_settle_on_target() {
        let mut rng = rand::thread_rng();
        let mut spark = Spark::letter((10.0, 10.0), (10.5, 10.0), 'A', &mut rng);
        assert!(spark.update(0.1));
        assert_eq!((spark.x, spark.y), (10.5, 10.0));
    }

    #[test]
    fn sparks_burn_out() {
        let mut celebration = Celebration::new();
        celebration.start(80, 24, "GO");
        for _ in 0..100 {
            celebration.step(0.1);
        }

        assert!(celebration.sparks.is_empty());
        assert!(!celebration.is_active);
    }

    #[test]
    fn stop_clears_everything() {
        let mut celebration = Celebration::new();
        celebration.start(40, 12, "!");
        celebration.stop();

        assert!(!celebration.is_active);
        assert!(celebration.sparks.is_empty());
    }

    #[test]
    fn brightness_fades() {
        let mut rng = rand::thread_rng();
        let mut spark = Spark::burst(5.0, 5.0, &mut rng);
        assert_eq!(spark.brightness(), 1.0);
        spark.age = spark.max_age;
        assert_eq!(spark.brightness(), 0.0);
    }
}
