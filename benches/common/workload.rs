//! Workload generators for the benchmarks.
//!
//! Provides deterministic key streams without pulling in external RNG crates.

use evictkit::traits::CachePolicy;

#[derive(Debug, Clone, Copy)]
pub enum Workload {
    /// Uniform random keys in `[0, universe)`.
    Uniform,
    /// Hot/cold split with a configurable hot fraction and hot access probability.
    Hotset { hot_fraction: f64, hot_prob: f64 },
    /// Sequential scan in `[0, universe)`.
    Scan,
}

#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    universe: u64,
    workload: Workload,
    rng: XorShift64,
    scan_pos: u64,
}

impl WorkloadGenerator {
    pub fn new(universe: u64, workload: Workload, seed: u64) -> Self {
        Self {
            universe: universe.max(1),
            workload,
            rng: XorShift64::new(seed),
            scan_pos: 0,
        }
    }

    pub fn next_key(&mut self) -> u64 {
        match self.workload {
            Workload::Uniform => self.rng.next_u64() % self.universe,
            Workload::Hotset {
                hot_fraction,
                hot_prob,
            } => {
                let hot_size = ((self.universe as f64) * hot_fraction.clamp(0.0, 1.0)).round() as u64;
                let hot_size = hot_size.max(1).min(self.universe);
                if self.rng.next_f64() < hot_prob.clamp(0.0, 1.0) {
                    self.rng.next_u64() % hot_size
                } else if hot_size == self.universe {
                    self.rng.next_u64() % self.universe
                } else {
                    hot_size + (self.rng.next_u64() % (self.universe - hot_size))
                }
            },
            Workload::Scan => {
                let key = self.scan_pos;
                self.scan_pos = (self.scan_pos + 1) % self.universe;
                key
            },
        }
    }
}

/// The three mixed read/write scenarios of the hit-rate report.
#[derive(Debug, Clone, Copy)]
pub enum Scenario {
    /// 20 hot keys take 80% of traffic, 5000 cold keys the rest; 10% writes.
    HotSet,
    /// 60% sequential loop over 500 keys, 30% random inside the loop, 10%
    /// outside it; 5% writes.
    LoopScan,
    /// Five phases: hot set, wide random, sequential, shifting locality, mix.
    WorkloadShift,
}

impl Scenario {
    pub fn name(self) -> &'static str {
        match self {
            Scenario::HotSet => "hot_set",
            Scenario::LoopScan => "loop_scan",
            Scenario::WorkloadShift => "workload_shift",
        }
    }

    pub fn operations(self) -> u64 {
        match self {
            Scenario::HotSet => 500_000,
            Scenario::LoopScan => 200_000,
            Scenario::WorkloadShift => 80_000,
        }
    }

    /// Keys written before the measured run.
    pub fn warmup_keys(self) -> u64 {
        match self {
            Scenario::HotSet => 20,
            Scenario::LoopScan => 100,
            Scenario::WorkloadShift => 30,
        }
    }
}

/// One step of a scenario: which key, and whether it is a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub key: u64,
    pub is_put: bool,
}

#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    scenario: Scenario,
    rng: XorShift64,
    op: u64,
    loop_pos: u64,
}

impl ScenarioGenerator {
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self {
            scenario,
            rng: XorShift64::new(seed),
            op: 0,
            loop_pos: 0,
        }
    }

    fn percent(&mut self) -> u64 {
        self.rng.next_u64() % 100
    }

    pub fn next_step(&mut self) -> Step {
        let op = self.op;
        self.op += 1;
        match self.scenario {
            Scenario::HotSet => {
                const HOT: u64 = 20;
                const COLD: u64 = 5_000;
                let is_put = self.percent() < 10;
                let key = if self.percent() < 80 {
                    self.rng.next_u64() % HOT
                } else {
                    HOT + self.rng.next_u64() % COLD
                };
                Step { key, is_put }
            },
            Scenario::LoopScan => {
                const LOOP: u64 = 500;
                let is_put = self.percent() < 5;
                let key = match op % 100 {
                    0..60 => {
                        let key = self.loop_pos;
                        self.loop_pos = (self.loop_pos + 1) % LOOP;
                        key
                    },
                    60..90 => self.rng.next_u64() % LOOP,
                    _ => LOOP + self.rng.next_u64() % LOOP,
                };
                Step { key, is_put }
            },
            Scenario::WorkloadShift => {
                let phase_len = Scenario::WorkloadShift.operations() / 5;
                let phase = op / phase_len;
                let put_prob = [15, 30, 10, 25, 20];
                let is_put = self.percent() < put_prob[(phase as usize).min(4)];
                let key = match phase {
                    0 => self.rng.next_u64() % 10,
                    1 => self.rng.next_u64() % 120,
                    2 => (op - phase_len * 2) % 60,
                    3 => ((op / 400) % 5) * 10 + self.rng.next_u64() % 10,
                    _ => match self.percent() {
                        0..30 => self.rng.next_u64() % 10,
                        30..60 => 10 + self.rng.next_u64() % 30,
                        _ => 40 + self.rng.next_u64() % 80,
                    },
                };
                Step { key, is_put }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HitRate {
    pub hits: u64,
    pub misses: u64,
}

impl HitRate {
    pub fn hit_rate(self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Run a scenario against a cache: warm it up, then count hits over the
/// read steps only.
pub fn run_scenario<C>(cache: &C, scenario: Scenario, seed: u64) -> HitRate
where
    C: CachePolicy<u64, String> + ?Sized,
{
    for key in 0..scenario.warmup_keys() {
        cache.put(key, format!("warm{key}"));
    }

    let mut generator = ScenarioGenerator::new(scenario, seed);
    let mut rate = HitRate::default();
    let mut out = String::new();
    for _ in 0..scenario.operations() {
        let step = generator.next_step();
        if step.is_put {
            cache.put(step.key, format!("value{}", step.key));
        } else if cache.get_into(&step.key, &mut out) {
            rate.hits += 1;
        } else {
            rate.misses += 1;
        }
    }
    rate
}

#[derive(Debug, Clone, Copy)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }
}
