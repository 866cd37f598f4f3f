use std::time::Duration;

use acquisition_core::config::{BenchConfig, DEFAULT_CONFIG};
use acquisition_core::discharge::DischargeGate;
use acquisition_core::sampling::Reading;
use acquisition_core::state::SharedState;
use acquisition_core::step::StepInput;
use acquisition_core::telemetry::render_frame;
use acquisition_core::timing::TimingModel;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "run",
        "run <ticks>     - advance the bench by N sampling ticks, printing frames",
    ),
    (
        "discharge",
        "discharge       - drain the capacitor and wait out the settling window",
    ),
    (
        "frame",
        "frame           - print the most recent telemetry frame",
    ),
    (
        "status",
        "status          - display bench state and timing",
    ),
    ("help", "help [topic]    - show help for a command"),
];

/// First-order RC plant advanced one sampling interval at a time.
struct Plant {
    capacitor_volts: f32,
    /// Per-tick smoothing factor, `1 - exp(-dt / tau)`.
    alpha: f32,
}

impl Plant {
    fn new(timing: &TimingModel) -> Self {
        let dt = timing.sampling_interval().as_secs_f32();
        let tau = timing.time_constant().as_secs_f32();
        Self {
            capacitor_volts: 0.0,
            alpha: 1.0 - (-dt / tau).exp(),
        }
    }

    fn advance(&mut self, applied_volts: f32) -> f32 {
        self.capacitor_volts += (applied_volts - self.capacitor_volts) * self.alpha;
        self.capacitor_volts
    }
}

pub struct Session {
    config: BenchConfig,
    timing: TimingModel,
    state: SharedState,
    step: StepInput,
    gate: DischargeGate,
    plant: Plant,
    elapsed: Duration,
    latest: Option<String>,
}

impl Session {
    pub fn new() -> Result<Self, String> {
        Self::with_config(DEFAULT_CONFIG)
    }

    pub fn with_config(config: BenchConfig) -> Result<Self, String> {
        let timing = config
            .timing()
            .map_err(|err| format!("invalid circuit parameters: {err}"))?;
        let plant = Plant::new(&timing);
        Ok(Self {
            config,
            timing,
            state: SharedState::new(),
            step: StepInput::new(config.drive_volts),
            gate: DischargeGate::new(),
            plant,
            elapsed: Duration::ZERO,
            latest: None,
        })
    }

    pub fn handle_command(&mut self, line: &str) -> Vec<String> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Vec::new();
        };

        match command {
            "help" => help_lines(words.next()),
            "status" => self.handle_status(),
            "run" => match words.next().map(str::parse::<u32>) {
                Some(Ok(ticks)) if ticks > 0 => self.handle_run(ticks),
                _ => vec!["ERR usage: run <ticks>".to_string()],
            },
            "discharge" => self.handle_discharge(),
            "frame" => match &self.latest {
                Some(frame) => vec![frame.clone()],
                None => vec!["ERR no frame yet; `run` first".to_string()],
            },
            other => vec![format!("ERR unknown command `{other}`")],
        }
    }

    fn handle_status(&self) -> Vec<String> {
        vec![
            format!(
                "circuit: R={}ohm C={}F tau={:.3}s",
                self.config.circuit.resistance_ohms,
                self.config.circuit.capacitance_farads,
                self.timing.time_constant().as_secs_f32(),
            ),
            format!(
                "timing: interval={:.3}s settling={:.3}s elapsed={:.2}s",
                self.timing.sampling_interval().as_secs_f32(),
                self.timing.settling_duration().as_secs_f32(),
                self.elapsed.as_secs_f32(),
            ),
            format!(
                "bench: applied={:.2}V capacitor={:.2}V step_applied={} discharging={}",
                self.state.applied_volts,
                self.plant.capacitor_volts,
                self.step.is_applied(),
                self.gate.is_active(),
            ),
        ]
    }

    fn handle_run(&mut self, ticks: u32) -> Vec<String> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    fn handle_discharge(&mut self) -> Vec<String> {
        if self.gate.try_begin().is_err() {
            return vec!["busy".to_string()];
        }

        self.state.begin_discharge();
        let drain_ticks = usize::try_from(
            self.timing.settling_duration().as_micros()
                / self.timing.sampling_interval().as_micros(),
        )
        .unwrap_or(usize::MAX);
        let mut frames = Vec::with_capacity(drain_ticks);
        for _ in 0..drain_ticks {
            frames.push(self.tick());
        }
        self.state.end_discharge();
        self.gate.finish();
        frames.push("ok".to_string());
        frames
    }

    /// Advances one sampling interval: step check, plant update, quantize,
    /// frame render.
    fn tick(&mut self) -> String {
        self.elapsed += self.timing.sampling_interval();

        if !self.gate.is_active()
            && self.elapsed >= self.timing.settling_duration()
            && let Some(volts) = self.step.fire()
        {
            self.state.apply_step(volts);
        }

        let capacitor = self.plant.advance(self.state.applied_volts);
        let code = self.quantize(capacitor);
        self.state.record_sample(code);

        let reading = Reading::new(
            self.elapsed,
            self.state.applied_volts,
            self.config.sensor.volts_from_code(code),
        );
        let frame = match render_frame(&reading) {
            Ok(frame) => frame.as_str().to_string(),
            Err(_) => "ERR frame overflow".to_string(),
        };
        self.latest = Some(frame.clone());
        frame
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn quantize(&self, volts: f32) -> u16 {
        let scale = self.config.sensor;
        let span = volts / scale.full_scale_volts() * f32::from(scale.max_code());
        scale.clamp_code(span.round().max(0.0) as u16)
    }
}

fn help_lines(topic: Option<&str>) -> Vec<String> {
    match topic {
        None => HELP_TOPICS
            .iter()
            .map(|(_, usage)| (*usage).to_string())
            .collect(),
        Some(topic) => HELP_TOPICS
            .iter()
            .find(|(name, _)| *name == topic)
            .map_or_else(
                || vec![format!("ERR unknown help topic `{topic}`")],
                |(_, usage)| vec![(*usage).to_string()],
            ),
    }
}
