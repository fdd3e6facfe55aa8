//! Global speed scalar, pause state and the fixed-timestep frame gate

use serde::{Deserialize, Serialize};

use crate::core::config::ClockConfig;
use crate::core::error::{EngineError, Result};

/// Slack on the frame gate so timestamps generated as `n * frame_duration`
/// are not rejected by rounding
const GATE_TOLERANCE_MS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockState {
    Running,
    RunningAtZeroSpeed,
    Paused,
}

/// Speed buttons relative to the base speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedPreset {
    Half,
    Normal,
    Double,
}

impl SpeedPreset {
    pub fn multiplier(&self) -> f32 {
        match self {
            SpeedPreset::Half => 0.5,
            SpeedPreset::Normal => 1.0,
            SpeedPreset::Double => 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    speed: f32,
    /// Speed restored by `resume`, always non-zero
    resume_speed: f32,
    base_speed: f32,
    paused: bool,
    frame_duration_ms: f64,
    last_tick_ms: Option<f64>,
}

impl SimulationClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            speed: config.base_speed,
            resume_speed: config.base_speed,
            base_speed: config.base_speed,
            paused: false,
            frame_duration_ms: config.frame_duration_ms,
            last_tick_ms: None,
        }
    }

    /// Effective speed `g` for this tick (0 while paused)
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn frame_duration_ms(&self) -> f64 {
        self.frame_duration_ms
    }

    pub fn state(&self) -> ClockState {
        if self.paused {
            ClockState::Paused
        } else if self.speed > 0.0 {
            ClockState::Running
        } else {
            ClockState::RunningAtZeroSpeed
        }
    }

    /// Set the speed scalar
    ///
    /// While paused the value is remembered for `resume` and the clock stays
    /// paused.
    pub fn set_speed(&mut self, value: f32) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(EngineError::InvalidSpeed(value));
        }
        if value > 0.0 {
            self.resume_speed = value;
        }
        if !self.paused {
            self.speed = value;
        }
        Ok(())
    }

    pub fn set_preset(&mut self, preset: SpeedPreset) {
        let value = self.base_speed * preset.multiplier();
        self.resume_speed = value;
        if !self.paused {
            self.speed = value;
        }
    }

    pub fn pause(&mut self) {
        if !self.paused && self.speed > 0.0 {
            self.resume_speed = self.speed;
        }
        self.paused = true;
        self.speed = 0.0;
    }

    /// Leave pause at the last non-zero speed. No-op when not paused.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.speed = self.resume_speed;
        }
    }

    /// Frame gate: accept when at least one frame duration has elapsed
    ///
    /// The first call is always accepted. A timestamp earlier than the last
    /// accepted one re-baselines the gate.
    pub fn accept_frame(&mut self, now_ms: f64) -> bool {
        let accept = match self.last_tick_ms {
            None => true,
            Some(last) if now_ms < last => true,
            Some(last) => now_ms - last + GATE_TOLERANCE_MS >= self.frame_duration_ms,
        };
        if accept {
            self.last_tick_ms = Some(now_ms);
        }
        accept
    }
}
