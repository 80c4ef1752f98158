//! Guion de liveness como secuencia de transiciones temporizadas.
//!
//! Cada instrucción queda activa durante un `tick`; al final del tick se toma
//! el frame correspondiente. El avance es puramente temporal: no depende de
//! la calidad del frame.

use std::time::Duration;

use crate::config::EngineConfig;
use crate::model::LivenessInstruction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessScript {
    instructions: Vec<LivenessInstruction>,
    tick: Duration,
}

/// Instrucción activa a partir de `at` (offset desde el inicio del guion).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedInstruction {
    pub at: Duration,
    pub instruction: LivenessInstruction,
}

impl LivenessScript {
    pub fn new(instructions: Vec<LivenessInstruction>, tick: Duration) -> Self {
        Self { instructions, tick }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.liveness_script.clone(), config.liveness_tick)
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn transitions(&self) -> impl Iterator<Item = TimedInstruction> + '_ {
        self.instructions
            .iter()
            .enumerate()
            .map(move |(i, instruction)| TimedInstruction { at: self.tick * i as u32,
                                                            instruction: *instruction })
    }

    pub fn total_duration(&self) -> Duration {
        self.tick * self.instructions.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_script_runs_one_instruction_per_tick() {
        let script = LivenessScript::new(LivenessInstruction::standard_script(), Duration::from_millis(750));
        let offsets: Vec<_> = script.transitions().map(|t| (t.at.as_millis(), t.instruction)).collect();
        assert_eq!(offsets,
                   vec![(0, LivenessInstruction::Center),
                        (750, LivenessInstruction::TurnLeft),
                        (1500, LivenessInstruction::TurnRight),
                        (2250, LivenessInstruction::Hold)]);
        assert_eq!(script.total_duration(), Duration::from_secs(3));
    }
}
