//! Compilation stages and the context they run in

use super::condition::Phase;
use super::Program;
use cir_common::{ErrorReporter, IrError, IrResult};
use log::{debug, info};

/// A pass over a program. Stages declare the phase they need and the phase
/// the program reaches once they succeed.
pub trait Stage {
    fn name(&self) -> &str;

    fn required_phase(&self) -> Phase;

    fn completed_phase(&self) -> Phase;

    fn run(&mut self, program: &mut Program, context: &mut StageContext) -> IrResult<()>;
}

/// Per-pipeline state handed to every stage
#[derive(Debug, Default)]
pub struct StageContext {
    active: Option<String>,
    reporter: ErrorReporter,
    completed: Vec<String>,
}

impl StageContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the stage currently running, if any
    pub fn active_stage(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut ErrorReporter {
        &mut self.reporter
    }

    /// Stages that finished successfully, in run order
    pub fn completed(&self) -> &[String] {
        &self.completed
    }
}

impl Program {
    /// Run `stage` if the program has reached its required phase, then move
    /// the program forward to the stage's completed phase.
    pub fn run_stage(&mut self, stage: &mut dyn Stage, context: &mut StageContext) -> IrResult<()> {
        let current = self.condition().current();
        if current < stage.required_phase() {
            return Err(IrError::StageIncompatible {
                stage: stage.name().to_string(),
                required: stage.required_phase().to_string(),
                current: current.to_string(),
            });
        }

        info!("running stage '{}' on '{}'", stage.name(), self.name());
        context.active = Some(stage.name().to_string());
        let outcome = stage.run(self, context);
        context.active = None;
        outcome?;

        let reached = self.condition_mut().advance_to(stage.completed_phase());
        debug!("stage '{}' done, program at {reached}", stage.name());
        context.completed.push(stage.name().to_string());
        Ok(())
    }
}
