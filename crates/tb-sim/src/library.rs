//! Stand-in for the external reasoning library.
//!
//! Code generation and regeneration go through a [`LanguageModel`];
//! execution follows a scripted or seeded plan instead of running anything.

use std::collections::VecDeque;

use tb_bridge::LanguageModel;
use tb_core::{AugmentedInstruction, ChatMessage, ConversationMemory, ExecutionFailure, Traced};
use tb_lifecycle::CodeLifecycle;
use tracing::debug;

use crate::error::SimError;
use crate::fault::FaultInjector;

/// Shape of an injected execution failure, one per trace-recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureShape {
    /// Failure carries its own trace.
    Traced,
    /// Untraced wrapper around a traced cause.
    ChainedCause,
    /// Kind and message only.
    MessageOnly,
}

const SHAPES: [FailureShape; 3] = [
    FailureShape::Traced,
    FailureShape::ChainedCause,
    FailureShape::MessageOnly,
];

/// Failure kinds and messages the simulated interpreter raises.
const FAILURES: [(&str, &str); 3] = [
    ("KeyError", "'regoin'"),
    ("NameError", "name 'dfs' is not defined"),
    ("ZeroDivisionError", "division by zero"),
];

/// Outcome of one scripted execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Succeed,
    Fail(FailureShape),
}

#[derive(Debug)]
enum Plan {
    /// Replays steps in order, then succeeds.
    Scripted(VecDeque<Step>),
    Seeded(FaultInjector),
}

pub struct ScriptedLibrary<M> {
    model: M,
    plan: Plan,
    history: Vec<ChatMessage>,
    prompt_suffix: Option<String>,
    executions_count: u32,
    regenerations_count: u32,
}

impl<M: LanguageModel> ScriptedLibrary<M> {
    /// Library following `steps`, then succeeding.
    pub fn scripted(model: M, steps: impl IntoIterator<Item = Step>) -> Self {
        Self::with_plan(model, Plan::Scripted(steps.into_iter().collect()))
    }

    /// Library whose executions fail at the injector's rate.
    pub fn seeded(model: M, faults: FaultInjector) -> Self {
        Self::with_plan(model, Plan::Seeded(faults))
    }

    fn with_plan(model: M, plan: Plan) -> Self {
        Self {
            model,
            plan,
            history: Vec::new(),
            prompt_suffix: None,
            executions_count: 0,
            regenerations_count: 0,
        }
    }

    /// Start from an existing conversation.
    #[must_use]
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Text appended to every instruction sent to the model.
    #[must_use]
    pub fn with_prompt_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.prompt_suffix = Some(suffix.into());
        self
    }

    /// Conversation recorded so far.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn executions_count(&self) -> u32 {
        self.executions_count
    }

    pub fn regenerations_count(&self) -> u32 {
        self.regenerations_count
    }

    fn ask(&self, instruction: String) -> Result<String, SimError> {
        let memory: &dyn ConversationMemory = &self.history;
        let reply = match self.prompt_suffix {
            Some(ref suffix) => self
                .model
                .call(&AugmentedInstruction::new(instruction, suffix.clone()), Some(memory))?,
            None => self.model.call(&instruction, Some(memory))?,
        };
        extract_code(&reply).ok_or(SimError::NoCode)
    }

    fn next_step(&mut self) -> (Step, usize) {
        let attempt = self.executions_count as usize;
        match self.plan {
            Plan::Scripted(ref mut steps) => (steps.pop_front().unwrap_or(Step::Succeed), attempt),
            Plan::Seeded(ref mut faults) => {
                if !faults.should_fail_execution() {
                    return (Step::Succeed, attempt);
                }
                let rng = faults.rng();
                let shape = rng.choose(&SHAPES).copied().unwrap_or(FailureShape::Traced);
                let index = rng.gen_range(0..FAILURES.len());
                (Step::Fail(shape), index)
            }
        }
    }
}

impl<M: LanguageModel> CodeLifecycle for ScriptedLibrary<M> {
    type Output = String;
    type Error = SimError;

    fn generate_code(&mut self, query: &str) -> Result<String, SimError> {
        let code = self.ask(query.to_string())?;
        self.history.push(ChatMessage::user(query));
        Ok(code)
    }

    fn execute_code(&mut self, code: &str) -> Result<String, SimError> {
        let (step, failure_index) = self.next_step();
        self.executions_count += 1;
        debug!(attempt = self.executions_count, ?step, "simulated execution");

        match step {
            Step::Succeed => {
                let output = format!("ran {} line(s)", code.lines().count());
                self.history.push(ChatMessage::assistant(output.clone()));
                Ok(output)
            }
            Step::Fail(shape) => Err(execution_failure(shape, code, failure_index).into()),
        }
    }

    fn regenerate_code_after_error(
        &mut self,
        code: Option<&str>,
        error: &SimError,
    ) -> Result<String, SimError> {
        self.regenerations_count += 1;
        let instruction = format!(
            "You generated this python code:\n{}\n\nIt fails with the following error:\n{}\n\n\
             Fix the python code above and return the new python code.",
            code.unwrap_or_default(),
            error.summary()
        );
        self.ask(instruction)
    }
}

/// Body of the first fenced block, or the whole reply when unfenced.
pub fn extract_code(reply: &str) -> Option<String> {
    let body = match reply.split_once("```") {
        Some((_, rest)) => {
            let rest = rest.split_once('\n').map_or("", |(_, body)| body);
            rest.split_once("```").map_or(rest, |(body, _)| body)
        }
        None => reply,
    };
    let body = body.trim();
    (!body.is_empty()).then(|| body.to_string())
}

fn execution_failure(shape: FailureShape, code: &str, index: usize) -> ExecutionFailure {
    let (kind, message) = FAILURES[index % FAILURES.len()];
    let (line_number, source_line) = code
        .lines()
        .enumerate()
        .find(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map_or((1, ""), |(i, line)| (i + 1, line.trim()));
    let trace = format!(
        "Traceback (most recent call last):\n  File \"<generated>\", line {}, in <module>\n    {}",
        line_number, source_line
    );

    match shape {
        FailureShape::Traced => ExecutionFailure::new(kind, message).with_trace(trace),
        FailureShape::ChainedCause => ExecutionFailure::new("CodeExecutionError", "generated code raised")
            .caused_by(ExecutionFailure::new(kind, message).with_trace(trace)),
        FailureShape::MessageOnly => ExecutionFailure::new(kind, message),
    }
}
