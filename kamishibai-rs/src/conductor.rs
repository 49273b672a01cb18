//! Tick-driven playback: the state machine that walks a script and hands
//! each tag to the host.
//!
//! The driver calls [`Conductor::step`] once per external clock tick. A step
//! either does nothing (stopped, or mid-sleep), or pulls the next tag,
//! substitutes entity values, and dispatches exactly one host callback.
//! Sleeping is cooperative polling, not a timer: the conductor just compares
//! the caller's tick against the recorded sleep start.

use crate::error::{EvalError, LabelNotFoundError, LoadError};
use crate::resource::Resource;
use crate::script::Script;
use crate::tag::{Tag, Value, CODE_TAG, LABEL_TAG};

// ── Status ────────────────────────────────────────────────────────────────────

/// Playback state. Sleep bookkeeping lives in the variant, so it exists
/// exactly while sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Stop,
    Run,
    Sleep { start_tick: u64, duration: u64 },
}

// ── Host interface ────────────────────────────────────────────────────────────

/// Callbacks the host passes into [`Conductor::step`].
///
/// A step fires at most one of `on_label` / `on_code` / `on_tag`. `on_error`
/// is the report channel drivers use for load and evaluation failures; the
/// conductor itself surfaces those through `Result` instead.
pub trait ConductorEvent {
    fn on_error(&mut self, messages: &[String]);
    fn on_label(&mut self, label: &str);
    fn on_code(&mut self, code: &str, print: bool);
    fn on_tag(&mut self, tag: &Tag);
}

// ── Conductor ─────────────────────────────────────────────────────────────────

pub struct Conductor {
    resource: Resource,
    script: Option<Script>,
    status: Status,
}

impl Conductor {
    /// New conductor, stopped, with no script loaded.
    pub fn new(resource: Resource) -> Self {
        Conductor {
            resource,
            script: None,
            status: Status::Stop,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn script(&self) -> Option<&Script> {
        self.script.as_ref()
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn resource_mut(&mut self) -> &mut Resource {
        &mut self.resource
    }

    /// Load and activate a script. The previous script stays active if the
    /// load fails.
    pub async fn load_script(&mut self, path: &str) -> Result<(), LoadError> {
        let script = self.resource.load_script(path).await?;
        tracing::debug!(path, tags = script.len(), "conductor script loaded");
        self.script = Some(script);
        Ok(())
    }

    /// Activate an already-parsed script (e.g. built from in-memory source).
    pub fn set_script(&mut self, script: Script) {
        self.script = Some(script);
    }

    pub fn start(&mut self) {
        self.status = Status::Run;
        tracing::debug!("conductor start");
    }

    /// Immediate and total, including mid-sleep.
    pub fn stop(&mut self) {
        self.status = Status::Stop;
        tracing::debug!("conductor stop");
    }

    pub fn sleep(&mut self, tick: u64, duration: u64) {
        self.status = Status::Sleep {
            start_tick: tick,
            duration,
        };
        tracing::debug!(tick, duration, "conductor sleep");
    }

    /// Reposition the active script just past the named label.
    pub fn jump_to_label(&mut self, name: &str) -> Result<(), LabelNotFoundError> {
        match self.script.as_mut() {
            Some(script) => script.jump_to_label(name),
            None => Err(LabelNotFoundError::new(name)),
        }
    }

    /// Advance playback by one tick.
    ///
    /// Stopped: no-op. Sleeping: no-op until `tick - start_tick` reaches the
    /// duration, then resumes and steps within the same call. Running: pull
    /// the next tag, substitute, dispatch one callback. An exhausted (or
    /// absent) script transitions to stop without any callback; the host
    /// observes end of script via [`status`](Conductor::status).
    pub fn step(&mut self, tick: u64, events: &mut dyn ConductorEvent) -> Result<(), EvalError> {
        match self.status {
            Status::Stop => return Ok(()),
            Status::Sleep {
                start_tick,
                duration,
            } => {
                if tick.saturating_sub(start_tick) < duration {
                    return Ok(());
                }
                tracing::debug!(tick, "conductor wake");
                self.status = Status::Run;
            }
            Status::Run => {}
        }

        // Clone the template: substitution must never touch the canonical
        // sequence, and the clone ends the borrow of the script.
        let tag = match self.script.as_mut().and_then(Script::get_next_tag) {
            Some(tag) => tag.clone(),
            None => {
                tracing::debug!(tick, "script exhausted");
                self.stop();
                return Ok(());
            }
        };
        let tag = self.substitute(tag)?;

        match tag.name.as_str() {
            LABEL_TAG => {
                tracing::trace!(label = tag.body(), "dispatch label");
                events.on_label(tag.body());
            }
            CODE_TAG => {
                tracing::trace!(print = tag.print(), "dispatch code");
                events.on_code(tag.body(), tag.print());
            }
            _ => {
                tracing::trace!(name = %tag.name, "dispatch tag");
                events.on_tag(&tag);
            }
        }
        Ok(())
    }

    /// Entity substitution: any string value of the form `&expr` (length ≥ 2)
    /// is replaced by the string form of evaluating `expr`. A lone `&` and
    /// non-string values pass through untouched.
    fn substitute(&mut self, mut tag: Tag) -> Result<Tag, EvalError> {
        for value in tag.values.values_mut() {
            let expr = match value {
                Value::Str(s) if s.starts_with('&') && s.len() >= 2 => s[1..].to_owned(),
                _ => continue,
            };
            let result = self.resource.eval(&expr)?;
            *value = Value::Str(result.to_string());
        }
        Ok(tag)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
