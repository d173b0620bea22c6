//! Action runner - form state plus one async operation and its outcome
//!
//! `run()` flips the card to `Running` and hands back a [`PendingRun`]; the
//! caller drives it (usually in a spawned task) and feeds the
//! [`RunCompletion`] back through [`ActionRunner::complete`]. Completions
//! whose ticket no longer matches are dropped, so a card that was rebuilt
//! mid-flight never sees a late result.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;

use crate::action::form::{FormState, FormValues};
use crate::action::schema::{FieldSpec, Schema};
use crate::config::AppConfig;
use crate::constants::DEFAULT_ACTION_LABEL;
use crate::error::{FormError, SchemaError};

/// Result of an operation: any serializable value, or an error
pub type OperationResult = anyhow::Result<Value>;

/// Async operation invoked with the processed form values
pub type Operation = Arc<dyn Fn(FormValues) -> BoxFuture<'static, OperationResult> + Send + Sync>;

/// Wrap an async closure returning any serializable value as an [`Operation`]
pub fn operation<F, Fut, T>(f: F) -> Operation
where
    F: Fn(FormValues) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Serialize,
{
    let f = Arc::new(f);
    Arc::new(move |values| {
        let f = Arc::clone(&f);
        async move {
            let result = f(values).await?;
            Ok(serde_json::to_value(result)?)
        }
        .boxed()
    })
}

/// Invocation state of a card
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Outcome {
    #[default]
    Idle,
    Running,
    Succeeded(Value),
    Failed(String),
}

impl Outcome {
    pub fn is_running(&self) -> bool {
        matches!(self, Outcome::Running)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Idle => "idle",
            Outcome::Running => "running",
            Outcome::Succeeded(_) => "succeeded",
            Outcome::Failed(_) => "failed",
        }
    }
}

/// Console text for an outcome
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedOutcome {
    pub text: String,
    pub is_error: bool,
}

/// Pure view of an outcome; nothing to show while idle or running.
/// String results are shown verbatim, everything else as pretty JSON.
pub fn render_outcome(outcome: &Outcome) -> Option<RenderedOutcome> {
    match outcome {
        Outcome::Idle | Outcome::Running => None,
        Outcome::Succeeded(Value::String(text)) => Some(RenderedOutcome {
            text: text.clone(),
            is_error: false,
        }),
        Outcome::Succeeded(value) => Some(RenderedOutcome {
            text: serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            is_error: false,
        }),
        Outcome::Failed(message) => Some(RenderedOutcome {
            text: message.clone(),
            is_error: true,
        }),
    }
}

/// Identifies one invocation of one runner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunTicket {
    pub runner: u64,
    pub invocation: u64,
}

/// Finished invocation, ready to be applied with [`ActionRunner::complete`]
#[derive(Debug)]
pub struct RunCompletion {
    pub ticket: RunTicket,
    pub result: Result<Value, String>,
}

/// In-flight invocation returned by [`ActionRunner::run`]
pub struct PendingRun {
    ticket: RunTicket,
    future: BoxFuture<'static, OperationResult>,
}

impl PendingRun {
    pub fn ticket(&self) -> RunTicket {
        self.ticket
    }

    /// Drive the operation to completion; errors and panics become messages
    pub async fn resolve(self) -> RunCompletion {
        let result = match AssertUnwindSafe(self.future).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(failure_message(&err)),
            Err(panic) => Err(panic_message(panic)),
        };
        RunCompletion {
            ticket: self.ticket,
            result,
        }
    }
}

fn failure_message(err: &anyhow::Error) -> String {
    let message = format!("{:#}", err);
    if message.trim().is_empty() {
        format!("{:?}", err)
    } else {
        message
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("operation panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("operation panicked: {}", s)
    } else {
        "operation panicked".to_string()
    }
}

static NEXT_RUNNER_ID: AtomicU64 = AtomicU64::new(1);

/// One action card: schema, form values, operation and current outcome
pub struct ActionRunner {
    id: u64,
    title: String,
    description: Option<String>,
    label: String,
    schema: Schema,
    networks: Vec<String>,
    form: FormState,
    operation: Operation,
    outcome: Outcome,
    invocation: u64,
}

impl std::fmt::Debug for ActionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRunner")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("form", &self.form)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl ActionRunner {
    /// Validate the schema and build the card. Network fields select from
    /// the networks of `config`; a blank label falls back to "Run".
    pub fn configure(
        title: impl Into<String>,
        fields: Vec<FieldSpec>,
        operation: Operation,
        label: impl Into<String>,
        config: &AppConfig,
    ) -> Result<Self, SchemaError> {
        let networks = config.network_names();
        let schema = Schema::new(fields, &networks)?;
        let form = FormState::new(&schema, &networks);
        let label = label.into();
        Ok(ActionRunner {
            id: NEXT_RUNNER_ID.fetch_add(1, Ordering::Relaxed),
            title: title.into(),
            description: None,
            label: if label.trim().is_empty() {
                DEFAULT_ACTION_LABEL.to_string()
            } else {
                label
            },
            schema,
            networks,
            form,
            operation,
            outcome: Outcome::Idle,
            invocation: 0,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn networks(&self) -> &[String] {
        &self.networks
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.form.get(id)
    }

    pub fn current_outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_running(&self) -> bool {
        self.outcome.is_running()
    }

    /// Replace one field's value; inputs are disabled while running
    pub fn update_field(&mut self, id: &str, value: impl Into<String>) -> Result<(), FormError> {
        if self.is_running() {
            return Err(FormError::Busy);
        }
        self.form.set(id, value)
    }

    /// Start an invocation. Returns `None` when one is already running.
    pub fn run(&mut self) -> Option<PendingRun> {
        if self.is_running() {
            tracing::warn!(card = %self.title, "Run rejected: already running");
            return None;
        }

        self.invocation += 1;
        self.outcome = Outcome::Running;
        let ticket = RunTicket {
            runner: self.id,
            invocation: self.invocation,
        };
        let values = self.form.to_values(&self.schema);
        tracing::info!(card = %self.title, invocation = ticket.invocation, "Running action");

        Some(PendingRun {
            ticket,
            future: (self.operation)(values),
        })
    }

    /// Apply a finished invocation. Returns false when the completion is
    /// stale and was discarded.
    pub fn complete(&mut self, completion: RunCompletion) -> bool {
        let expected = RunTicket {
            runner: self.id,
            invocation: self.invocation,
        };
        if completion.ticket != expected || !self.is_running() {
            tracing::warn!(
                card = %self.title,
                ?completion.ticket,
                "Discarding stale action completion"
            );
            return false;
        }

        self.outcome = match completion.result {
            Ok(value) => {
                tracing::info!(card = %self.title, "Action succeeded");
                Outcome::Succeeded(value)
            }
            Err(message) => {
                tracing::info!(card = %self.title, error = %message, "Action failed");
                Outcome::Failed(message)
            }
        };
        true
    }

    /// Run in place and wait for the outcome; `None` if already running
    pub async fn run_to_completion(&mut self) -> Option<&Outcome> {
        let pending = self.run()?;
        let completion = pending.resolve().await;
        self.complete(completion);
        Some(&self.outcome)
    }
}
