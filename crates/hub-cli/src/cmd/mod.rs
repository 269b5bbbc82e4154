pub mod comment;
pub mod completions;
pub mod config;
pub mod dash;
pub mod orgs;
pub mod project;
pub mod show;
pub mod task;
pub mod tree;

use std::sync::Arc;

use hub_core::config::EffectiveConfig;
use hub_core::{Dispatcher, HubError, Mutation, Patch, PatchOutcome};

use crate::output::{OutputMode, fail, render_error};
use crate::remote::HttpTransport;
use crate::validate::ValidationError;

/// Everything a network command needs: where to talk and how to print.
pub struct Session {
    pub config: EffectiveConfig,
    pub output: OutputMode,
}

impl Session {
    pub const fn new(config: EffectiveConfig, output: OutputMode) -> Self {
        Self { config, output }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(Arc::new(HttpTransport::from_config(&self.config)))
    }

    /// A dispatcher whose store already holds the current tree.
    pub fn loaded(&self) -> anyhow::Result<Dispatcher> {
        let mut dispatcher = self.dispatcher();
        dispatcher
            .load_blocking()
            .map_err(|err| fail(self.output, &err))?;
        Ok(dispatcher)
    }

    /// Submit one mutation and wait for it, rendering any failure.
    pub fn mutate(
        &self,
        dispatcher: &mut Dispatcher,
        mutation: Mutation,
    ) -> anyhow::Result<(Patch, PatchOutcome)> {
        dispatcher
            .submit_blocking(mutation)
            .map_err(|err| fail(self.output, &err))
    }
}

/// Render a validation failure and turn it into an exit error.
pub fn invalid(output: OutputMode, err: &ValidationError) -> anyhow::Error {
    let _ = render_error(output, &err.to_cli_error());
    anyhow::anyhow!("{}", err.reason)
}

pub fn not_found(output: OutputMode, kind: &'static str, id: impl Into<String>) -> anyhow::Error {
    fail(output, &HubError::NotFound { kind, id: id.into() })
}

/// The patch came back in an unexpected shape for this command.
pub fn unexpected(output: OutputMode, patch: &Patch) -> anyhow::Error {
    fail(
        output,
        &HubError::Decode {
            operation: "mutation",
            reason: format!("unexpected {} patch", patch.name()),
        },
    )
}
