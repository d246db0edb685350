//! Interpreter - Execute Effects using a Provider
//!
//! The Interpreter executes Effects contained in a Plan in order,
//! collecting the results. This is where side effects actually occur.
//! References are resolved against a binding map that grows as effects
//! complete, so a subnet created after its VPC sees the VPC's new `id`.

use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{Provider, ProviderError, ProviderResult};
use crate::resolver::{BindingMap, merged_attributes, resolve_resource, unresolved_attributes};
use crate::resource::{Resource, State};

/// Result of executing each Effect
#[derive(Debug)]
pub enum EffectOutcome {
    /// Read succeeded
    Read { state: State },
    /// Create succeeded
    Created { state: State },
    /// Update succeeded
    Updated { state: State },
    /// Replace succeeded (old deleted, new created)
    Replaced { state: State },
    /// Delete succeeded
    Deleted,
    /// Skipped (e.g., dry-run)
    Skipped { reason: String },
}

impl EffectOutcome {
    /// State produced by the effect, if any
    pub fn state(&self) -> Option<&State> {
        match self {
            EffectOutcome::Read { state }
            | EffectOutcome::Created { state }
            | EffectOutcome::Updated { state }
            | EffectOutcome::Replaced { state } => Some(state),
            EffectOutcome::Deleted | EffectOutcome::Skipped { .. } => None,
        }
    }
}

/// Result of executing the entire Plan
#[derive(Debug)]
pub struct ApplyResult {
    pub outcomes: Vec<Result<EffectOutcome, ProviderError>>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Interpreter configuration
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// If true, skip actual side effects
    pub dry_run: bool,
    /// Continue on error
    pub continue_on_error: bool,
}

/// Interpreter that executes Effects using a Provider
pub struct Interpreter<P: Provider> {
    provider: P,
    config: InterpreterConfig,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Execute a Plan, interpreting all Effects and causing side effects
    pub async fn apply(&self, plan: &Plan, bindings: &mut BindingMap) -> ApplyResult {
        let mut outcomes = Vec::new();
        let mut success_count = 0;
        let mut failure_count = 0;

        for effect in plan.effects() {
            let result = self.execute_effect(effect, bindings).await;

            match &result {
                Ok(_) => success_count += 1,
                Err(e) => {
                    log::error!("{} failed: {}", effect, e);
                    failure_count += 1;
                    if !self.config.continue_on_error {
                        outcomes.push(result);
                        break;
                    }
                }
            }

            outcomes.push(result);
        }

        ApplyResult {
            outcomes,
            success_count,
            failure_count,
        }
    }

    /// Execute a single Effect, updating `bindings` with the produced state
    pub async fn execute_effect(
        &self,
        effect: &Effect,
        bindings: &mut BindingMap,
    ) -> ProviderResult<EffectOutcome> {
        if self.config.dry_run {
            return Ok(EffectOutcome::Skipped {
                reason: "dry-run mode".to_string(),
            });
        }

        log::debug!("executing {}", effect);

        match effect {
            Effect::Read(resource) => {
                let resource = resolved(resource, bindings)?;
                let state = self.provider.read(&resource, None).await?;
                if !state.exists {
                    return Err(ProviderError::new("data source lookup found nothing")
                        .with_kind(crate::provider::ErrorKind::NotFound)
                        .for_resource(resource.id.clone()));
                }
                record(bindings, &resource, &state);
                Ok(EffectOutcome::Read { state })
            }
            Effect::Create(resource) => {
                let resource = resolved(resource, bindings)?;
                let state = self.provider.create(&resource).await?;
                record(bindings, &resource, &state);
                Ok(EffectOutcome::Created { state })
            }
            Effect::Update { id, from, to, .. } => {
                let to = resolved(to, bindings)?;
                let identifier = from.identifier.as_deref().ok_or_else(|| {
                    ProviderError::new("cannot update a resource without an identifier")
                        .for_resource(id.clone())
                })?;
                let state = self.provider.update(id, identifier, from, &to).await?;
                record(bindings, &to, &state);
                Ok(EffectOutcome::Updated { state })
            }
            Effect::Replace { id, from, to, .. } => {
                let to = resolved(to, bindings)?;
                if let Some(identifier) = from.identifier.as_deref() {
                    self.provider.delete(id, identifier, from).await?;
                }
                let state = self.provider.create(&to).await?;
                record(bindings, &to, &state);
                Ok(EffectOutcome::Replaced { state })
            }
            Effect::Delete {
                id,
                identifier,
                from,
            } => {
                self.provider.delete(id, identifier, from).await?;
                bindings.remove(&id.name);
                Ok(EffectOutcome::Deleted)
            }
        }
    }
}

fn resolved(resource: &Resource, bindings: &BindingMap) -> ProviderResult<Resource> {
    let resource = resolve_resource(resource, bindings);
    let unresolved = unresolved_attributes(&resource);
    if unresolved.is_empty() {
        Ok(resource)
    } else {
        Err(ProviderError::validation(format!(
            "unresolved reference in attribute(s): {}",
            unresolved.join(", ")
        ))
        .for_resource(resource.id.clone()))
    }
}

fn record(bindings: &mut BindingMap, resource: &Resource, state: &State) {
    bindings.insert(
        resource.id.name.clone(),
        merged_attributes(resource, Some(state)),
    );
}
