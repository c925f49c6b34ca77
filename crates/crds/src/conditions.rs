//! Status conditions shared by managed resources
//!
//! A managed resource carries at most one condition per [`ConditionType`]:
//! - `Ready` reports the lifecycle of the remote resource (Creating, Available, ...)
//! - `Synced` reports whether the last reconciliation succeeded

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionType {
    /// The remote resource's readiness for use
    Ready,
    /// The outcome of the most recent reconciliation
    Synced,
}

/// Condition status following Kubernetes conventions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

/// Machine-readable reason for a condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionReason {
    /// Remote resource is ready for use
    Available,
    /// Remote resource exists but cannot be used yet
    Unavailable,
    /// Remote resource is being created
    Creating,
    /// Remote resource is being deleted
    Deleting,
    /// Last reconciliation succeeded
    ReconcileSuccess,
    /// Last reconciliation failed
    ReconcileError,
}

/// Kubernetes-style condition for status reporting
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    #[serde(rename = "type")]
    pub type_: ConditionType,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason for the condition
    pub reason: ConditionReason,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    fn new(type_: ConditionType, status: ConditionStatus, reason: ConditionReason) -> Self {
        Self {
            type_,
            status,
            reason,
            message: None,
            last_transition_time: Utc::now(),
        }
    }

    /// Remote resource is ready for use
    pub fn available() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::True, ConditionReason::Available)
    }

    /// Remote resource exists but is not usable
    pub fn unavailable() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Unavailable)
    }

    /// Remote resource is being created
    pub fn creating() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Creating)
    }

    /// Remote resource is being deleted
    pub fn deleting() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Deleting)
    }

    /// Reconciliation completed without error
    pub fn reconcile_success() -> Self {
        Self::new(ConditionType::Synced, ConditionStatus::True, ConditionReason::ReconcileSuccess)
    }

    /// Reconciliation failed; `err` becomes the user-visible message
    pub fn reconcile_error(err: impl std::fmt::Display) -> Self {
        let mut condition =
            Self::new(ConditionType::Synced, ConditionStatus::False, ConditionReason::ReconcileError);
        condition.message = Some(err.to_string());
        condition
    }

    /// True when both conditions say the same thing, ignoring the transition time
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Binding phase of a managed resource
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum BindingPhase {
    /// Not ready to be bound
    #[default]
    Unbindable,
    /// Ready to be bound, not yet bound
    Unbound,
    /// Bound to a consumer
    Bound,
    /// Previously bound, consumer released it
    Released,
}

/// Status fields common to every managed resource
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionedStatus {
    /// Latest observations, at most one per condition type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Binding phase
    #[serde(default)]
    pub binding_phase: BindingPhase,
}

impl ConditionedStatus {
    /// Sets conditions, replacing any existing condition of the same type.
    ///
    /// An equivalent condition keeps its original transition time so that
    /// repeated reconciliations produce identical status.
    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        for condition in conditions {
            match self.conditions.iter_mut().find(|c| c.type_ == condition.type_) {
                Some(existing) if existing.equivalent(&condition) => {}
                Some(existing) => *existing = condition,
                None => self.conditions.push(condition),
            }
        }
    }

    /// Returns the condition of the given type, if set
    pub fn condition(&self, type_: ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    /// Marks the resource bindable. A bound resource stays bound.
    pub fn set_bindable(&mut self) {
        if self.binding_phase != BindingPhase::Bound {
            self.binding_phase = BindingPhase::Unbound;
        }
    }

    /// Whether the resource is ready for consumers to bind to
    pub fn is_bindable(&self) -> bool {
        matches!(self.binding_phase, BindingPhase::Unbound | BindingPhase::Bound)
    }
}
