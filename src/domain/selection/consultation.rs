//! Consultation opt-in.
//!
//! A disabled selection carries no type or price at all, so nothing can read a
//! stale fee next to `enabled = false`.

use crate::domain::value_objects::Naira;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consultation {
    #[serde(rename = "type")]
    pub kind: String,
    pub price: Naira,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Consultation {
    pub fn new(kind: impl Into<String>, price: Naira) -> Self {
        Self { kind: kind.into(), price, description: None }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Persisted as `{ enabled, type?, price?, description? }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSelection", into = "RawSelection")]
pub enum ConsultationSelection {
    #[default]
    Disabled,
    Enabled(Consultation),
}

impl ConsultationSelection {
    pub fn is_enabled(&self) -> bool { matches!(self, Self::Enabled(_)) }

    pub fn consultation(&self) -> Option<&Consultation> {
        match self { Self::Enabled(c) => Some(c), Self::Disabled => None }
    }

    pub fn price(&self) -> Naira { self.consultation().map(|c| c.price).unwrap_or_default() }
}

#[derive(Serialize, Deserialize)]
struct RawSelection {
    enabled: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<Naira>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl From<RawSelection> for ConsultationSelection {
    fn from(raw: RawSelection) -> Self {
        match (raw.enabled, raw.kind) {
            (true, Some(kind)) => Self::Enabled(Consultation { kind, price: raw.price.unwrap_or_default(), description: raw.description }),
            _ => Self::Disabled,
        }
    }
}

impl From<ConsultationSelection> for RawSelection {
    fn from(selection: ConsultationSelection) -> Self {
        match selection {
            ConsultationSelection::Disabled => RawSelection { enabled: false, kind: None, price: None, description: None },
            ConsultationSelection::Enabled(c) => RawSelection { enabled: true, kind: Some(c.kind), price: Some(c.price), description: c.description },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConsultationStore {
    selection: ConsultationSelection,
}

impl ConsultationStore {
    pub fn new() -> Self { Self::default() }

    pub fn selection(&self) -> &ConsultationSelection { &self.selection }
    pub fn is_enabled(&self) -> bool { self.selection.is_enabled() }
    pub fn price(&self) -> Naira { self.selection.price() }

    pub fn enable(&mut self, consultation: Consultation) {
        self.selection = ConsultationSelection::Enabled(consultation);
    }

    pub fn disable(&mut self) { self.selection = ConsultationSelection::Disabled; }

    /// Turning on needs a consultation to book; turning off always succeeds.
    pub fn toggle(&mut self, consultation: Consultation) {
        if self.is_enabled() { self.disable(); } else { self.enable(consultation); }
    }
}
