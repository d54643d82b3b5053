use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A fact the user stated about themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserFact {
    /// Description of what the user stated.
    pub fact: String,
    /// Category: equipment, schedule, preference, household, location.
    pub topic: String,
}

/// A fact that was correctly saved to memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CorrectSave {
    pub fact: String,
    /// How it was saved to memory.
    pub saved_as: String,
}

/// A fact the user stated but was not saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MissedFact {
    pub fact: String,
    /// Which memory field should have been updated.
    pub should_have_updated: String,
}

/// Something saved to memory that the user did not state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Hallucination {
    /// What was incorrectly saved.
    pub saved: String,
    /// Why this is considered a hallucination.
    pub reason: String,
}

/// Correct data that was incorrectly lost or overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataLoss {
    pub field: String,
    /// The value that was lost.
    pub old_value: String,
    /// Why this loss was incorrect.
    pub reason: String,
}

/// The structured verdict the backend must return. The generated schema
/// is handed to the backend and the response is validated against it
/// before deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MemoryHygieneEvaluation {
    #[serde(default)]
    pub user_facts_stated: Vec<UserFact>,
    #[serde(default)]
    pub facts_correctly_saved: Vec<CorrectSave>,
    #[serde(default)]
    pub facts_missed: Vec<MissedFact>,
    #[serde(default)]
    pub hallucinations: Vec<Hallucination>,
    #[serde(default)]
    pub data_incorrectly_lost: Vec<DataLoss>,
    /// One sentence summary of memory management quality.
    pub summary: String,
    /// Quality score from 0.0 (worst) to 1.0 (best).
    pub score: f64,
    pub passed: bool,
}
