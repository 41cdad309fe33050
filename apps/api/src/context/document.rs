use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The entity collections held by the context document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Jobs,
    Candidates,
    Employees,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Jobs,
        Collection::Candidates,
        Collection::Employees,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Candidates => "candidates",
            Collection::Employees => "employees",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory form of the whole context file.
///
/// Missing collections deserialize as empty maps and a missing `team_summary`
/// as an empty string, so documents written before the summary existed still load.
/// Unknown top-level keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    #[serde(default)]
    pub jobs: Map<String, Value>,
    #[serde(default)]
    pub candidates: Map<String, Value>,
    #[serde(default)]
    pub employees: Map<String, Value>,
    #[serde(default)]
    pub team_summary: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContextDocument {
    pub fn collection(&self, collection: Collection) -> &Map<String, Value> {
        match collection {
            Collection::Jobs => &self.jobs,
            Collection::Candidates => &self.candidates,
            Collection::Employees => &self.employees,
        }
    }

    pub fn collection_mut(&mut self, collection: Collection) -> &mut Map<String, Value> {
        match collection {
            Collection::Jobs => &mut self.jobs,
            Collection::Candidates => &mut self.candidates,
            Collection::Employees => &mut self.employees,
        }
    }

    /// Stored value for `id`, or an empty object when absent.
    pub fn entity(&self, collection: Collection, id: &str) -> Value {
        self.collection(collection)
            .get(id)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Writes `onboarding_docs.offer_letter` on a candidate, creating the
    /// candidate and the nested map as needed.
    pub fn set_candidate_offer(&mut self, candidate_id: &str, offer_text: &str) {
        let candidate = self
            .candidates
            .entry(candidate_id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !candidate.is_object() {
            *candidate = Value::Object(Map::new());
        }
        let Value::Object(fields) = candidate else {
            return;
        };
        let docs = fields
            .entry("onboarding_docs".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !docs.is_object() {
            *docs = Value::Object(Map::new());
        }
        if let Value::Object(docs) = docs {
            docs.insert(
                "offer_letter".to_string(),
                Value::String(offer_text.to_string()),
            );
        }
    }

    pub fn candidate_offer(&self, candidate_id: &str) -> String {
        self.candidates
            .get(candidate_id)
            .and_then(|c| c.get("onboarding_docs"))
            .and_then(|d| d.get("offer_letter"))
            .and_then(|o| o.as_str())
            .unwrap_or_default()
            .to_string()
    }
}
