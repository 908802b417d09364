use crate::allocation::{AllocatedResource, ResourceRequirement};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

/// The unit over which budget reconciliation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u32>,
    /// Budget quoted to the client, in the same currency as rate cards.
    pub quoted_budget: f64,
    #[serde(default)]
    pub allocations: Vec<AllocatedResource>,
    #[serde(default)]
    pub requirements: Vec<ResourceRequirement>,
}

impl Project {
    pub fn new(id: u32, name: impl Into<String>, quoted_budget: f64) -> Self {
        Self {
            id,
            name: name.into(),
            client_id: None,
            quoted_budget,
            allocations: Vec::new(),
            requirements: Vec::new(),
        }
    }

    pub fn find_allocation(&self, resource_id: &str) -> Option<&AllocatedResource> {
        self.allocations
            .iter()
            .find(|allocation| allocation.resource_id == resource_id)
    }
}
