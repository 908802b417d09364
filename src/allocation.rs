use crate::level::ResourceLevel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One resource's assignment interval on one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatedResource {
    /// Identifier of the person or crew being allocated.
    pub resource_id: String,
    pub resource_name: String,
    pub level: ResourceLevel,
    pub start_date: NaiveDate,
    /// Open allocations carry no end date and are costed through the
    /// reference date supplied to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl AllocatedResource {
    pub fn new(
        resource_id: impl Into<String>,
        resource_name: impl Into<String>,
        level: impl Into<ResourceLevel>,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_name: resource_name.into(),
            level: level.into(),
            start_date,
            end_date: None,
        }
    }

    pub fn ending(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Last day this allocation is costed for, given the reference date.
    pub fn effective_end(&self, reference_date: NaiveDate) -> NaiveDate {
        self.end_date.unwrap_or(reference_date)
    }
}

/// Headcount needed at a level, independent of named resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    pub level: ResourceLevel,
    pub quantity: u32,
}

impl ResourceRequirement {
    pub fn new(level: impl Into<ResourceLevel>, quantity: u32) -> Self {
        Self {
            level: level.into(),
            quantity,
        }
    }
}
