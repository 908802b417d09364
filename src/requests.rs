//! Typed create/update payloads. Each maps onto one portfolio operation and
//! one HTTP route.

use crate::allocation::{AllocatedResource, ResourceRequirement};
use crate::level::ResourceLevel;
use crate::project::{Client, Project};
use crate::rate_card::{RateCardEntry, RateScope};
use crate::validation::{self, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClientRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
}

impl NewClientRequest {
    pub fn into_client(self, id: u32) -> Result<Client, ValidationError> {
        let client = Client {
            id,
            name: self.name.trim().to_string(),
            contact_email: self.contact_email.map(|email| email.trim().to_string()),
        };
        validation::validate_client(&client)?;
        Ok(client)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProjectRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u32>,
    pub quoted_budget: f64,
}

impl NewProjectRequest {
    pub fn into_project(self, id: u32) -> Result<Project, ValidationError> {
        let mut project = Project::new(id, self.name.trim(), self.quoted_budget);
        project.client_id = self.client_id;
        validation::validate_project(&project)?;
        Ok(project)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBudgetRequest {
    pub quoted_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRateCardRequest {
    pub level: ResourceLevel,
    pub rate: f64,
    /// Omit for a global rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u32>,
}

impl NewRateCardRequest {
    pub fn into_entry(self) -> Result<RateCardEntry, ValidationError> {
        let entry = RateCardEntry {
            level: self.level,
            rate: self.rate,
            scope: RateScope::from(self.project_id),
        };
        validation::validate_rate_card(&entry)?;
        Ok(entry)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAllocationRequest {
    pub resource_id: String,
    pub resource_name: String,
    pub level: ResourceLevel,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl NewAllocationRequest {
    pub fn into_allocation(self) -> Result<AllocatedResource, ValidationError> {
        let allocation = AllocatedResource {
            resource_id: self.resource_id.trim().to_string(),
            resource_name: self.resource_name.trim().to_string(),
            level: self.level,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        validation::validate_allocation(&allocation)?;
        Ok(allocation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequirementRequest {
    pub level: ResourceLevel,
    pub quantity: u32,
}

impl NewRequirementRequest {
    pub fn into_requirement(self) -> Result<ResourceRequirement, ValidationError> {
        let requirement = ResourceRequirement::new(self.level, self.quantity);
        validation::validate_requirement(&requirement)?;
        Ok(requirement)
    }
}
