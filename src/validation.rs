use crate::allocation::{AllocatedResource, ResourceRequirement};
use crate::project::{Client, Project};
use crate::rate_card::RateCardEntry;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn is_usable_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

pub fn validate_client(client: &Client) -> Result<(), ValidationError> {
    if client.name.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "client {} requires a non-empty name",
            client.id
        )));
    }
    if let Some(email) = &client.contact_email {
        if !email.contains('@') {
            return Err(ValidationError::new(format!(
                "client {} has invalid contact email '{}'",
                client.id, email
            )));
        }
    }
    Ok(())
}

pub fn validate_allocation(allocation: &AllocatedResource) -> Result<(), ValidationError> {
    if allocation.resource_id.trim().is_empty() {
        return Err(ValidationError::new(
            "allocation requires a non-empty resource_id",
        ));
    }
    if allocation.level.is_empty() {
        return Err(ValidationError::new(format!(
            "allocation for '{}' requires a level",
            allocation.resource_id
        )));
    }
    if let Some(end) = allocation.end_date {
        if end < allocation.start_date {
            return Err(ValidationError::new(format!(
                "allocation for '{}' ends on {} before it starts on {}",
                allocation.resource_id, end, allocation.start_date
            )));
        }
    }
    Ok(())
}

pub fn validate_requirement(requirement: &ResourceRequirement) -> Result<(), ValidationError> {
    if requirement.level.is_empty() {
        return Err(ValidationError::new("requirement requires a level"));
    }
    if requirement.quantity == 0 {
        return Err(ValidationError::new(format!(
            "requirement for level '{}' must ask for at least one resource",
            requirement.level
        )));
    }
    Ok(())
}

pub fn validate_rate_card(entry: &RateCardEntry) -> Result<(), ValidationError> {
    if entry.level.is_empty() {
        return Err(ValidationError::new(format!(
            "{} rate card entry requires a level",
            entry.scope
        )));
    }
    if !is_usable_amount(entry.rate) {
        return Err(ValidationError::new(format!(
            "{} rate for level '{}' has invalid rate {}",
            entry.scope, entry.level, entry.rate
        )));
    }
    Ok(())
}

pub fn validate_rate_cards(entries: &[RateCardEntry]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        validate_rate_card(entry)?;
        if !seen.insert((entry.scope, &entry.level)) {
            return Err(ValidationError::new(format!(
                "duplicate {} rate for level '{}'",
                entry.scope, entry.level
            )));
        }
    }
    Ok(())
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.name.trim().is_empty() {
        return Err(ValidationError::new(format!(
            "project {} requires a non-empty name",
            project.id
        )));
    }
    if !is_usable_amount(project.quoted_budget) {
        return Err(ValidationError::new(format!(
            "project {} has invalid quoted_budget {}",
            project.id, project.quoted_budget
        )));
    }

    let mut resource_ids = HashSet::with_capacity(project.allocations.len());
    for allocation in &project.allocations {
        validate_allocation(allocation).map_err(|err| {
            ValidationError::new(format!("project {}: {}", project.id, err))
        })?;
        if !resource_ids.insert(allocation.resource_id.as_str()) {
            return Err(ValidationError::new(format!(
                "project {} allocates '{}' more than once",
                project.id, allocation.resource_id
            )));
        }
    }

    let mut levels = HashSet::with_capacity(project.requirements.len());
    for requirement in &project.requirements {
        validate_requirement(requirement).map_err(|err| {
            ValidationError::new(format!("project {}: {}", project.id, err))
        })?;
        if !levels.insert(&requirement.level) {
            return Err(ValidationError::new(format!(
                "project {} lists level '{}' in more than one requirement",
                project.id, requirement.level
            )));
        }
    }
    Ok(())
}

/// Checks a whole set of records for internal consistency: unique ids,
/// projects referencing known clients, rate cards referencing known projects.
pub fn validate_records(
    clients: &[Client],
    projects: &[Project],
    rate_cards: &[RateCardEntry],
) -> Result<(), ValidationError> {
    let mut client_ids = HashSet::with_capacity(clients.len());
    for client in clients {
        if !client_ids.insert(client.id) {
            return Err(ValidationError::new(format!(
                "duplicate client id {}",
                client.id
            )));
        }
        validate_client(client)?;
    }

    let mut project_ids = HashSet::with_capacity(projects.len());
    for project in projects {
        if !project_ids.insert(project.id) {
            return Err(ValidationError::new(format!(
                "duplicate project id {}",
                project.id
            )));
        }
        if let Some(client_id) = project.client_id {
            if !client_ids.contains(&client_id) {
                return Err(ValidationError::new(format!(
                    "project {} references unknown client {}",
                    project.id, client_id
                )));
            }
        }
        validate_project(project)?;
    }

    validate_rate_cards(rate_cards)?;
    for entry in rate_cards {
        if let Some(project_id) = entry.scope.project_id() {
            if !project_ids.contains(&project_id) {
                return Err(ValidationError::new(format!(
                    "rate card for level '{}' references unknown project {}",
                    entry.level, project_id
                )));
            }
        }
    }
    Ok(())
}
