use crate::allocation::{AllocatedResource, ResourceRequirement};
use crate::calculations::{
    LevelStaffing, OpenPosition, find_open_positions, reconciliation::validate_budget,
    staffing_balance,
};
use crate::engine::{self, ProjectBudgetReport};
use crate::error::{CostError, CostResult};
use crate::level::ResourceLevel;
use crate::project::{Client, Project};
use crate::rate_card::{RateBook, RateCardEntry, RateScope};
use crate::requests::{
    NewAllocationRequest, NewClientRequest, NewProjectRequest, NewRateCardRequest,
    NewRequirementRequest,
};
use crate::validation::{self, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("client {0} not found")]
    ClientNotFound(u32),
    #[error("project {0} not found")]
    ProjectNotFound(u32),
    #[error("'{resource_id}' is already allocated to project {project_id}")]
    DuplicateAllocation { project_id: u32, resource_id: String },
    #[error("no {0} ids left to assign")]
    IdsExhausted(&'static str),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Cost(#[from] CostError),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;

/// Highest ids ever handed out. Ids are never reused, even after a delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedIds {
    #[serde(default)]
    pub last_client_id: u32,
    #[serde(default)]
    pub last_project_id: u32,
}

/// Clients, projects and rate cards held by one application instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    clients: Vec<Client>,
    projects: Vec<Project>,
    rate_cards: Vec<RateCardEntry>,
    issued: IssuedIds,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a portfolio from stored records, rejecting inconsistent sets.
    pub fn from_parts(
        clients: Vec<Client>,
        projects: Vec<Project>,
        rate_cards: Vec<RateCardEntry>,
    ) -> Result<Self, ValidationError> {
        validation::validate_records(&clients, &projects, &rate_cards)?;
        let issued = IssuedIds {
            last_client_id: clients.iter().map(|c| c.id).max().unwrap_or(0),
            last_project_id: projects.iter().map(|p| p.id).max().unwrap_or(0),
        };
        Ok(Self {
            clients,
            projects,
            rate_cards,
            issued,
        })
    }

    /// Restores the id high-water marks saved with a snapshot. Marks below an
    /// id already present are ignored.
    pub fn with_issued_ids(mut self, issued: IssuedIds) -> Self {
        self.issued.last_client_id = self.issued.last_client_id.max(issued.last_client_id);
        self.issued.last_project_id = self.issued.last_project_id.max(issued.last_project_id);
        self
    }

    pub fn issued_ids(&self) -> IssuedIds {
        self.issued
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn rate_cards(&self) -> &[RateCardEntry] {
        &self.rate_cards
    }

    pub fn find_client(&self, client_id: u32) -> Option<&Client> {
        self.clients.iter().find(|client| client.id == client_id)
    }

    pub fn find_project(&self, project_id: u32) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == project_id)
    }

    fn project(&self, project_id: u32) -> PortfolioResult<&Project> {
        self.find_project(project_id)
            .ok_or(PortfolioError::ProjectNotFound(project_id))
    }

    fn project_mut(&mut self, project_id: u32) -> PortfolioResult<&mut Project> {
        self.projects
            .iter_mut()
            .find(|project| project.id == project_id)
            .ok_or(PortfolioError::ProjectNotFound(project_id))
    }

    fn next_client_id(&self) -> PortfolioResult<u32> {
        self.issued
            .last_client_id
            .checked_add(1)
            .ok_or(PortfolioError::IdsExhausted("client"))
    }

    fn next_project_id(&self) -> PortfolioResult<u32> {
        self.issued
            .last_project_id
            .checked_add(1)
            .ok_or(PortfolioError::IdsExhausted("project"))
    }

    pub fn create_client(&mut self, request: NewClientRequest) -> PortfolioResult<Client> {
        let client = request.into_client(self.next_client_id()?)?;
        info!(client_id = client.id, name = %client.name, "client created");
        self.issued.last_client_id = client.id;
        self.clients.push(client.clone());
        Ok(client)
    }

    pub fn create_project(&mut self, request: NewProjectRequest) -> PortfolioResult<Project> {
        if let Some(client_id) = request.client_id {
            if self.find_client(client_id).is_none() {
                return Err(PortfolioError::ClientNotFound(client_id));
            }
        }
        let project = request.into_project(self.next_project_id()?)?;
        info!(project_id = project.id, name = %project.name, "project created");
        self.issued.last_project_id = project.id;
        self.projects.push(project.clone());
        Ok(project)
    }

    pub fn update_quoted_budget(
        &mut self,
        project_id: u32,
        quoted_budget: f64,
    ) -> PortfolioResult<()> {
        validate_budget(quoted_budget)?;
        self.project_mut(project_id)?.quoted_budget = quoted_budget;
        Ok(())
    }

    /// Removes a project together with its project-scoped rate cards.
    pub fn delete_project(&mut self, project_id: u32) -> bool {
        let before = self.projects.len();
        self.projects.retain(|project| project.id != project_id);
        if self.projects.len() == before {
            return false;
        }
        self.rate_cards
            .retain(|entry| entry.scope != RateScope::Project(project_id));
        info!(project_id, "project deleted");
        true
    }

    /// Inserts a rate card entry, replacing any entry with the same scope and level.
    pub fn upsert_rate_card(
        &mut self,
        request: NewRateCardRequest,
    ) -> PortfolioResult<RateCardEntry> {
        let entry = request.into_entry()?;
        if let Some(project_id) = entry.scope.project_id() {
            self.project(project_id)?;
        }
        match self
            .rate_cards
            .iter_mut()
            .find(|existing| existing.scope == entry.scope && existing.level == entry.level)
        {
            Some(existing) => existing.rate = entry.rate,
            None => self.rate_cards.push(entry.clone()),
        }
        Ok(entry)
    }

    pub fn remove_rate_card(&mut self, scope: RateScope, level: &ResourceLevel) -> bool {
        let before = self.rate_cards.len();
        self.rate_cards
            .retain(|entry| !(entry.scope == scope && &entry.level == level));
        self.rate_cards.len() != before
    }

    pub fn allocate(
        &mut self,
        project_id: u32,
        request: NewAllocationRequest,
    ) -> PortfolioResult<AllocatedResource> {
        let allocation = request.into_allocation()?;
        let project = self.project_mut(project_id)?;
        if project.find_allocation(&allocation.resource_id).is_some() {
            return Err(PortfolioError::DuplicateAllocation {
                project_id,
                resource_id: allocation.resource_id,
            });
        }
        project.allocations.push(allocation.clone());
        Ok(allocation)
    }

    pub fn release_allocation(
        &mut self,
        project_id: u32,
        resource_id: &str,
    ) -> PortfolioResult<bool> {
        let project = self.project_mut(project_id)?;
        let before = project.allocations.len();
        project
            .allocations
            .retain(|allocation| allocation.resource_id != resource_id);
        Ok(project.allocations.len() != before)
    }

    /// Adds headcount at a level; a second request for the same level raises
    /// the existing quantity.
    pub fn add_requirement(
        &mut self,
        project_id: u32,
        request: NewRequirementRequest,
    ) -> PortfolioResult<ResourceRequirement> {
        let requirement = request.into_requirement()?;
        let project = self.project_mut(project_id)?;
        let merged = match project
            .requirements
            .iter_mut()
            .find(|existing| existing.level == requirement.level)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(requirement.quantity);
                existing.clone()
            }
            None => {
                project.requirements.push(requirement.clone());
                requirement
            }
        };
        Ok(merged)
    }

    pub fn rate_book(&self, project_id: u32) -> RateBook {
        RateBook::for_project(project_id, &self.rate_cards)
    }

    pub fn budget_report(
        &self,
        project_id: u32,
        reference_date: NaiveDate,
    ) -> PortfolioResult<ProjectBudgetReport> {
        let project = self.project(project_id)?;
        let report =
            engine::reconcile_project(project, &self.rate_book(project_id), reference_date)?;
        Ok(report)
    }

    pub fn open_positions(&self, project_id: u32) -> PortfolioResult<Vec<OpenPosition>> {
        let project = self.project(project_id)?;
        Ok(find_open_positions(&project.requirements, &project.allocations))
    }

    pub fn staffing(&self, project_id: u32) -> PortfolioResult<Vec<LevelStaffing>> {
        let project = self.project(project_id)?;
        Ok(staffing_balance(&project.requirements, &project.allocations))
    }

    pub fn portfolio_reports(
        &self,
        reference_date: NaiveDate,
    ) -> Vec<(u32, CostResult<ProjectBudgetReport>)> {
        engine::reconcile_portfolio(&self.projects, &self.rate_cards, reference_date)
    }
}
