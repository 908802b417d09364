use crate::allocation::{AllocatedResource, ResourceRequirement};
use crate::level::ResourceLevel;
use serde::{Deserialize, Serialize};

/// A requirement that current allocations do not cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub level: ResourceLevel,
    pub required: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffingState {
    Understaffed,
    Staffed,
    Overstaffed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStaffing {
    pub level: ResourceLevel,
    pub required: u32,
    pub allocated: u32,
    pub state: StaffingState,
}

fn allocated_at(level: &ResourceLevel, allocations: &[AllocatedResource]) -> u32 {
    let count = allocations.iter().filter(|a| &a.level == level).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Requirements still short of headcount, in requirement order. Fully and
/// over-staffed levels are omitted.
pub fn find_open_positions(
    requirements: &[ResourceRequirement],
    allocations: &[AllocatedResource],
) -> Vec<OpenPosition> {
    requirements
        .iter()
        .filter_map(|requirement| {
            let allocated = allocated_at(&requirement.level, allocations);
            let remaining = requirement.quantity.saturating_sub(allocated);
            (remaining > 0).then(|| OpenPosition {
                level: requirement.level.clone(),
                required: requirement.quantity,
                remaining,
            })
        })
        .collect()
}

/// Required versus allocated headcount for every level that appears in either
/// list. Required levels come first in requirement order, followed by levels
/// that are only allocated.
pub fn staffing_balance(
    requirements: &[ResourceRequirement],
    allocations: &[AllocatedResource],
) -> Vec<LevelStaffing> {
    let mut levels: Vec<(ResourceLevel, u32)> = Vec::new();
    for requirement in requirements {
        match levels.iter_mut().find(|(level, _)| level == &requirement.level) {
            Some((_, required)) => *required = required.saturating_add(requirement.quantity),
            None => levels.push((requirement.level.clone(), requirement.quantity)),
        }
    }
    for allocation in allocations {
        if !levels.iter().any(|(level, _)| level == &allocation.level) {
            levels.push((allocation.level.clone(), 0));
        }
    }

    levels
        .into_iter()
        .map(|(level, required)| {
            let allocated = allocated_at(&level, allocations);
            let state = match allocated.cmp(&required) {
                std::cmp::Ordering::Less => StaffingState::Understaffed,
                std::cmp::Ordering::Equal => StaffingState::Staffed,
                std::cmp::Ordering::Greater => StaffingState::Overstaffed,
            };
            LevelStaffing {
                level,
                required,
                allocated,
                state,
            }
        })
        .collect()
}
