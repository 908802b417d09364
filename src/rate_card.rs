use crate::level::ResourceLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where a rate card entry applies. Serialized as an optional project id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum RateScope {
    Project(u32),
    #[default]
    Global,
}

impl RateScope {
    pub fn is_global(&self) -> bool {
        matches!(self, RateScope::Global)
    }

    pub fn project_id(&self) -> Option<u32> {
        match self {
            RateScope::Project(id) => Some(*id),
            RateScope::Global => None,
        }
    }
}

impl From<Option<u32>> for RateScope {
    fn from(value: Option<u32>) -> Self {
        value.map(RateScope::Project).unwrap_or(RateScope::Global)
    }
}

impl From<RateScope> for Option<u32> {
    fn from(value: RateScope) -> Self {
        value.project_id()
    }
}

impl fmt::Display for RateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateScope::Project(id) => write!(f, "project {id}"),
            RateScope::Global => f.write_str("global"),
        }
    }
}

/// A per-working-day rate for one level, scoped to a project or global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCardEntry {
    pub level: ResourceLevel,
    /// Currency units per working day. Non-negative and finite.
    pub rate: f64,
    #[serde(
        rename = "project_id",
        default,
        skip_serializing_if = "RateScope::is_global"
    )]
    pub scope: RateScope,
}

impl RateCardEntry {
    pub fn global(level: impl Into<ResourceLevel>, rate: f64) -> Self {
        Self {
            level: level.into(),
            rate,
            scope: RateScope::Global,
        }
    }

    pub fn for_project(project_id: u32, level: impl Into<ResourceLevel>, rate: f64) -> Self {
        Self {
            level: level.into(),
            rate,
            scope: RateScope::Project(project_id),
        }
    }
}

/// Level -> rate mapping for a single scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: HashMap<ResourceLevel, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, level: impl Into<ResourceLevel>, rate: f64) -> Option<f64> {
        self.rates.insert(level.into(), rate)
    }

    pub fn get(&self, level: &ResourceLevel) -> Option<f64> {
        self.rates.get(level).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResourceLevel, f64)> {
        self.rates.iter().map(|(level, rate)| (level, *rate))
    }
}

impl<L: Into<ResourceLevel>> FromIterator<(L, f64)> for RateTable {
    fn from_iter<T: IntoIterator<Item = (L, f64)>>(iter: T) -> Self {
        let rates = iter
            .into_iter()
            .map(|(level, rate)| (level.into(), rate))
            .collect();
        Self { rates }
    }
}

/// The two rate tables that apply to one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateBook {
    pub project: RateTable,
    pub global: RateTable,
}

impl RateBook {
    /// Picks out the entries visible to `project_id`. Entries scoped to other
    /// projects are ignored; a later entry for the same scope and level wins.
    pub fn for_project<'a, I>(project_id: u32, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a RateCardEntry>,
    {
        let mut book = Self::default();
        for entry in entries {
            match entry.scope {
                RateScope::Project(id) if id == project_id => {
                    book.project.insert(entry.level.clone(), entry.rate);
                }
                RateScope::Project(_) => {}
                RateScope::Global => {
                    book.global.insert(entry.level.clone(), entry.rate);
                }
            }
        }
        book
    }

    pub fn resolve(&self, level: &ResourceLevel) -> f64 {
        resolve_rate(level, &self.project, &self.global)
    }
}

/// Effective daily rate for `level`: the project rate if one exists, else the
/// global rate, else zero. An unrateable level is costed at zero rather than
/// rejected.
pub fn resolve_rate(
    level: &ResourceLevel,
    project_rates: &RateTable,
    global_rates: &RateTable,
) -> f64 {
    project_rates
        .get(level)
        .or_else(|| global_rates.get(level))
        .unwrap_or(0.0)
}
