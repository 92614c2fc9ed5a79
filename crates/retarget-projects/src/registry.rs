//! Project registry
//!
//! The registry is the only state shared between a migration worker and
//! whoever drives it. Every operation takes the lock for the duration of an
//! in-memory copy or swap and never across I/O. Readers get owned clones, so
//! a snapshot can never observe a half-updated project.

use crate::error::Error;
use crate::solution::is_rooted;
use crate::types::{DescriptorComparison, FrameworkDescriptor, MigrationState, ProjectModel};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Insertion-ordered map from project path to project state
#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: Mutex<IndexMap<Utf8PathBuf, ProjectModel>>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owned copy of every project, in registry order
    pub fn snapshot(&self) -> Vec<ProjectModel> {
        self.projects.lock().values().cloned().collect()
    }

    /// Projects that a migration batch would process, in registry order
    pub fn eligible(&self) -> Vec<ProjectModel> {
        self.projects
            .lock()
            .values()
            .filter(|p| p.is_eligible())
            .cloned()
            .collect()
    }

    pub fn get(&self, path: &Utf8Path) -> Option<ProjectModel> {
        self.projects.lock().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.projects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.lock().is_empty()
    }

    /// Swap in a fresh set of projects
    ///
    /// A path seen twice keeps its first position and its last value. Entries
    /// whose path is not rooted are dropped.
    pub fn replace_all(&self, models: impl IntoIterator<Item = ProjectModel>) {
        let mut fresh = IndexMap::new();
        for model in models {
            if !is_rooted(model.path.as_str()) {
                tracing::warn!(project = %model.path, "skipping project with a relative path");
                continue;
            }
            fresh.insert(model.path.clone(), model);
        }
        tracing::debug!(count = fresh.len(), "registry replaced");
        *self.projects.lock() = fresh;
    }

    /// Merge a project by path
    ///
    /// An existing entry keeps its position, name and handle and takes the
    /// framework, selection and state of `model`. Returns true when `model`
    /// was new and appended.
    pub fn upsert(&self, model: ProjectModel) -> Result<bool, Error> {
        if !is_rooted(model.path.as_str()) {
            return Err(Error::invalid_path(model.path.as_str()));
        }
        let mut projects = self.projects.lock();
        match projects.get_mut(&model.path) {
            Some(existing) => {
                let mut merged = existing.clone();
                merged.framework = model.framework;
                merged.selected = model.selected;
                merged.state = model.state;
                *existing = merged;
                Ok(false)
            }
            None => {
                projects.insert(model.path.clone(), model);
                Ok(true)
            }
        }
    }

    /// Apply `f` to a copy of the entry and swap the copy in
    ///
    /// Returns the updated project, or `None` when the path is unknown.
    pub fn update<F>(&self, path: &Utf8Path, f: F) -> Option<ProjectModel>
    where
        F: FnOnce(&mut ProjectModel),
    {
        let mut projects = self.projects.lock();
        let entry = projects.get_mut(path)?;
        let mut next = entry.clone();
        f(&mut next);
        next.path = entry.path.clone();
        *entry = next.clone();
        Some(next)
    }

    pub fn set_selected(&self, path: &Utf8Path, selected: bool) -> bool {
        self.update(path, |p| p.selected = selected).is_some()
    }

    pub fn select_all(&self) {
        self.set_all_selected(true);
    }

    pub fn select_none(&self) {
        self.set_all_selected(false);
    }

    fn set_all_selected(&self, selected: bool) {
        for project in self.projects.lock().values_mut() {
            project.selected = selected;
        }
    }

    /// Select every project whose name (case-insensitive) or path equals one of `keys`
    ///
    /// Selection of other projects is left alone. Returns how many matched.
    pub fn select_matching<S: AsRef<str>>(&self, keys: &[S]) -> usize {
        let mut matched = 0;
        for project in self.projects.lock().values_mut() {
            let hit = keys.iter().any(|k| {
                let k = k.as_ref();
                project.name.eq_ignore_ascii_case(k) || project.path.as_str() == k
            });
            if hit {
                project.selected = true;
                matched += 1;
            }
        }
        matched
    }

    /// Re-seed migration states against a newly chosen target
    ///
    /// Projects without a framework are skipped and selection is untouched.
    /// Returns how many projects now match the target.
    pub fn reconcile(
        &self,
        target: &FrameworkDescriptor,
        comparison: DescriptorComparison,
    ) -> usize {
        let mut matching = 0;
        for project in self.projects.lock().values_mut() {
            if let Some(current) = &project.framework {
                let matches = comparison.matches(current, target);
                project.state = MigrationState::seeded(matches);
                matching += usize::from(matches);
            }
        }
        matching
    }
}

/// Field used to order or search registry snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    Name,
    Path,
    Framework,
    Selected,
    State,
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "path" => Ok(Self::Path),
            "framework" => Ok(Self::Framework),
            "selected" => Ok(Self::Selected),
            "state" => Ok(Self::State),
            _ => Err(Error::UnknownField {
                field: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort of a snapshot by one field
///
/// Projects without a framework sort before any with one.
pub fn sort_projects(projects: &mut [ProjectModel], field: SortField, direction: SortDirection) {
    projects.sort_by(|a, b| {
        let ordering = compare_field(a, b, field);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn compare_field(a: &ProjectModel, b: &ProjectModel, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Path => a.path.as_str().cmp(b.path.as_str()),
        SortField::Framework => a.framework.cmp(&b.framework),
        SortField::Selected => a.selected.cmp(&b.selected),
        SortField::State => a.state.as_str().cmp(b.state.as_str()),
    }
}

/// First project whose `field` equals `key`
///
/// Frameworks match on name or value; selection matches `true`/`false`.
pub fn find_project<'a>(
    projects: &'a [ProjectModel],
    field: SortField,
    key: &str,
) -> Option<&'a ProjectModel> {
    projects.iter().find(|p| match field {
        SortField::Name => p.name == key,
        SortField::Path => p.path.as_str() == key,
        SortField::Framework => p
            .framework
            .as_ref()
            .is_some_and(|f| f.name == key || f.value == key),
        SortField::Selected => key
            .parse::<bool>()
            .is_ok_and(|selected| p.selected == selected),
        SortField::State => p.state.as_str() == key,
    })
}
