// Class graph and inheritance resolution over every parsed entity.

use std::collections::{BTreeMap, BTreeSet};

use mundi_reflect_markers::{ACTOR_ROOT, COMPONENT_ROOT};
use serde::Serialize;

use crate::model::ClassEntity;

/// How a class is registered with the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassRole {
    None,
    /// Placeable world entity.
    Spawnable,
    /// Attachable to an entity.
    Component,
}

impl ClassRole {
    /// Marker macro emitted inside the property block, if any.
    pub fn mark_macro(self) -> Option<&'static str> {
        match self {
            ClassRole::None => None,
            ClassRole::Spawnable => Some("MARK_AS_SPAWNABLE"),
            ClassRole::Component => Some("MARK_AS_COMPONENT"),
        }
    }
}

/// All entities of a run, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ClassGraph {
    classes: BTreeMap<String, ClassEntity>,
}

impl ClassGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, returning the one it replaced under the same name.
    pub fn insert(&mut self, entity: ClassEntity) -> Option<ClassEntity> {
        self.classes.insert(entity.name.clone(), entity)
    }

    pub fn get(&self, name: &str) -> Option<&ClassEntity> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Entities in name order.
    pub fn entities(&self) -> impl Iterator<Item = &ClassEntity> {
        self.classes.values()
    }

    /// True when `class_name` is `base_name` or reaches it through parent links.
    ///
    /// A parent missing from the graph ends the walk; it only matches when it
    /// is `base_name` itself. A parent cycle ends the walk with `false`.
    pub fn is_derived_from(&self, class_name: &str, base_name: &str) -> bool {
        if class_name == base_name {
            return true;
        }
        let Some(mut current) = self.classes.get(class_name) else {
            return false;
        };
        let mut visited = BTreeSet::from([class_name]);
        loop {
            let parent = current.parent_name.as_str();
            if parent.is_empty() {
                return false;
            }
            if parent == base_name {
                return true;
            }
            if !visited.insert(parent) {
                return false;
            }
            match self.classes.get(parent) {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    /// Editor role of `entity`. Abstract and not-spawnable classes and the two
    /// roots themselves have no role.
    pub fn classification(&self, entity: &ClassEntity) -> ClassRole {
        if entity.is_abstract || entity.is_not_spawnable {
            return ClassRole::None;
        }
        if entity.name == ACTOR_ROOT || entity.name == COMPONENT_ROOT {
            return ClassRole::None;
        }
        if self.is_derived_from(&entity.name, ACTOR_ROOT) {
            ClassRole::Spawnable
        } else if self.is_derived_from(&entity.name, COMPONENT_ROOT) {
            ClassRole::Component
        } else {
            ClassRole::None
        }
    }

    /// Role of every entity, keyed by name.
    pub fn resolve_roles(&self) -> BTreeMap<String, ClassRole> {
        self.classes
            .values()
            .map(|entity| (entity.name.clone(), self.classification(entity)))
            .collect()
    }
}

impl FromIterator<ClassEntity> for ClassGraph {
    fn from_iter<I: IntoIterator<Item = ClassEntity>>(iter: I) -> Self {
        let mut graph = ClassGraph::new();
        for entity in iter {
            graph.insert(entity);
        }
        graph
    }
}
