// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Federation class model and descriptor loading.
//!
//! A descriptor lists the object classes, interaction classes and routing
//! spaces of a federation:
//!
//! ```json
//! {
//!   "objects": [
//!     { "name": "Vehicle", "attributes": ["position", "speed"] },
//!     { "name": "Car", "parent": "Vehicle", "attributes": ["doors"] }
//!   ],
//!   "interactions": [ { "name": "Honk", "parameters": ["volume"] } ],
//!   "spaces": [ { "name": "Geo", "dimensions": ["x", "y"] } ]
//! }
//! ```
//!
//! Handles are allocated from 1 in document order, one sequence per
//! namespace. A subclass inherits its parent's attributes with the parent's
//! handles; the parent must appear first.

use fedrti::{
    AttributeHandle, Exception, InteractionClassHandle, ObjectClassHandle, ParameterHandle,
    SpaceHandle,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("descriptor {0} not found")]
    NotFound(String),

    #[error("descriptor {descriptor}: {reason}")]
    Malformed { descriptor: String, reason: String },
}

impl ModelError {
    /// Exception reported to the federate that asked for the federation.
    pub fn exception(&self) -> Exception {
        match self {
            ModelError::NotFound(_) => Exception::CouldNotOpenFed,
            ModelError::Malformed { .. } => Exception::ErrorReadingFed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    objects: Vec<ObjectClassEntry>,
    #[serde(default)]
    interactions: Vec<InteractionEntry>,
    #[serde(default)]
    spaces: Vec<SpaceEntry>,
}

#[derive(Debug, Deserialize)]
struct ObjectClassEntry {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    attributes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct InteractionEntry {
    name: String,
    #[serde(default)]
    parameters: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SpaceEntry {
    name: String,
    #[serde(default)]
    dimensions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectClass {
    pub handle: ObjectClassHandle,
    pub name: String,
    pub parent: Option<ObjectClassHandle>,
    /// Inherited attributes first.
    pub attributes: Vec<(AttributeHandle, String)>,
}

impl ObjectClass {
    pub fn attribute_handles(&self) -> Vec<AttributeHandle> {
        self.attributes.iter().map(|(handle, _)| *handle).collect()
    }

    pub fn defines(&self, attribute: AttributeHandle) -> bool {
        self.attributes.iter().any(|(handle, _)| *handle == attribute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionClass {
    pub handle: InteractionClassHandle,
    pub name: String,
    pub parameters: Vec<(ParameterHandle, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingSpace {
    pub handle: SpaceHandle,
    pub name: String,
    pub dimensions: Vec<String>,
}

/// Object, interaction and space definitions of one federation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassModel {
    objects: BTreeMap<ObjectClassHandle, ObjectClass>,
    interactions: BTreeMap<InteractionClassHandle, InteractionClass>,
    spaces: BTreeMap<SpaceHandle, RoutingSpace>,
}

impl ClassModel {
    /// Parse a JSON descriptor. `descriptor` only names it in errors.
    pub fn from_json(descriptor: &str, json: &str) -> Result<Self, ModelError> {
        let malformed = |reason: String| ModelError::Malformed {
            descriptor: descriptor.to_string(),
            reason,
        };
        let document: Document = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;

        let mut model = ClassModel::default();
        let mut by_name: HashMap<String, ObjectClassHandle> = HashMap::new();
        let mut next_attribute = 1u32;
        for (index, entry) in document.objects.into_iter().enumerate() {
            let handle = ObjectClassHandle(index as u32 + 1);
            if by_name.contains_key(&entry.name) {
                return Err(malformed(format!("duplicate object class {}", entry.name)));
            }
            let (parent, mut attributes) = match &entry.parent {
                Some(parent) => {
                    let parent = by_name
                        .get(parent)
                        .copied()
                        .ok_or_else(|| malformed(format!("unknown parent class {}", parent)))?;
                    let inherited = model
                        .objects
                        .get(&parent)
                        .map(|class| class.attributes.clone())
                        .unwrap_or_default();
                    (Some(parent), inherited)
                }
                None => (None, Vec::new()),
            };
            for name in entry.attributes {
                attributes.push((AttributeHandle(next_attribute), name));
                next_attribute += 1;
            }
            by_name.insert(entry.name.clone(), handle);
            model.objects.insert(
                handle,
                ObjectClass {
                    handle,
                    name: entry.name,
                    parent,
                    attributes,
                },
            );
        }

        let mut next_parameter = 1u32;
        for (index, entry) in document.interactions.into_iter().enumerate() {
            let handle = InteractionClassHandle(index as u32 + 1);
            let parameters = entry
                .parameters
                .into_iter()
                .map(|name| {
                    let handle = ParameterHandle(next_parameter);
                    next_parameter += 1;
                    (handle, name)
                })
                .collect();
            model.interactions.insert(
                handle,
                InteractionClass {
                    handle,
                    name: entry.name,
                    parameters,
                },
            );
        }

        for (index, entry) in document.spaces.into_iter().enumerate() {
            if entry.dimensions.is_empty() {
                return Err(malformed(format!("space {} has no dimension", entry.name)));
            }
            let handle = SpaceHandle(index as u32 + 1);
            model.spaces.insert(
                handle,
                RoutingSpace {
                    handle,
                    name: entry.name,
                    dimensions: entry.dimensions,
                },
            );
        }
        Ok(model)
    }

    pub fn object_class(&self, class: ObjectClassHandle) -> Result<&ObjectClass, Exception> {
        self.objects
            .get(&class)
            .ok_or(Exception::ObjectClassNotDefined)
    }

    pub fn object_class_by_name(&self, name: &str) -> Option<&ObjectClass> {
        self.objects.values().find(|class| class.name == name)
    }

    /// Fail unless `class` is defined and defines every attribute.
    pub fn check_attributes(
        &self,
        class: ObjectClassHandle,
        attributes: &[AttributeHandle],
    ) -> Result<&ObjectClass, Exception> {
        let definition = self.object_class(class)?;
        if attributes.iter().all(|a| definition.defines(*a)) {
            Ok(definition)
        } else {
            Err(Exception::AttributeNotDefined)
        }
    }

    pub fn interaction_class(
        &self,
        class: InteractionClassHandle,
    ) -> Result<&InteractionClass, Exception> {
        self.interactions
            .get(&class)
            .ok_or(Exception::InteractionClassNotDefined)
    }

    pub fn interaction_class_by_name(&self, name: &str) -> Option<&InteractionClass> {
        self.interactions.values().find(|class| class.name == name)
    }

    pub fn check_parameters(
        &self,
        class: InteractionClassHandle,
        parameters: &[ParameterHandle],
    ) -> Result<(), Exception> {
        let definition = self.interaction_class(class)?;
        let defined = parameters
            .iter()
            .all(|p| definition.parameters.iter().any(|(handle, _)| handle == p));
        if defined {
            Ok(())
        } else {
            Err(Exception::InteractionParameterNotDefined)
        }
    }

    /// Dimension count of a routing space.
    pub fn space_dimensions(&self, space: SpaceHandle) -> Result<usize, Exception> {
        self.spaces
            .get(&space)
            .map(|s| s.dimensions.len())
            .ok_or(Exception::SpaceNotDefined)
    }

    pub fn space_by_name(&self, name: &str) -> Option<&RoutingSpace> {
        self.spaces.values().find(|space| space.name == name)
    }
}

/// Resolves a descriptor identifier into a class model at create time.
pub trait DescriptorLoader: Send + Sync {
    fn load(&self, descriptor: &str) -> Result<ClassModel, ModelError>;
}

/// Reads JSON descriptors from disk.
///
/// An absolute identifier is read as is; a relative one is tried as given,
/// then under each search directory in order.
#[derive(Debug, Clone, Default)]
pub struct JsonDescriptorLoader {
    search_paths: Vec<PathBuf>,
}

impl JsonDescriptorLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    fn resolve(&self, descriptor: &str) -> Option<PathBuf> {
        let path = Path::new(descriptor);
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        if path.is_absolute() {
            return None;
        }
        self.search_paths
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
    }
}

impl DescriptorLoader for JsonDescriptorLoader {
    fn load(&self, descriptor: &str) -> Result<ClassModel, ModelError> {
        let path = self
            .resolve(descriptor)
            .ok_or_else(|| ModelError::NotFound(descriptor.to_string()))?;
        let json = std::fs::read_to_string(&path)
            .map_err(|_| ModelError::NotFound(descriptor.to_string()))?;
        tracing::debug!("Loading descriptor {}", path.display());
        ClassModel::from_json(descriptor, &json)
    }
}

/// Descriptors registered in memory by name. Used by tests and embedders.
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, descriptor: &str, json: &str) -> Self {
        self.insert(descriptor, json);
        self
    }

    pub fn insert(&self, descriptor: &str, json: &str) {
        if let Ok(mut documents) = self.documents.write() {
            documents.insert(descriptor.to_string(), json.to_string());
        }
    }
}

impl DescriptorLoader for InMemoryLoader {
    fn load(&self, descriptor: &str) -> Result<ClassModel, ModelError> {
        let json = self
            .documents
            .read()
            .ok()
            .and_then(|documents| documents.get(descriptor).cloned())
            .ok_or_else(|| ModelError::NotFound(descriptor.to_string()))?;
        ClassModel::from_json(descriptor, &json)
    }
}
