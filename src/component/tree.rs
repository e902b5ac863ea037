//! Validated, immutable component tree for one analysis

use rustc_hash::FxHashMap;
use tracing::debug;

use super::{Component, ComponentType, FileAttributes};
use crate::error::{ComputeError, Result};

#[derive(Debug)]
struct IndexEntry {
    component_type: ComponentType,
    /// Child positions from the root down to the component
    path: Box<[usize]>,
}

/// Owns the root component and indexes every node by ref
#[derive(Debug)]
pub struct TreeRootHolder {
    root: Component,
    index: FxHashMap<u32, IndexEntry>,
}

impl TreeRootHolder {
    /// Validate the tree and index it
    ///
    /// Fails on duplicate refs, leaves with children, file attributes outside
    /// of `FILE` components and trees mixing report and views types. A `FILE`
    /// without attributes gets the default ones.
    pub fn new(mut root: Component) -> Result<Self> {
        fill_file_attributes(&mut root);
        let mut index = FxHashMap::default();
        let root_is_report = root.component_type().is_report_type();

        let mut stack: Vec<(&Component, Vec<usize>)> = vec![(&root, Vec::new())];
        while let Some((component, path)) = stack.pop() {
            let reference = component.reference();
            let component_type = component.component_type();

            if component_type.is_report_type() != root_is_report {
                let (report, views) = if root_is_report {
                    (root.reference(), reference)
                } else {
                    (reference, root.reference())
                };
                return Err(ComputeError::MixedTree { report, views });
            }
            if component_type.is_leaf() && !component.children().is_empty() {
                return Err(ComputeError::InvalidComponent {
                    reference,
                    reason: format!("{} components can not have children", component_type),
                });
            }
            if component.file_attributes().is_some() && component_type != ComponentType::File {
                return Err(ComputeError::InvalidComponent {
                    reference,
                    reason: "file attributes are set on FILE components only".to_string(),
                });
            }
            for (position, child) in component.children().iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(position);
                stack.push((child, child_path));
            }
            let entry = IndexEntry {
                component_type,
                path: path.into_boxed_slice(),
            };
            if index.insert(reference, entry).is_some() {
                return Err(ComputeError::DuplicateComponentRef(reference));
            }
        }

        debug!("Component tree rooted at {} holds {} components", root, index.len());
        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Component {
        &self.root
    }

    /// True when the tree is a views tree
    pub fn is_views(&self) -> bool {
        self.root.component_type().is_views_type()
    }

    pub fn contains(&self, reference: u32) -> bool {
        self.index.contains_key(&reference)
    }

    pub fn component_type(&self, reference: u32) -> Option<ComponentType> {
        self.index.get(&reference).map(|e| e.component_type)
    }

    /// Refs of all components in the tree
    pub fn refs(&self) -> impl Iterator<Item = u32> + '_ {
        self.index.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Look a component up by ref
    pub fn get_by_ref(&self, reference: u32) -> Result<&Component> {
        let entry = self
            .index
            .get(&reference)
            .ok_or(ComputeError::UnknownComponent(reference))?;
        entry
            .path
            .iter()
            .try_fold(&self.root, |component, &position| component.children.get(position))
            .ok_or(ComputeError::UnknownComponent(reference))
    }
}

fn fill_file_attributes(root: &mut Component) {
    let mut stack = vec![root];
    while let Some(component) = stack.pop() {
        if component.component_type == ComponentType::File && component.file_attributes.is_none() {
            component.file_attributes = Some(FileAttributes::default());
        }
        stack.extend(component.children.iter_mut());
    }
}
