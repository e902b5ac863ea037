//! Component tree model
//!
//! A component is one node of the analyzed code structure. Two tree families
//! exist and are never mixed within one analysis:
//!
//! ```text
//! report:  PROJECT -> MODULE -> DIRECTORY -> FILE
//! views:   VIEW -> SUBVIEW -> PROJECT_VIEW
//! ```
//!
//! Only `FILE` and `PROJECT_VIEW` are leaves. Trees are built once by the
//! upstream decoder and validated by [`TreeRootHolder`].

mod depth;
mod tree;

pub use depth::CrawlerDepthLimit;
pub use tree::TreeRootHolder;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of a component, closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    Project,
    Module,
    Directory,
    File,
    View,
    Subview,
    ProjectView,
}

impl ComponentType {
    /// Types of a regular analysis report tree
    pub fn is_report_type(self) -> bool {
        matches!(
            self,
            Self::Project | Self::Module | Self::Directory | Self::File
        )
    }

    /// Types of a views (portfolio) tree
    pub fn is_views_type(self) -> bool {
        !self.is_report_type()
    }

    pub fn is_leaf(self) -> bool {
        matches!(self, Self::File | Self::ProjectView)
    }

    /// Depth of the type within its own family, root being 0
    pub(crate) fn depth(self) -> u8 {
        match self {
            Self::Project | Self::View => 0,
            Self::Module | Self::Subview => 1,
            Self::Directory | Self::ProjectView => 2,
            Self::File => 3,
        }
    }

    /// Whether `self` sits strictly below `other`. Types of different
    /// families are never comparable.
    pub fn is_deeper_than(self, other: ComponentType) -> bool {
        self.is_report_type() == other.is_report_type() && self.depth() > other.depth()
    }

    pub fn is_higher_than(self, other: ComponentType) -> bool {
        self.is_report_type() == other.is_report_type() && self.depth() < other.depth()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Project => "PROJECT",
            Self::Module => "MODULE",
            Self::Directory => "DIRECTORY",
            Self::File => "FILE",
            Self::View => "VIEW",
            Self::Subview => "SUBVIEW",
            Self::ProjectView => "PROJECT_VIEW",
        };
        write!(f, "{}", s)
    }
}

/// Attributes carried by `FILE` components only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
    #[serde(default)]
    pub unit_test: bool,
    #[serde(default)]
    pub language: Option<String>,
}

impl FileAttributes {
    pub fn new(unit_test: bool, language: Option<&str>) -> Self {
        Self {
            unit_test,
            language: language.map(str::to_string),
        }
    }

    pub fn unit_test() -> Self {
        Self::new(true, None)
    }
}

/// A node of the component tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    component_type: ComponentType,
    #[serde(rename = "ref")]
    reference: u32,
    uuid: String,
    key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_attributes: Option<FileAttributes>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Component>,
}

impl Component {
    pub fn builder(component_type: ComponentType, reference: u32) -> ComponentBuilder {
        ComponentBuilder::new(component_type, reference)
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    /// Ref of the component, stable within one analysis
    pub fn reference(&self) -> u32 {
        self.reference
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn children(&self) -> &[Component] {
        &self.children
    }

    /// File attributes, `Some` for `FILE` components only
    pub fn file_attributes(&self) -> Option<&FileAttributes> {
        self.file_attributes.as_ref()
    }

    /// True for a `FILE` flagged as unit test
    pub fn is_unit_test(&self) -> bool {
        self.file_attributes.as_ref().is_some_and(|a| a.unit_test)
    }

    /// Depth-first iterator over this component and all its descendants
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[ref={}, key={}]",
            self.component_type, self.reference, self.key
        )
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Component>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Component;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

/// Builder for [`Component`]
///
/// Defaults: uuid `uuid_<ref>`, key `<ref>`, and for `FILE` components
/// attributes `{ unit_test: false, language: None }`.
#[derive(Debug, Clone)]
pub struct ComponentBuilder {
    component_type: ComponentType,
    reference: u32,
    uuid: Option<String>,
    key: Option<String>,
    file_attributes: Option<FileAttributes>,
    children: Vec<Component>,
}

impl ComponentBuilder {
    fn new(component_type: ComponentType, reference: u32) -> Self {
        Self {
            component_type,
            reference,
            uuid: None,
            key: None,
            file_attributes: None,
            children: Vec::new(),
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_file_attributes(mut self, attributes: FileAttributes) -> Self {
        self.file_attributes = Some(attributes);
        self
    }

    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Component>) -> Self {
        self.children.extend(children);
        self
    }

    /// Build the component. Structural invariants are checked by
    /// [`TreeRootHolder::new`] once the whole tree is assembled.
    pub fn build(self) -> Component {
        let file_attributes = match (self.component_type, self.file_attributes) {
            (ComponentType::File, None) => Some(FileAttributes::default()),
            (_, attributes) => attributes,
        };
        Component {
            component_type: self.component_type,
            reference: self.reference,
            uuid: self
                .uuid
                .unwrap_or_else(|| format!("uuid_{}", self.reference)),
            key: self.key.unwrap_or_else(|| self.reference.to_string()),
            file_attributes,
            children: self.children,
        }
    }
}
