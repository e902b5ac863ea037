use super::{Order, VisitorWrapper};
use crate::component::{Component, ComponentType, CrawlerDepthLimit};
use crate::error::Result;

/// Visitor carrying one stack element per node of the current path
///
/// The crawler calls [`create_element`](Self::create_element) when entering
/// a node, then the visit callbacks with the [`Path`] whose current element is
/// the node's own, and drops the element when leaving the node.
pub trait PathAwareVisitor {
    type Element;

    fn max_depth(&self) -> CrawlerDepthLimit;

    fn order(&self) -> Order;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Stack element of `component`
    fn create_element(&mut self, component: &Component) -> Self::Element;

    fn visit_any(&mut self, _component: &Component, _path: &mut Path<Self::Element>) -> Result<()> {
        Ok(())
    }

    fn visit_project(&mut self, _project: &Component, _path: &mut Path<Self::Element>) -> Result<()> {
        Ok(())
    }

    fn visit_module(&mut self, _module: &Component, _path: &mut Path<Self::Element>) -> Result<()> {
        Ok(())
    }

    fn visit_directory(&mut self, _directory: &Component, _path: &mut Path<Self::Element>) -> Result<()> {
        Ok(())
    }

    fn visit_file(&mut self, _file: &Component, _path: &mut Path<Self::Element>) -> Result<()> {
        Ok(())
    }

    fn visit_view(&mut self, _view: &Component, _path: &mut Path<Self::Element>) -> Result<()> {
        Ok(())
    }

    fn visit_subview(&mut self, _subview: &Component, _path: &mut Path<Self::Element>) -> Result<()> {
        Ok(())
    }

    fn visit_project_view(&mut self, _project_view: &Component, _path: &mut Path<Self::Element>) -> Result<()> {
        Ok(())
    }
}

/// Stack element of one node of the path
#[derive(Debug)]
pub struct PathElement<E> {
    pub component_ref: u32,
    pub component_type: ComponentType,
    pub element: E,
}

/// Elements from the root down to the node being visited
///
/// Never empty while a visitor callback runs.
#[derive(Debug)]
pub struct Path<E> {
    elements: Vec<PathElement<E>>,
}

impl<E> Default for Path<E> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

const EMPTY_PATH: &str = "path is never empty while a component is visited";

impl<E> Path<E> {
    fn push(&mut self, component: &Component, element: E) {
        self.elements.push(PathElement {
            component_ref: component.reference(),
            component_type: component.component_type(),
            element,
        });
    }

    fn pop(&mut self) -> Option<PathElement<E>> {
        self.elements.pop()
    }

    /// Element of the node being visited
    pub fn current(&self) -> &E {
        match self.elements.last() {
            Some(e) => &e.element,
            None => unreachable!("{}", EMPTY_PATH),
        }
    }

    pub fn current_mut(&mut self) -> &mut E {
        match self.elements.last_mut() {
            Some(e) => &mut e.element,
            None => unreachable!("{}", EMPTY_PATH),
        }
    }

    /// Element of the parent node, `None` at the root
    pub fn parent(&self) -> Option<&E> {
        let len = self.elements.len();
        len.checked_sub(2).map(|i| &self.elements[i].element)
    }

    pub fn parent_mut(&mut self) -> Option<&mut E> {
        let len = self.elements.len();
        len.checked_sub(2).map(|i| &mut self.elements[i].element)
    }

    /// Current element and parent element borrowed together
    pub fn current_and_parent_mut(&mut self) -> (&mut E, Option<&mut E>) {
        match self.elements.split_last_mut() {
            Some((current, ancestors)) => (
                &mut current.element,
                ancestors.last_mut().map(|p| &mut p.element),
            ),
            None => unreachable!("{}", EMPTY_PATH),
        }
    }

    pub fn root(&self) -> &E {
        match self.elements.first() {
            Some(e) => &e.element,
            None => unreachable!("{}", EMPTY_PATH),
        }
    }

    pub fn is_root(&self) -> bool {
        self.elements.len() == 1
    }

    /// Number of nodes from the root to the current node
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Path elements from the current node up to the root
    pub fn iter(&self) -> impl Iterator<Item = &PathElement<E>> {
        self.elements.iter().rev()
    }
}

pub(super) struct PathAwareWrapper<'v, V: PathAwareVisitor + ?Sized> {
    visitor: &'v mut V,
    path: Path<V::Element>,
}

impl<'v, V: PathAwareVisitor + ?Sized> PathAwareWrapper<'v, V> {
    pub(super) fn new(visitor: &'v mut V) -> Self {
        Self {
            visitor,
            path: Path::default(),
        }
    }
}

impl<V: PathAwareVisitor + ?Sized> VisitorWrapper for PathAwareWrapper<'_, V> {
    fn name(&self) -> &str {
        self.visitor.name()
    }

    fn max_depth(&self) -> CrawlerDepthLimit {
        self.visitor.max_depth()
    }

    fn order(&self) -> Order {
        self.visitor.order()
    }

    fn before_component(&mut self, component: &Component) {
        let element = self.visitor.create_element(component);
        self.path.push(component, element);
    }

    fn visit(&mut self, component: &Component) -> Result<()> {
        let path = &mut self.path;
        self.visitor.visit_any(component, path)?;
        match component.component_type() {
            ComponentType::Project => self.visitor.visit_project(component, path),
            ComponentType::Module => self.visitor.visit_module(component, path),
            ComponentType::Directory => self.visitor.visit_directory(component, path),
            ComponentType::File => self.visitor.visit_file(component, path),
            ComponentType::View => self.visitor.visit_view(component, path),
            ComponentType::Subview => self.visitor.visit_subview(component, path),
            ComponentType::ProjectView => self.visitor.visit_project_view(component, path),
        }
    }

    fn after_component(&mut self, _component: &Component) {
        self.path.pop();
    }
}
