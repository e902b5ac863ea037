use super::{Order, VisitorWrapper};
use crate::component::{Component, ComponentType, CrawlerDepthLimit};
use crate::error::Result;

/// Visitor called once per node, with a method per component type
///
/// `visit_any` runs first for every node, then the type-specific method.
/// All callbacks default to doing nothing.
pub trait TypeAwareVisitor {
    fn max_depth(&self) -> CrawlerDepthLimit;

    fn order(&self) -> Order;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn visit_any(&mut self, _component: &Component) -> Result<()> {
        Ok(())
    }

    fn visit_project(&mut self, _project: &Component) -> Result<()> {
        Ok(())
    }

    fn visit_module(&mut self, _module: &Component) -> Result<()> {
        Ok(())
    }

    fn visit_directory(&mut self, _directory: &Component) -> Result<()> {
        Ok(())
    }

    fn visit_file(&mut self, _file: &Component) -> Result<()> {
        Ok(())
    }

    fn visit_view(&mut self, _view: &Component) -> Result<()> {
        Ok(())
    }

    fn visit_subview(&mut self, _subview: &Component) -> Result<()> {
        Ok(())
    }

    fn visit_project_view(&mut self, _project_view: &Component) -> Result<()> {
        Ok(())
    }
}

pub(super) struct TypeAwareWrapper<'v, V: ?Sized> {
    visitor: &'v mut V,
}

impl<'v, V: TypeAwareVisitor + ?Sized> TypeAwareWrapper<'v, V> {
    pub(super) fn new(visitor: &'v mut V) -> Self {
        Self { visitor }
    }
}

impl<V: TypeAwareVisitor + ?Sized> VisitorWrapper for TypeAwareWrapper<'_, V> {
    fn name(&self) -> &str {
        self.visitor.name()
    }

    fn max_depth(&self) -> CrawlerDepthLimit {
        self.visitor.max_depth()
    }

    fn order(&self) -> Order {
        self.visitor.order()
    }

    fn before_component(&mut self, _component: &Component) {}

    fn visit(&mut self, component: &Component) -> Result<()> {
        self.visitor.visit_any(component)?;
        match component.component_type() {
            ComponentType::Project => self.visitor.visit_project(component),
            ComponentType::Module => self.visitor.visit_module(component),
            ComponentType::Directory => self.visitor.visit_directory(component),
            ComponentType::File => self.visitor.visit_file(component),
            ComponentType::View => self.visitor.visit_view(component),
            ComponentType::Subview => self.visitor.visit_subview(component),
            ComponentType::ProjectView => self.visitor.visit_project_view(component),
        }
    }

    fn after_component(&mut self, _component: &Component) {}
}
