//! Depth-limited component tree traversal
//!
//! Two visitor styles share one crawler:
//!
//! - [`TypeAwareVisitor`]: one callback per visited node, no state carried
//!   between nodes by the crawler.
//! - [`PathAwareVisitor`]: the crawler keeps a [`Path`] of per-node stack
//!   elements from the root to the current node. An element is created when
//!   the crawler enters a node and dropped when it leaves it, which lets a
//!   post-order visitor fold a node's element into its parent's.
//!
//! Any number of visitors can run in a single traversal with
//! [`VisitorsCrawler`]. For each node, pre-order visitors run before the
//! children are crawled and post-order visitors after. A visitor only sees
//! the nodes its [`CrawlerDepthLimit`] allows, and the crawler stops
//! descending below a node no visitor is interested in.

mod path_aware;
mod type_aware;

pub use path_aware::{Path, PathAwareVisitor, PathElement};
pub use type_aware::TypeAwareVisitor;

use tracing::trace;

use crate::component::{Component, CrawlerDepthLimit};
use crate::error::Result;

/// When a visitor runs relative to the children of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    PreOrder,
    PostOrder,
}

/// Uniform view of both visitor styles used by the crawler
trait VisitorWrapper {
    fn name(&self) -> &str;

    fn max_depth(&self) -> CrawlerDepthLimit;

    fn order(&self) -> Order;

    fn before_component(&mut self, component: &Component);

    fn visit(&mut self, component: &Component) -> Result<()>;

    fn after_component(&mut self, component: &Component);
}

/// Runs a list of visitors over a tree in a single traversal
pub struct VisitorsCrawler<'v> {
    visitors: Vec<Box<dyn VisitorWrapper + 'v>>,
}

impl Default for VisitorsCrawler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'v> VisitorsCrawler<'v> {
    pub fn new() -> Self {
        Self {
            visitors: Vec::new(),
        }
    }

    /// Append a type-aware visitor. Visitors run in the order they are added.
    pub fn with_type_aware<V: TypeAwareVisitor + 'v>(mut self, visitor: &'v mut V) -> Self {
        self.visitors
            .push(Box::new(type_aware::TypeAwareWrapper::new(visitor)));
        self
    }

    /// Append a path-aware visitor. Visitors run in the order they are added.
    pub fn with_path_aware<V>(mut self, visitor: &'v mut V) -> Self
    where
        V: PathAwareVisitor + 'v,
        V::Element: 'v,
    {
        self.visitors
            .push(Box::new(path_aware::PathAwareWrapper::new(visitor)));
        self
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    /// Crawl the tree rooted at `component`. The first visitor error aborts
    /// the traversal.
    pub fn visit(&mut self, component: &Component) -> Result<()> {
        let component_type = component.component_type();
        let active: Vec<usize> = self
            .visitors
            .iter()
            .enumerate()
            .filter(|(_, v)| v.max_depth().allows(component_type))
            .map(|(i, _)| i)
            .collect();
        if active.is_empty() {
            return Ok(());
        }

        for &i in &active {
            self.visitors[i].before_component(component);
        }
        self.visit_node(component, &active, Order::PreOrder)?;
        for child in component.children() {
            self.visit(child)?;
        }
        self.visit_node(component, &active, Order::PostOrder)?;
        for &i in &active {
            self.visitors[i].after_component(component);
        }
        Ok(())
    }

    fn visit_node(&mut self, component: &Component, active: &[usize], order: Order) -> Result<()> {
        for &i in active {
            let visitor = &mut self.visitors[i];
            if visitor.order() != order {
                continue;
            }
            trace!(
                "Visitor '{}' is currently visiting component {}",
                visitor.name(),
                component
            );
            visitor.visit(component)?;
        }
        Ok(())
    }
}

/// Crawler for a single type-aware visitor
pub struct TypeAwareCrawler<'v> {
    inner: VisitorsCrawler<'v>,
}

impl<'v> TypeAwareCrawler<'v> {
    pub fn new<V: TypeAwareVisitor + 'v>(visitor: &'v mut V) -> Self {
        Self {
            inner: VisitorsCrawler::new().with_type_aware(visitor),
        }
    }

    pub fn visit(&mut self, component: &Component) -> Result<()> {
        self.inner.visit(component)
    }
}

/// Crawler for a single path-aware visitor
pub struct PathAwareCrawler<'v> {
    inner: VisitorsCrawler<'v>,
}

impl<'v> PathAwareCrawler<'v> {
    pub fn new<V>(visitor: &'v mut V) -> Self
    where
        V: PathAwareVisitor + 'v,
        V::Element: 'v,
    {
        Self {
            inner: VisitorsCrawler::new().with_path_aware(visitor),
        }
    }

    pub fn visit(&mut self, component: &Component) -> Result<()> {
        self.inner.visit(component)
    }
}
