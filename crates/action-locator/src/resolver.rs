//! Element resolver dispatching to the strategy for each selector mode

use std::sync::Arc;

use content_dom::{Document, NodeId};
use tracing::debug;

use crate::{errors::LocatorError, strategies::*, types::*};

/// Element resolver trait
pub trait ElementResolver: Send + Sync {
    /// Resolve every element the descriptor matches
    fn resolve(&self, descriptor: &SelectorDescriptor) -> Result<ResolvedSet, LocatorError>;

    /// Resolve only the first element in document order
    fn resolve_first(&self, descriptor: &SelectorDescriptor) -> Result<Option<NodeId>, LocatorError> {
        Ok(self.resolve(descriptor)?.first())
    }
}

/// Default element resolver over a live document
pub struct DefaultElementResolver {
    path_strategy: Arc<PathStrategy>,
    structural_strategy: Arc<StructuralStrategy>,
}

impl DefaultElementResolver {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self {
            path_strategy: Arc::new(PathStrategy::new(document.clone())),
            structural_strategy: Arc::new(StructuralStrategy::new(document)),
        }
    }

    /// Get strategy by selector mode
    fn get_strategy(&self, kind: SelectorKind) -> Arc<dyn Strategy> {
        match kind {
            SelectorKind::Path => self.path_strategy.clone(),
            SelectorKind::Structural => self.structural_strategy.clone(),
        }
    }
}

impl ElementResolver for DefaultElementResolver {
    fn resolve(&self, descriptor: &SelectorDescriptor) -> Result<ResolvedSet, LocatorError> {
        let kind = descriptor.kind();
        let nodes = self.get_strategy(kind).resolve(&descriptor.selector)?;
        debug!(
            selector = %descriptor.selector,
            strategy = kind.name(),
            matches = nodes.len(),
            "Resolved selector"
        );
        Ok(ResolvedSet::new(kind, nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_dom::{DocumentFixture, ElementFixture, MemoryDocument, Viewport};

    fn resolver() -> DefaultElementResolver {
        let root = ElementFixture::new("html").child(
            ElementFixture::new("body").children(
                ["a", "b", "c"]
                    .into_iter()
                    .map(|name| ElementFixture::new("div").attr("class", "item").text(name)),
            ),
        );
        let document = MemoryDocument::from_fixture(&DocumentFixture::new(Viewport::default(), root));
        DefaultElementResolver::new(Arc::new(document))
    }

    #[test]
    fn test_both_modes_agree() {
        let resolver = resolver();
        let structural = resolver.resolve(&SelectorDescriptor::new("div.item")).unwrap();
        let path = resolver
            .resolve(&SelectorDescriptor::new("//div[@class='item']"))
            .unwrap();
        assert_eq!(structural.kind, SelectorKind::Structural);
        assert_eq!(path.kind, SelectorKind::Path);
        assert_eq!(structural.nodes, path.nodes);
        assert_eq!(structural.len(), 3);
    }

    #[test]
    fn test_zero_matches_is_not_an_error() {
        let resolver = resolver();
        let set = resolver.resolve(&SelectorDescriptor::new("span")).unwrap();
        assert!(set.is_empty());
        assert_eq!(resolver.resolve_first(&SelectorDescriptor::new("//span")).unwrap(), None);
    }

    #[test]
    fn test_first_match_in_document_order() {
        let resolver = resolver();
        let all = resolver.resolve(&SelectorDescriptor::new(".item")).unwrap();
        let first = resolver
            .resolve_first(&SelectorDescriptor::new("(//div)[1]"))
            .unwrap();
        assert_eq!(first, all.first());
    }

    #[test]
    fn test_malformed_selectors_are_errors() {
        let resolver = resolver();
        for bad in ["div[", "//div["] {
            let err = resolver.resolve(&SelectorDescriptor::new(bad)).unwrap_err();
            assert!(matches!(err, LocatorError::InvalidSelector(_)), "{bad}");
        }
    }
}
