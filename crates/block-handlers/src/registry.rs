use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::builtins::{
    AttributeValueHandler, ElementExistsHandler, GetTextHandler, ScrollElementHandler,
};
use crate::errors::BlockError;
use crate::kind::BlockKind;
use crate::model::{BlockContext, BlockRequest};

#[async_trait]
pub trait BlockHandler: Send + Sync {
    async fn handle(&self, request: &BlockRequest, ctx: &BlockContext)
        -> Result<Value, BlockError>;
}

fn builtin_handler(kind: &BlockKind) -> Option<Arc<dyn BlockHandler>> {
    let handler: Arc<dyn BlockHandler> = match kind {
        BlockKind::ElementExists => Arc::new(ElementExistsHandler),
        BlockKind::GetText => Arc::new(GetTextHandler),
        BlockKind::AttributeValue => Arc::new(AttributeValueHandler),
        BlockKind::ScrollElement => Arc::new(ScrollElementHandler),
        BlockKind::Unknown(_) => return None,
    };
    Some(handler)
}

/// Block kind to handler mapping.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<BlockKind, Arc<dyn BlockHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every known kind.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for kind in BlockKind::KNOWN {
            if let Some(handler) = builtin_handler(&kind) {
                registry.handlers.insert(kind, handler);
            }
        }
        registry
    }

    /// Register or replace the handler for a kind.
    pub fn register(&self, kind: BlockKind, handler: Arc<dyn BlockHandler>) {
        self.handlers.insert(kind, handler);
    }

    pub fn get(&self, kind: &BlockKind) -> Option<Arc<dyn BlockHandler>> {
        self.handlers.get(kind).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, kind: &BlockKind) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl BlockHandler for Echo {
        async fn handle(
            &self,
            request: &BlockRequest,
            _ctx: &BlockContext,
        ) -> Result<Value, BlockError> {
            Ok(request.data.clone())
        }
    }

    #[test]
    fn builtins_cover_every_known_kind() {
        let registry = HandlerRegistry::with_builtins();
        assert_eq!(registry.len(), BlockKind::KNOWN.len());
        for kind in BlockKind::KNOWN {
            assert!(registry.contains(&kind), "{kind}");
        }
    }

    #[test]
    fn unknown_kinds_can_be_registered() {
        let registry = HandlerRegistry::with_builtins();
        let kind = BlockKind::parse("event-click");
        assert!(registry.get(&kind).is_none());
        registry.register(kind.clone(), Arc::new(Echo));
        assert!(registry.get(&BlockKind::parse("Event Click")).is_some());
    }
}
