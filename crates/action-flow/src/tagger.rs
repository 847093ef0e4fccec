//! Marker writer for loop iterations

use std::collections::HashSet;
use std::sync::Arc;

use action_locator::{ElementResolver, LocatorError, SelectorDescriptor, SelectorKind};
use content_dom::{Document, NodeId};
use soulbrowser_core_types::RunId;
use tracing::{debug, info};

use crate::{
    errors::FlowError,
    types::{LoopRequest, LoopTags},
};

/// Attribute carrying `{runId}--{index}` on tagged elements
pub const LOOP_MARKER_ATTR: &str = "soul-loop";

/// Loop matches are limited to descendants of this scope.
const LOOP_SCOPE: &str = "body *";

/// Whether the element at `index` falls outside a loop bound.
///
/// A positive `max` keeps indices `0..=max`, so `max + 1` elements are
/// tagged. Zero or negative `max` keeps everything.
pub fn exceeds_loop_bound(index: usize, max: i64) -> bool {
    max > 0 && i64::try_from(index).map_or(true, |index| index > max)
}

fn marker_value(run_id: &RunId, index: usize) -> String {
    format!("{run_id}--{index}")
}

fn lookup_selector(run_id: &RunId, index: usize) -> String {
    format!("[{LOOP_MARKER_ATTR}=\"{}\"]", marker_value(run_id, index))
}

/// Tags loop elements with run-scoped markers
pub struct LoopTagger {
    document: Arc<dyn Document>,
    resolver: Arc<dyn ElementResolver>,
}

impl LoopTagger {
    pub fn new(document: Arc<dyn Document>, resolver: Arc<dyn ElementResolver>) -> Self {
        Self { document, resolver }
    }

    /// Tag the bounded match set of a structural selector.
    ///
    /// Only elements inside `<body>` are considered; indices count from
    /// the first of those.
    pub fn tag(&self, request: &LoopRequest) -> Result<LoopTags, FlowError> {
        if SelectorKind::classify(&request.selector) == SelectorKind::Path {
            return Err(LocatorError::Unsupported(format!(
                "loop selectors must be structural: {}",
                request.selector
            ))
            .into());
        }

        let matched = self
            .resolver
            .resolve(&SelectorDescriptor::new(request.selector.as_str()).with_multiple(true))?;
        let scope: HashSet<NodeId> = self
            .document
            .query_selector_all(LOOP_SCOPE)?
            .into_iter()
            .collect();
        let run_id = RunId::generate();

        let mut selectors = Vec::new();
        let in_body = matched.nodes.into_iter().filter(|node| scope.contains(node));
        for (index, node) in in_body.enumerate() {
            if exceeds_loop_bound(index, request.max) {
                break;
            }
            self.document
                .set_attribute(node, LOOP_MARKER_ATTR, &marker_value(&run_id, index))?;
            selectors.push(lookup_selector(&run_id, index));
        }

        info!(
            run_id = %run_id,
            selector = %request.selector,
            max = request.max,
            tagged = selectors.len(),
            "Loop elements tagged"
        );
        Ok(LoopTags { run_id, selectors })
    }

    /// Remove every marker written by one run. Returns how many were removed.
    pub fn clear(&self, run_id: &RunId) -> Result<usize, FlowError> {
        let prefix = format!("[{LOOP_MARKER_ATTR}^=\"{run_id}--\"]");
        let nodes = self.document.query_selector_all(&prefix)?;
        for node in &nodes {
            self.document.remove_attribute(*node, LOOP_MARKER_ATTR)?;
        }
        debug!(run_id = %run_id, removed = nodes.len(), "Loop markers cleared");
        Ok(nodes.len())
    }
}
