use std::collections::HashSet;
use std::sync::Arc;

use action_flow::{FlowError, LoopRequest, LoopTagger, LOOP_MARKER_ATTR};
use action_locator::{DefaultElementResolver, LocatorError};
use content_dom::{Document, DocumentFixture, ElementFixture, MemoryDocument, Viewport};

fn list(count: usize) -> Arc<MemoryDocument> {
    let root = ElementFixture::new("html").child(ElementFixture::new("body").children(
        (0..count).map(|i| {
            ElementFixture::new("div")
                .attr("class", "item")
                .text(format!("item {i}"))
        }),
    ));
    Arc::new(MemoryDocument::from_fixture(&DocumentFixture::new(
        Viewport::default(),
        root,
    )))
}

fn tagger(doc: &Arc<MemoryDocument>) -> LoopTagger {
    LoopTagger::new(doc.clone(), Arc::new(DefaultElementResolver::new(doc.clone())))
}

#[test]
fn bound_admits_indices_up_to_max() {
    let doc = list(5);
    let tags = tagger(&doc).tag(&LoopRequest::new(".item", 3)).unwrap();
    assert_eq!(tags.len(), 4);

    let items = doc.query_selector_all(".item").unwrap();
    assert!(doc.get_attribute(items[3], LOOP_MARKER_ATTR).unwrap().is_some());
    assert_eq!(doc.get_attribute(items[4], LOOP_MARKER_ATTR).unwrap(), None);
}

#[test]
fn non_positive_max_tags_everything() {
    for max in [0, -1] {
        let doc = list(6);
        let tags = tagger(&doc).tag(&LoopRequest::new(".item", max)).unwrap();
        assert_eq!(tags.len(), 6, "max = {max}");
    }
}

#[test]
fn lookup_selectors_resolve_to_one_element_each() {
    let doc = list(4);
    let tags = tagger(&doc).tag(&LoopRequest::new(".item", 2)).unwrap();
    assert_eq!(tags.len(), 3);

    let items = doc.query_selector_all(".item").unwrap();
    for (index, selector) in tags.selectors.iter().enumerate() {
        let found = doc.query_selector_all(selector).unwrap();
        assert_eq!(found, vec![items[index]], "{selector}");
    }
}

#[test]
fn successive_runs_never_collide() {
    let doc = list(3);
    let tagger = tagger(&doc);
    let first = tagger.tag(&LoopRequest::new(".item", 0)).unwrap();
    let second = tagger.tag(&LoopRequest::new(".item", 0)).unwrap();

    assert_ne!(first.run_id, second.run_id);
    let first_set: HashSet<_> = first.selectors.iter().collect();
    assert!(second.selectors.iter().all(|s| !first_set.contains(s)));

    // The newest run owns the marker attribute.
    for selector in &second.selectors {
        assert_eq!(doc.query_selector_all(selector).unwrap().len(), 1);
    }
    for selector in &first.selectors {
        assert!(doc.query_selector_all(selector).unwrap().is_empty());
    }
}

#[test]
fn no_matches_yields_empty_list() {
    let doc = list(2);
    let tags = tagger(&doc).tag(&LoopRequest::new(".missing", 5)).unwrap();
    assert!(tags.is_empty());
}

#[test]
fn path_queries_are_rejected() {
    let doc = list(2);
    let err = tagger(&doc)
        .tag(&LoopRequest::new("//div", 0))
        .unwrap_err();
    assert!(matches!(err, FlowError::Locator(LocatorError::Unsupported(_))));
}

#[test]
fn clear_removes_only_one_run() {
    let doc = list(3);
    let tagger = tagger(&doc);
    let tags = tagger.tag(&LoopRequest::new(".item", 0)).unwrap();

    let extra = doc.query_selector_all(".item").unwrap()[0];
    doc.set_attribute(extra, "data-keep", "1").unwrap();

    assert_eq!(tagger.clear(&tags.run_id).unwrap(), 3);
    assert!(doc
        .query_selector_all(&format!("[{LOOP_MARKER_ATTR}]"))
        .unwrap()
        .is_empty());
    assert!(doc.has_attribute(extra, "data-keep").unwrap());
}

#[test]
fn matches_outside_body_are_ignored() {
    let root = ElementFixture::new("html")
        .attr("lang", "en")
        .child(
            ElementFixture::new("head")
                .child(ElementFixture::new("title").text("Page"))
                .child(ElementFixture::new("meta").attr("lang", "en")),
        )
        .child(
            ElementFixture::new("body")
                .attr("lang", "en")
                .child(ElementFixture::new("div").attr("lang", "en"))
                .child(ElementFixture::new("div")),
        );
    let doc = Arc::new(MemoryDocument::from_fixture(&DocumentFixture::new(
        Viewport::default(),
        root,
    )));
    let tagger = tagger(&doc);

    let everything = tagger.tag(&LoopRequest::new("*", 0)).unwrap();
    assert_eq!(everything.len(), 2);
    let divs = doc.query_selector_all("div").unwrap();
    for (selector, div) in everything.selectors.iter().zip(&divs) {
        assert_eq!(doc.query_selector_all(selector).unwrap(), vec![*div]);
    }
    let title = doc.query_selector_all("title").unwrap()[0];
    assert!(!doc.has_attribute(title, LOOP_MARKER_ATTR).unwrap());

    // <body> is not its own descendant.
    let lang = tagger.tag(&LoopRequest::new("[lang]", 1)).unwrap();
    assert_eq!(lang.len(), 1);
    assert_eq!(doc.query_selector_all(&lang.selectors[0]).unwrap(), vec![divs[0]]);
}
