use std::time::Duration;

use content_dom::{
    ComputedStyle, Document, DocumentFixture, DomError, ElementFixture, LayoutBox, MemoryDocument,
};

const PAGE: &str = r#"
viewport: { width: 800, height: 600 }
root:
  tag: html
  children:
    - tag: body
      layout: { width: 800, height: 4000 }
      children:
        - tag: section
          attrs: { id: main }
          layout: { top: 1000, width: 800, height: 500 }
          children:
            - tag: button
              attrs: { class: "btn primary", data-role: submit }
              text: Send
              layout: { top: 20, left: 10, width: 100, height: 30 }
            - tag: span
              text: secret
              style: { display: none }
              layout: { top: 60, width: 50, height: 10 }
        - tag: img
          attrs: { id: lazy }
          stalls_layout: true
"#;

fn page() -> MemoryDocument {
    MemoryDocument::from_fixture(&DocumentFixture::from_yaml_str(PAGE).unwrap())
}

#[test]
fn queries_agree_between_selector_and_path() {
    let doc = page();
    let by_selector = doc
        .query_selector_all("section#main > button[data-role=\"submit\"]")
        .unwrap();
    let by_path = doc
        .evaluate_path("//section[@id='main']/button[@data-role='submit']")
        .unwrap();
    assert_eq!(by_selector.len(), 1);
    assert_eq!(by_selector, by_path);
    assert_eq!(doc.inner_text(by_selector[0]).unwrap(), "Send");
}

#[test]
fn inner_text_skips_undisplayed_descendants() {
    let doc = page();
    let section = doc.query_selector_all("#main").unwrap()[0];
    assert_eq!(doc.inner_text(section).unwrap(), "Send");
}

#[test]
fn malformed_queries_are_rejected() {
    let doc = page();
    assert!(matches!(
        doc.query_selector_all("button[data-role"),
        Err(DomError::InvalidSelector(_))
    ));
    assert!(matches!(
        doc.evaluate_path("//button[@data-role"),
        Err(DomError::InvalidPath(_))
    ));
}

#[tokio::test]
async fn intersection_follows_scroll_position() {
    let doc = page();
    let button = doc.query_selector_all("button.primary").unwrap()[0];

    // Button sits at document y = 1020, below the first screen.
    assert_eq!(doc.observe_intersection(button).await.unwrap(), 0.0);

    doc.scroll_to(0.0, 800.0);
    assert_eq!(doc.observe_intersection(button).await.unwrap(), 1.0);
}

#[test]
fn undisplayed_elements_never_intersect() {
    let doc = page();
    let span = doc.query_selector_all("span").unwrap()[0];
    doc.scroll_to(0.0, 1000.0);
    assert_eq!(tokio_test::block_on(doc.observe_intersection(span)).unwrap(), 0.0);

    doc.set_style(span, ComputedStyle::default()).unwrap();
    assert_eq!(tokio_test::block_on(doc.observe_intersection(span)).unwrap(), 1.0);
}

#[tokio::test]
async fn stalled_layout_keeps_observation_pending() {
    let doc = page();
    let img = doc.query_selector_all("#lazy").unwrap()[0];
    let observed =
        tokio::time::timeout(Duration::from_millis(50), doc.observe_intersection(img)).await;
    assert!(observed.is_err());
}

#[test]
fn appended_children_become_queryable() {
    let doc = page();
    let section = doc.query_selector_all("#main").unwrap()[0];
    let added = doc
        .append_child(
            section,
            &ElementFixture::new("a")
                .attr("href", "/next")
                .layout(LayoutBox::new(100.0, 0.0, 40.0, 20.0)),
        )
        .unwrap();
    assert_eq!(doc.query_selector_all("a[href^='/']").unwrap(), vec![added]);
    assert_eq!(doc.offset_parent(added).unwrap(), Some(section));
}
