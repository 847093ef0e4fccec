use std::io::Write;
use std::sync::Arc;

use content_dom::{DocumentFixture, MemoryDocument};
use serde_json::{json, Value};
use soulbrowser_content::transport::ServeStats;
use soulbrowser_content::{serve_lines, ContentConfig, ContentHost};
use tokio::io::AsyncReadExt;

const PAGE: &str = r#"
viewport: { width: 800, height: 600 }
root:
  tag: html
  children:
    - tag: body
      layout: { top: 0, left: 0, width: 800, height: 2400 }
      children:
        - tag: h1
          attrs: { id: title }
          text: Catalog
          layout: { top: 10, left: 10, width: 300, height: 40 }
        - tag: a
          attrs: { class: product, href: /p/1 }
          text: First
          layout: { top: 100, left: 10, width: 100, height: 20 }
        - tag: a
          attrs: { class: product, href: /p/2 }
          text: Second
          layout: { top: 2000, left: 10, width: 100, height: 20 }
"#;

fn host(config: &ContentConfig) -> ContentHost {
    let fixture = DocumentFixture::from_yaml_str(PAGE).unwrap();
    ContentHost::install(Arc::new(MemoryDocument::from_fixture(&fixture)), config).unwrap()
}

async fn serve(host: &ContentHost, input: &str) -> (ServeStats, Vec<Value>) {
    let (writer, mut reader) = tokio::io::duplex(64 * 1024);
    let stats = serve_lines(
        host.dispatcher().clone(),
        host.subscribe(),
        input.as_bytes(),
        writer,
    )
    .await
    .unwrap();

    let mut output = String::new();
    reader.read_to_string(&mut output).await.unwrap();
    let frames = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (stats, frames)
}

fn reply_for<'a>(frames: &'a [Value], id: &Value) -> Option<&'a Value> {
    frames
        .iter()
        .find(|frame| frame.get("id") == Some(id) && frame.get("ok").is_some())
}

#[tokio::test]
async fn test_answers_each_request_by_id() {
    let host = host(&ContentConfig::default());
    let input = [
        json!({"id": 1, "message": {"type": "content-script-exists"}}),
        json!({"id": 2, "message": {"type": "condition-builder", "data": {
            "type": "element#text", "data": {"selector": "#title"}
        }}}),
        json!({"id": 3, "message": {"type": "loop-elements", "selector": "a.product", "max": 0}}),
        json!({"id": 4, "message": {"isBlock": true, "name": "get-text", "data": {"selector": "a.product", "multiple": true}}}),
    ]
    .iter()
    .map(Value::to_string)
    .collect::<Vec<_>>()
    .join("\n");

    let (stats, frames) = serve(&host, &input).await;

    assert_eq!(stats.received, 4);
    assert_eq!(stats.answered, 4);
    assert_eq!(reply_for(&frames, &json!(1)).unwrap()["data"], json!(true));
    assert_eq!(reply_for(&frames, &json!(2)).unwrap()["data"], json!("Catalog"));

    let loop_reply = reply_for(&frames, &json!(3)).unwrap();
    let selectors = loop_reply["data"].as_array().unwrap();
    assert_eq!(selectors.len(), 2);
    assert!(selectors[0].as_str().unwrap().starts_with("[soul-loop="));

    let texts = &reply_for(&frames, &json!(4)).unwrap()["data"];
    assert_eq!(texts, &json!(["First", "Second"]));
}

#[tokio::test]
async fn test_unrecognized_type_writes_nothing() {
    let host = host(&ContentConfig::default());
    let input = concat!(
        r#"{"id": "x", "message": {"type": "not-a-thing"}}"#,
        "\n",
        r#"{"id": "y", "message": {"type": "content-script-exists"}}"#,
        "\n",
    );

    let (stats, frames) = serve(&host, input).await;

    assert_eq!(stats.unanswered, 1);
    assert_eq!(stats.answered, 1);
    assert!(reply_for(&frames, &json!("x")).is_none());
    assert_eq!(reply_for(&frames, &json!("y")).unwrap()["ok"], json!(true));
}

#[tokio::test]
async fn test_malformed_frame_is_reported_and_serving_continues() {
    let host = host(&ContentConfig::default());
    let input = "not json\n\n{\"id\": 9, \"message\": {\"type\": \"content-script-exists\"}}\n";

    let (stats, frames) = serve(&host, input).await;

    assert_eq!(stats.malformed, 1);
    let rejected = reply_for(&frames, &Value::Null).unwrap();
    assert_eq!(rejected["ok"], json!(false));
    assert!(rejected["error"].as_str().unwrap().starts_with("Invalid frame"));
    assert_eq!(reply_for(&frames, &json!(9)).unwrap()["data"], json!(true));
}

#[tokio::test]
async fn test_block_failure_is_written_as_error() {
    let host = host(&ContentConfig::default());
    let input = r##"{"id": 5, "message": {"isBlock": true, "name": "scroll-element", "data": {"selector": "#missing"}}}"##;

    let (_, frames) = serve(&host, input).await;

    let reply = reply_for(&frames, &json!(5)).unwrap();
    assert_eq!(reply["ok"], json!(false));
    assert!(reply["error"].is_string());
    assert!(host.dispatcher().marks().active().is_empty());
}

#[tokio::test]
async fn test_frame_id_is_announced_as_notification() {
    let config = ContentConfig {
        bridge: extensions_bridge::BridgeConfig {
            frame_id: Some("frame-main".into()),
            ..Default::default()
        },
        document: None,
    };
    let host = host(&config);
    let input = r#"{"id": 1, "message": {"type": "give-me-the-frame-id"}}"#;

    let (_, frames) = serve(&host, input).await;

    assert!(frames.contains(&json!({
        "notification": {"type": "this-is-the-frame-id", "frameId": "frame-main"}
    })));
    assert_eq!(reply_for(&frames, &json!(1)).unwrap()["data"], Value::Null);
}

#[tokio::test]
async fn test_config_file_names_the_document() {
    let dir = tempfile::tempdir().unwrap();
    let page_path = dir.path().join("page.yaml");
    std::fs::write(&page_path, PAGE).unwrap();

    let config_path = dir.path().join("content.yaml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(file, "probe_timeout_ms: 500").unwrap();
    writeln!(file, "document: {}", page_path.display()).unwrap();

    let config = ContentConfig::load(Some(config_path.as_path())).await.unwrap();
    assert_eq!(config.bridge.probe_timeout_ms, 500);

    let host = ContentHost::from_config(&config).unwrap();
    let (client, _listener, _handle) = host.connect();
    let reply = client
        .send(json!({"type": "condition-builder", "data": {
            "type": "element#attribute",
            "data": {"selector": "a.product", "attrName": "href"}
        }}))
        .await
        .unwrap();
    assert_eq!(reply, Ok(json!("/p/1")));
}
