//! Declarative document fixtures (YAML or JSON)

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::DomError;
use crate::model::{ComputedStyle, LayoutBox, Viewport};

/// A whole document: viewport plus root element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFixture {
    #[serde(default)]
    pub viewport: Viewport,
    pub root: ElementFixture,
}

impl DocumentFixture {
    pub fn new(viewport: Viewport, root: ElementFixture) -> Self {
        Self { viewport, root }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, DomError> {
        serde_yaml::from_str(source).map_err(|err| DomError::Fixture(err.to_string()))
    }

    pub fn from_json_str(source: &str) -> Result<Self, DomError> {
        serde_json::from_str(source).map_err(|err| DomError::Fixture(err.to_string()))
    }

    /// Load a fixture file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, DomError> {
        let source = std::fs::read_to_string(path)
            .map_err(|err| DomError::Fixture(format!("{}: {err}", path.display())))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementFixture {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub layout: Option<LayoutBox>,
    #[serde(default)]
    pub stalls_layout: bool,
    #[serde(default)]
    pub children: Vec<ElementFixture>,
}

impl ElementFixture {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    pub fn layout(mut self, layout: LayoutBox) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Mark the element as never producing a layout observation.
    pub fn stalls_layout(mut self) -> Self {
        self.stalls_layout = true;
        self
    }

    pub fn child(mut self, child: ElementFixture) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementFixture>) -> Self {
        self.children.extend(children);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_fixture_defaults() {
        let fixture = DocumentFixture::from_yaml_str(
            r#"
root:
  tag: html
  children:
    - tag: body
      layout: { height: 2000, width: 1280 }
      children:
        - tag: p
          attrs: { id: greeting }
          text: Hello
          style: { display: none }
"#,
        )
        .unwrap();

        assert_eq!(fixture.viewport, Viewport::default());
        let body = &fixture.root.children[0];
        assert_eq!(body.layout, Some(LayoutBox::new(0.0, 0.0, 1280.0, 2000.0)));
        let p = &body.children[0];
        assert_eq!(p.attrs.get("id").map(String::as_str), Some("greeting"));
        assert!(p.style.is_display_none());
        assert_eq!(p.style.visibility, "visible");
        assert!(!p.stalls_layout);
    }

    #[test]
    fn test_json_fixture_rejects_missing_root() {
        let err = DocumentFixture::from_json_str(r#"{"viewport": {"width": 10, "height": 10}}"#)
            .unwrap_err();
        assert!(matches!(err, DomError::Fixture(_)));
    }
}
