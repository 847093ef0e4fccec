use std::sync::Arc;

use action_locator::{DefaultElementResolver, ElementResolver};
use action_primitives::{ExecCtx, ProbeConfig, VisibilityProber};
use content_dom::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use soulbrowser_core_types::BlockId;

use crate::errors::BlockError;
use crate::kind::BlockKind;

/// Block invocation as sent by the controller.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub data: Value,
    /// Show the executing-block indicator on the page
    #[serde(default)]
    pub executed_block_on_web: bool,
}

impl BlockRequest {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            data,
            executed_block_on_web: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn kind(&self) -> BlockKind {
        BlockKind::parse(&self.name)
    }

    /// Instance identity; falls back to the name when no id was sent.
    pub fn block_id(&self) -> BlockId {
        BlockId::new(self.id.clone().unwrap_or_else(|| self.name.clone()))
    }

    /// Decode `data` into a handler-specific payload.
    pub fn payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, BlockError> {
        serde_json::from_value(self.data.clone())
            .map_err(|err| BlockError::InvalidPayload(format!("{}: {err}", self.name)))
    }
}

/// Document-side capabilities handed to every handler.
#[derive(Clone)]
pub struct BlockContext {
    pub document: Arc<dyn Document>,
    pub resolver: Arc<dyn ElementResolver>,
    pub prober: VisibilityProber,
    pub exec: ExecCtx,
}

impl BlockContext {
    pub fn new(document: Arc<dyn Document>, probe: ProbeConfig) -> Self {
        Self {
            resolver: Arc::new(DefaultElementResolver::new(document.clone())),
            prober: VisibilityProber::new(document.clone(), probe),
            document,
            exec: ExecCtx::default(),
        }
    }

    pub fn with_exec(mut self, exec: ExecCtx) -> Self {
        self.exec = exec;
        self
    }
}
