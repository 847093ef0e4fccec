use std::sync::Arc;

use block_handlers::HandlerRegistry;
use content_dom::{DocumentFixture, ElementFixture, LayoutBox, MemoryDocument, Viewport};
use extensions_bridge::{
    ChannelListener, ContentClient, Dispatcher, InjectionGuard, OutboundBus, OutboundMessage,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ContentConfig;
use crate::errors::ContentResult;

const OUTBOUND_CAPACITY: usize = 64;
const CLIENT_CAPACITY: usize = 32;

/// One injected content context: document, dispatcher and outbound bus.
pub struct ContentHost {
    document: Arc<MemoryDocument>,
    dispatcher: Arc<Dispatcher>,
    guard: InjectionGuard,
    outbound: OutboundBus,
}

impl ContentHost {
    /// Build a host for the configured document, or a blank page when none is set.
    pub fn from_config(config: &ContentConfig) -> ContentResult<Self> {
        let fixture = match &config.document {
            Some(path) => DocumentFixture::load(path)?,
            None => blank_page(),
        };
        Self::install(Arc::new(MemoryDocument::from_fixture(&fixture)), config)
    }

    pub fn install(document: Arc<MemoryDocument>, config: &ContentConfig) -> ContentResult<Self> {
        let guard = InjectionGuard::new();
        let (outbound, _) = broadcast::channel(OUTBOUND_CAPACITY);
        let registry = Arc::new(HandlerRegistry::with_builtins());
        let dispatcher = Dispatcher::install(
            &guard,
            document.clone(),
            registry,
            &config.bridge,
            outbound.clone(),
        )?;
        info!(frame_id = %dispatcher.frame_id().0, "Content host installed");
        Ok(Self {
            document,
            dispatcher,
            guard,
            outbound,
        })
    }

    pub fn document(&self) -> &Arc<MemoryDocument> {
        &self.document
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.outbound.subscribe()
    }

    /// Install again into the same context; always refused.
    pub fn reinstall(&self, config: &ContentConfig) -> ContentResult<Arc<Dispatcher>> {
        let dispatcher = Dispatcher::install(
            &self.guard,
            self.document.clone(),
            Arc::new(HandlerRegistry::with_builtins()),
            &config.bridge,
            self.outbound.clone(),
        )?;
        Ok(dispatcher)
    }

    /// Start a channel listener and return a client for it.
    pub fn connect(&self) -> (ContentClient, Arc<ChannelListener>, JoinHandle<()>) {
        let (client, inbound) = ContentClient::channel(CLIENT_CAPACITY);
        let listener = Arc::new(ChannelListener::new(self.dispatcher.clone()));
        let handle = listener.clone().spawn(inbound);
        (client, listener, handle)
    }

    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }
}

fn blank_page() -> DocumentFixture {
    let viewport = Viewport::default();
    let body = ElementFixture::new("body").layout(LayoutBox::new(
        0.0,
        0.0,
        viewport.width,
        viewport.height,
    ));
    DocumentFixture::new(viewport, ElementFixture::new("html").child(body))
}
