use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::{sync::watch, task::JoinHandle};

use super::{client::CatalogSource, models::BrewingMethod};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Loads the method catalog once and exposes it as observable state.
///
/// `is_loading` starts out `true` and drops to `false` as soon as the single
/// fetch settles, whatever its result. A failed fetch leaves `methods` empty;
/// the error is logged and never handed back to the caller.
#[derive(Clone)]
pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    methods: Arc<watch::Sender<Vec<BrewingMethod>>>,
    loading: Arc<watch::Sender<bool>>,
    started: Arc<AtomicBool>,
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        let (methods, _) = watch::channel(Vec::new());
        let (loading, _) = watch::channel(true);

        Self {
            source,
            methods: Arc::new(methods),
            loading: Arc::new(loading),
            started: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn methods(&self) -> Vec<BrewingMethod> {
        self.methods.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_methods(&self) -> watch::Receiver<Vec<BrewingMethod>> {
        self.methods.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Runs the fetch. Only the first call reaches the source; every call
    /// waits for that fetch to settle and returns its result.
    ///
    /// The fetch itself runs on its own task, so dropping this future (a
    /// timeout, a losing `select!` arm) never leaves the catalog stuck loading.
    pub async fn load(&self) -> Vec<BrewingMethod> {
        if !self.started.swap(true, Ordering::SeqCst) {
            let source = self.source.clone();
            let methods = self.methods.clone();
            let loading = self.loading.clone();
            tokio::spawn(async move {
                match source.fetch_methods().await {
                    Ok(fetched) => {
                        log_info!("Loaded {} brewing methods", fetched.len());
                        methods.send_replace(fetched);
                    }
                    Err(err) => {
                        log_warn!("Catalog fetch failed, continuing with an empty catalog: {err:#}");
                        methods.send_replace(Vec::new());
                    }
                }
                loading.send_replace(false);
            });
        }

        self.wait_loaded().await;
        self.methods()
    }

    /// Starts the fetch in the background so the caller never waits on I/O.
    pub fn spawn_load(&self) -> JoinHandle<()> {
        let loader = self.clone();
        tokio::spawn(async move {
            loader.load().await;
        })
    }

    pub async fn wait_loaded(&self) {
        let mut rx = self.loading.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|loading| !*loading).await;
    }
}
