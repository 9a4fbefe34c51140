//! Background downloads of remote feature payloads.
//!
//! Payload bodies come back over a channel and are drained by
//! [`Api::poll_fetched`](crate::Api::poll_fetched); nothing here blocks the
//! thread driving the map.

use futures::{SinkExt, StreamExt};
use reqwest::header::USER_AGENT;

use self::runtime::FetchRuntime;
use crate::ingest::FormatKind;

/// A payload to download and the format to ingest it as.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub kind: FormatKind,
}

/// Outcome of a single download.
#[derive(Debug)]
pub struct FetchedPayload {
    pub url: String,
    pub kind: FormatKind,
    pub body: Result<String, reqwest::Error>,
}

async fn fetch_payload(client: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    let response = client.get(url).header(USER_AGENT, "Kaart").send().await?;

    log::debug!("Fetched {:?}.", response.status());

    response.error_for_status()?.text().await
}

async fn fetch_continuously_impl(
    mut request_rx: futures::channel::mpsc::Receiver<FetchRequest>,
    mut payload_tx: futures::channel::mpsc::Sender<FetchedPayload>,
) -> Result<(), ()> {
    // Keep outside the loop to reuse it as much as possible.
    let client = reqwest::Client::new();

    loop {
        let request = request_rx.next().await.ok_or(())?;

        log::debug!("Getting {}.", request.url);
        let body = fetch_payload(&client, &request.url).await;

        if let Err(e) = &body {
            log::warn!("Could not download '{}': {}", request.url, e);
        }

        payload_tx
            .send(FetchedPayload {
                url: request.url,
                kind: request.kind,
                body,
            })
            .await
            .map_err(|_| ())?;
    }
}

/// Continuously download payloads requested via the request channel.
async fn fetch_continuously(
    request_rx: futures::channel::mpsc::Receiver<FetchRequest>,
    payload_tx: futures::channel::mpsc::Sender<FetchedPayload>,
) {
    if fetch_continuously_impl(request_rx, payload_tx).await.is_err() {
        log::error!("Payload fetch loop ended; its channels are closed.");
    }
}

const CHANNEL_SIZE: usize = 20;

/// Handle to the download loop running on its own runtime.
pub(crate) struct PayloadFetcher {
    request_tx: futures::channel::mpsc::Sender<FetchRequest>,
    payload_rx: futures::channel::mpsc::Receiver<FetchedPayload>,
    _runtime: FetchRuntime,
}

impl PayloadFetcher {
    pub(crate) fn new() -> Self {
        let (request_tx, request_rx) = futures::channel::mpsc::channel(CHANNEL_SIZE);
        let (payload_tx, payload_rx) = futures::channel::mpsc::channel(CHANNEL_SIZE);
        let runtime = FetchRuntime::spawn(fetch_continuously(request_rx, payload_tx));

        Self {
            request_tx,
            payload_rx,
            _runtime: runtime,
        }
    }

    pub(crate) fn request(&mut self, url: impl Into<String>, kind: FormatKind) {
        let request = FetchRequest {
            url: url.into(),
            kind,
        };
        if let Err(e) = self.request_tx.try_send(request) {
            log::warn!("Could not request a payload: {e}");
        }
    }

    /// Next finished download, if any. Never blocks.
    pub(crate) fn poll(&mut self) -> Option<FetchedPayload> {
        self.payload_rx.try_next().ok().flatten()
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod runtime {
    /// Dedicated thread driving the fetch loop on a current-thread Tokio
    /// runtime. Dropping the handle asks the loop to quit and joins the
    /// thread.
    pub struct FetchRuntime {
        thread: Option<std::thread::JoinHandle<()>>,
        quit_tx: tokio::sync::mpsc::UnboundedSender<()>,
    }

    impl FetchRuntime {
        pub fn spawn<F>(fetch_loop: F) -> Self
        where
            F: std::future::Future + Send + 'static,
            F::Output: Send,
        {
            let (quit_tx, mut quit_rx) = tokio::sync::mpsc::unbounded_channel();

            let thread = std::thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("could not create the Tokio runtime, payloads will not download");

                runtime.spawn(fetch_loop);
                runtime.block_on(quit_rx.recv());
            });

            Self {
                thread: Some(thread),
                quit_tx,
            }
        }
    }

    impl Drop for FetchRuntime {
        fn drop(&mut self) {
            // The fetch thread may already be gone; the quit signal and the
            // join are both best effort.
            let _ = self.quit_tx.send(());

            if let Some(thread) = self.thread.take() {
                log::debug!("Waiting for the fetch thread to exit.");
                let _ = thread.join();
            }

            log::debug!("Fetch thread is down.");
        }
    }
}

#[cfg(target_arch = "wasm32")]
mod runtime {
    /// On wasm the fetch loop runs on the browser's event loop; there is no
    /// thread to manage.
    pub struct FetchRuntime;

    impl FetchRuntime {
        pub fn spawn<F>(fetch_loop: F) -> Self
        where
            F: std::future::Future<Output = ()> + 'static,
        {
            wasm_bindgen_futures::spawn_local(fetch_loop);
            Self
        }
    }
}
