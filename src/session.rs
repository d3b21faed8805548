use crate::{CaptureEngine, Error, Result};
use log::{debug, warn};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::oneshot;

enum Command {
    Goto(String, oneshot::Sender<Result<()>>),
    WaitFor(String, Duration, oneshot::Sender<Result<()>>),
    Capture(String, oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly browser handle backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous [`CaptureEngine`] and executes
/// commands sent from async tasks, so the engine never has to cross threads.
/// The engine is closed when [`close`](Self::close) is awaited or, failing
/// that, when the session is dropped.
pub struct BrowserSession {
    cmd_tx: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
}

impl BrowserSession {
    /// Spawn the worker thread and build the engine on it.
    ///
    /// Resolves once the engine is up; a factory error is returned as-is and
    /// leaves no thread behind.
    pub async fn spawn<E, F>(factory: F) -> Result<Self>
    where
        E: CaptureEngine + 'static,
        F: FnOnce() -> Result<E> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        let worker = thread::Builder::new()
            .name("diagshot-browser".into())
            .spawn(move || {
                let mut engine = match factory() {
                    Ok(e) => e,
                    Err(err) => {
                        let _ = init_tx.send(Err(err));
                        return;
                    }
                };
                let _ = init_tx.send(Ok(()));

                // Command loop; a closed channel means the session was dropped.
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Goto(url, resp) => {
                            let _ = resp.send(engine.load_url(&url));
                        }
                        Command::WaitFor(selector, timeout, resp) => {
                            let _ = resp.send(engine.wait_for_element(&selector, timeout));
                        }
                        Command::Capture(selector, resp) => {
                            let _ = resp.send(engine.capture_element_png(&selector));
                        }
                        Command::Close(resp) => {
                            let _ = resp.send(engine.close());
                            return;
                        }
                    }
                }

                debug!("session dropped without close; shutting engine down");
                if let Err(e) = engine.close() {
                    warn!("engine close failed: {}", e);
                }
            })
            .map_err(|e| Error::LaunchError(format!("Failed to spawn browser worker: {}", e)))?;

        let mut session = Self {
            cmd_tx: Some(cmd_tx),
            worker: Some(worker),
        };

        match init_rx.await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(e)) => {
                session.join_worker();
                Err(e)
            }
            Err(e) => {
                session.join_worker();
                Err(Error::LaunchError(format!("Worker init canceled: {}", e)))
            }
        }
    }

    /// Navigate to a URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Goto(url.to_string(), tx))?;
        rx.await
            .map_err(|e| Error::WorkerGone(format!("Goto canceled: {}", e)))?
    }

    /// Wait until `selector` matches an element, bounded by `timeout`
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::WaitFor(selector.to_string(), timeout, tx))?;
        rx.await
            .map_err(|e| Error::WorkerGone(format!("WaitFor canceled: {}", e)))?
    }

    /// Capture the element matching `selector` as PNG bytes
    pub async fn capture(&self, selector: &str) -> Result<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Capture(selector.to_string(), tx))?;
        rx.await
            .map_err(|e| Error::WorkerGone(format!("Capture canceled: {}", e)))?
    }

    /// Shut down the worker and close the browser.
    pub async fn close(mut self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let sent = self.send(Command::Close(tx));
        let res = match sent {
            Ok(()) => rx
                .await
                .map_err(|e| Error::WorkerGone(format!("Close canceled: {}", e)))
                .and_then(|r| r),
            Err(e) => Err(e),
        };
        self.join_worker();
        res
    }

    fn send(&self, cmd: Command) -> Result<()> {
        let tx = self
            .cmd_tx
            .as_ref()
            .ok_or_else(|| Error::WorkerGone("session already closed".into()))?;
        tx.send(cmd)
            .map_err(|_| Error::WorkerGone("browser worker exited".into()))
    }

    fn join_worker(&mut self) {
        // Dropping the sender ends the command loop if Close was never sent.
        self.cmd_tx.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("browser worker panicked");
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.join_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingEngine {
        calls: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
    }

    impl CaptureEngine for CountingEngine {
        fn load_url(&mut self, _url: &str) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if selector == "#missing" {
                return Err(Error::ElementTimeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                    detail: "timed out".into(),
                });
            }
            Ok(())
        }

        fn capture_element_png(&mut self, _selector: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0x89, b'P', b'N', b'G'])
        }

        fn close(self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn engine() -> (CountingEngine, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        (
            CountingEngine {
                calls: calls.clone(),
                closed: closed.clone(),
            },
            calls,
            closed,
        )
    }

    #[tokio::test]
    async fn commands_reach_engine_and_close_releases_it() {
        let (eng, calls, closed) = engine();
        let session = BrowserSession::spawn(move || Ok(eng)).await.unwrap();

        session.goto("file:///tmp/x.html").await.unwrap();
        session
            .wait_for("#a", Duration::from_millis(10))
            .await
            .unwrap();
        let png = session.capture("#a").await.unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let err = session
            .wait_for("#missing", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ElementTimeout { timeout_ms: 10, .. }));

        session.close().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn drop_without_close_still_releases_engine() {
        let (eng, _calls, closed) = engine();
        let session = BrowserSession::spawn(move || Ok(eng)).await.unwrap();
        drop(session);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn factory_error_is_returned() {
        let res = BrowserSession::spawn(|| -> Result<CountingEngine> {
            Err(Error::LaunchError("no chrome".into()))
        })
        .await;
        assert!(matches!(res, Err(Error::LaunchError(msg)) if msg == "no chrome"));
    }
}
