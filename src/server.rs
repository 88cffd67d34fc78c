use std::{
    future::IntoFuture,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use axum::{Extension, Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{oneshot, watch},
    task::JoinHandle,
};

use crate::{
    Error, Res,
    api::{self, CallbackState},
    types::AuthorizationCode,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Local redirect listener that lives for a single authorization.
///
/// The listener is shut down as soon as [`CallbackServer::wait_for_code`]
/// returns, whether a code arrived, the callback was rejected or the wait
/// timed out. Dropping the server without waiting also stops it.
///
/// The redirect URI names `localhost`, which browsers may resolve to either
/// loopback address, so the listener takes the port on `127.0.0.1` and, when
/// the host has IPv6, on `[::1]` as well.
pub struct CallbackServer {
    addr: SocketAddr,
    addrs: Vec<SocketAddr>,
    code_rx: oneshot::Receiver<Res<AuthorizationCode>>,
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl CallbackServer {
    /// Binds `127.0.0.1:<port>` and, if possible, `[::1]` on the same port.
    /// Port `0` picks a free port.
    pub async fn start(port: u16, expected_state: impl Into<String>) -> Res<Self> {
        let (code_tx, code_rx) = oneshot::channel();
        let state = Arc::new(CallbackState::new(expected_state, code_tx));

        let app = Router::new()
            .route("/callback", get(api::callback))
            .layer(Extension(state));

        let v4 = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
            .await
            .map_err(|e| {
                Error::Config(format!(
                    "cannot listen for the redirect on port {}: {}",
                    port, e
                ))
            })?;
        let addr = v4.local_addr()?;

        // Same port as the IPv4 listener, so a chosen free port stays valid.
        let v6_addr = SocketAddr::from((Ipv6Addr::LOCALHOST, addr.port()));
        let v6 = match TcpListener::bind(v6_addr).await {
            Ok(listener) => Some(listener),
            Err(e) => {
                tracing::debug!(port = addr.port(), error = %e, "IPv6 loopback unavailable");
                None
            }
        };

        let mut addrs = vec![addr];
        if let Some(listener) = &v6 {
            addrs.push(listener.local_addr()?);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let serve = |listener: TcpListener| {
            let mut shutdown_rx = shutdown_rx.clone();
            axum::serve(listener, app.clone())
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .into_future()
        };
        let v4 = serve(v4);
        let v6 = v6.map(serve);
        let handle = tokio::spawn(async move {
            match v6 {
                Some(v6) => {
                    let (a, b) = tokio::join!(v4, v6);
                    a.and(b)
                }
                None => v4.await,
            }
        });

        tracing::debug!(?addrs, "redirect listener started");
        Ok(Self {
            addr,
            addrs,
            code_rx,
            shutdown_tx,
            handle,
        })
    }

    /// The IPv4 loopback address; its port is the one to put in the
    /// redirect URI.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every address the listener accepts callbacks on.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }

    /// Waits for the first callback, then tears the listener down.
    pub async fn wait_for_code(self, timeout: Duration) -> Res<AuthorizationCode> {
        let Self {
            addr,
            code_rx,
            shutdown_tx,
            mut handle,
            ..
        } = self;

        let outcome = match tokio::time::timeout(timeout, code_rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(Error::Auth(
                "redirect listener stopped before a callback arrived".to_string(),
            )),
            Err(_) => Err(Error::AuthorizationTimedOut(timeout)),
        };

        let _ = shutdown_tx.send(());
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut handle).await {
            Ok(Ok(Ok(()))) => tracing::debug!(%addr, "redirect listener stopped"),
            Ok(Ok(Err(e))) => tracing::debug!(%addr, error = %e, "redirect listener failed"),
            Ok(Err(e)) => tracing::debug!(%addr, error = %e, "redirect listener task failed"),
            Err(_) => {
                handle.abort();
                tracing::debug!(%addr, "redirect listener aborted after grace period");
            }
        }

        outcome
    }
}
