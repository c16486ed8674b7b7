//! Local upstream for integration tests.
//!
//! Binds 127.0.0.1:0 first so routes can embed absolute URLs to themselves,
//! then serves an axum router and counts every request it sees.

#![allow(dead_code)]

use axum::{Router, extract::Request, middleware::Next};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::net::TcpListener;

pub struct Upstream {
    listener: TcpListener,
    base: String,
}

impl Upstream {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().unwrap().port();
        Self {
            listener,
            base: format!("http://127.0.0.1:{}", port),
        }
    }

    /// Absolute URL for `path` on this upstream.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Serve `router` in the background; returns the request counter.
    pub fn serve(self, router: Router) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = router.layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    next.run(req).await
                }
            },
        ));

        tokio::spawn(async move {
            axum::serve(self.listener, app).await.unwrap();
        });
        hits
    }
}

/// A port with nothing listening on it.
pub fn closed_port_url(path: &str) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, path)
}
