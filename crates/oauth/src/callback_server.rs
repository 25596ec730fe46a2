use std::{
    net::{Ipv4Addr, Ipv6Addr},
    sync::Arc,
    time::Duration,
};

use {
    axum::{
        Router,
        extract::{RawQuery, State},
        http::StatusCode,
        response::Html,
        routing::get,
    },
    monzo_common::{Error, Result},
    tokio::{
        net::TcpListener,
        sync::{Mutex, oneshot, watch},
        task::JoinHandle,
    },
    tracing::{debug, warn},
};

use crate::types::CallbackOutcome;

/// Path the authorization server redirects the browser to.
pub const CALLBACK_PATH: &str = "/callback";

/// How long to wait for the user to finish in the browser.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// How long a graceful shutdown may take before the listener tasks are aborted.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    outcome_tx: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

#[derive(Debug, Default)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    /// Parse the raw query string. The first value wins when a key repeats.
    fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// Short-lived local HTTP listener that captures the OAuth redirect.
///
/// Listens on `127.0.0.1` and, when available, on `::1` at the same port, so
/// a redirect to `localhost` lands whichever address the browser picks.
/// The first request to [`CALLBACK_PATH`] resolves the pending outcome; later
/// requests still get a page but signal nothing. The listeners are released
/// by [`CallbackServer::shutdown`] or, failing that, when the value is dropped.
pub struct CallbackServer {
    port: u16,
    outcome_rx: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind `127.0.0.1:port` and start serving in the background. Port `0`
    /// picks a free port; see [`CallbackServer::port`].
    pub async fn bind(port: u16, expected_state: &str) -> Result<Self> {
        let v4 = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
            .await
            .map_err(|source| Error::ListenerBindFailed { port, source })?;
        let port = v4
            .local_addr()
            .map_err(|source| Error::ListenerBindFailed { port, source })?
            .port();

        let mut listeners = vec![v4];
        match TcpListener::bind((Ipv6Addr::LOCALHOST, port)).await {
            Ok(v6) => listeners.push(v6),
            Err(e) => debug!(port, error = %e, "IPv6 loopback unavailable for OAuth callback"),
        }

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(CallbackState {
                expected_state: Arc::from(expected_state),
                outcome_tx: Arc::new(Mutex::new(Some(outcome_tx))),
            });

        let tasks = listeners
            .into_iter()
            .map(|listener| {
                let app = app.clone();
                let mut shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                        let _ = shutdown_rx.wait_for(|stop| *stop).await;
                    });
                    if let Err(e) = server.await {
                        warn!(error = %e, "OAuth callback listener failed");
                    }
                })
            })
            .collect::<Vec<_>>();

        debug!(port, listeners = tasks.len(), "OAuth callback listener started");

        Ok(Self {
            port,
            outcome_rx: Some(outcome_rx),
            shutdown_tx,
            tasks,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the redirect, returning the authorization code.
    ///
    /// Resolves at most once; a second call fails with `NoCodeReceived`.
    pub async fn wait(&mut self, timeout: Duration) -> Result<String> {
        let outcome_rx = self.outcome_rx.take().ok_or(Error::NoCodeReceived)?;

        let outcome = match tokio::time::timeout(timeout, outcome_rx).await {
            Ok(Ok(outcome)) => outcome,
            // The listener task went away without signalling.
            Ok(Err(_)) => return Err(Error::NoCodeReceived),
            Err(_) => return Err(Error::Timeout { after: timeout }),
        };

        match outcome {
            CallbackOutcome::Code(code) => Ok(code),
            CallbackOutcome::Denied { error, description } => {
                Err(Error::AuthorizationDenied { error, description })
            },
            CallbackOutcome::MissingCode => Err(Error::NoCodeReceived),
            CallbackOutcome::StateMismatch => Err(Error::StateMismatch),
        }
    }

    /// Stop the listeners, waiting at most `grace` for in-flight requests.
    pub async fn shutdown(mut self, grace: Duration) {
        let _ = self.shutdown_tx.send(true);
        let mut tasks = std::mem::take(&mut self.tasks);

        let drained = tokio::time::timeout(grace, async {
            for task in &mut tasks {
                let _ = task.await;
            }
        })
        .await;
        if drained.is_err() {
            warn!(port = self.port, "OAuth callback listener did not stop in time, aborting");
            for task in &tasks {
                task.abort();
            }
        }
        debug!(port = self.port, "OAuth callback listener stopped");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Html<String>) {
    let params = CallbackParams::parse(query.as_deref().unwrap_or_default());
    let outcome = classify(params, &state.expected_state);
    let page = render_page(&outcome);

    match state.outcome_tx.lock().await.take() {
        Some(tx) => {
            if tx.send(outcome).is_err() {
                debug!("OAuth callback arrived after the login stopped waiting");
            }
        },
        None => debug!("ignoring repeated OAuth callback"),
    }

    page
}

fn classify(params: CallbackParams, expected_state: &str) -> CallbackOutcome {
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

    if let Some(error) = non_empty(params.error) {
        return CallbackOutcome::Denied {
            error,
            description: params.error_description.unwrap_or_default(),
        };
    }
    let Some(code) = non_empty(params.code) else {
        return CallbackOutcome::MissingCode;
    };
    if params.state.as_deref() != Some(expected_state) {
        return CallbackOutcome::StateMismatch;
    }
    CallbackOutcome::Code(code)
}

fn render_page(outcome: &CallbackOutcome) -> (StatusCode, Html<String>) {
    let (status, title, detail) = match outcome {
        CallbackOutcome::Code(_) => (
            StatusCode::OK,
            "Authorization Successful!",
            "You can close this window and return to the terminal.".to_string(),
        ),
        CallbackOutcome::Denied { error, description } => (
            StatusCode::BAD_REQUEST,
            "Authorization Failed",
            format!("{}: {}", escape_html(error), escape_html(description)),
        ),
        CallbackOutcome::MissingCode => (
            StatusCode::BAD_REQUEST,
            "Authorization Failed",
            "No authorization code received".to_string(),
        ),
        CallbackOutcome::StateMismatch => (
            StatusCode::BAD_REQUEST,
            "Authorization Failed",
            "State mismatch. Please restart the login from the terminal.".to_string(),
        ),
    };
    (
        status,
        Html(format!(
            "<html><body><h1>{title}</h1><p>{detail}</p></body></html>"
        )),
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
