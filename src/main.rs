use std::{future::IntoFuture, process, sync::Arc};

use folio::{
    application::{
        error::AppError,
        posts::PostService,
        session::{Credentials, SessionGate, log_session_events},
    },
    config::{self, Command, Settings},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        store, telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or_else(|| Command::Serve(Box::default()));

    telemetry::init(&settings.logging)?;

    match command {
        Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let handles = store::build(&settings.store)?;
    let posts = Arc::new(PostService::new(handles.posts, handles.blobs));

    if !settings.auth.is_configured() {
        warn!(
            target = "folio::serve",
            "admin credentials are not configured; admin login is disabled"
        );
    }
    let session = Arc::new(SessionGate::new(Credentials::new(
        settings.auth.username.clone(),
        settings.auth.password.clone(),
    )));
    let session_log = tokio::spawn(log_session_events(session.subscribe()));

    let state = HttpState {
        posts,
        session,
        site: Arc::new(settings.site.profile.clone()),
        redirect_delay: settings.site.redirect_delay,
        upload_limit_bytes: usize::try_from(settings.uploads.max_request_bytes.get())
            .unwrap_or(usize::MAX),
        media: handles.media,
    };

    let result = serve_http(&settings, state).await;

    session_log.abort();
    let _ = session_log.await;

    result
}

async fn serve_http(settings: &Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "folio::serve",
        addr = %settings.server.addr,
        backend = settings.store.backend.name(),
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.notified().await }
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    let drain_deadline = async move {
        shutdown_signal().await;
        info!(
            target = "folio::serve",
            grace_seconds = grace.as_secs(),
            "shutting down"
        );
        shutdown.notify_one();
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = drain_deadline => {
            warn!(
                target = "folio::serve",
                "in-flight requests did not finish before the shutdown deadline"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "folio::serve", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "folio::serve", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
