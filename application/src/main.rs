use std::{
    future::IntoFuture as _,
    io,
    sync::{Arc, OnceLock},
    time,
};

use application::{api, config, graphql, Args, Config, UserIdHeader};
use axum::{
    extract::MatchedPath,
    routing::{on, MethodFilter},
    Extension, Router,
};
use axum_client_ip::InsecureClientIp;
use axum_extra::headers::Header as _;
use juniper::EmptySubscription;
use service::{
    infra::{postgres, Postgres},
    Service,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing as log;
use tracing_subscriber::{
    filter::{filter_fn, FilterFn},
    fmt::MakeWriter,
    layer::{Layer, SubscriberExt as _},
    registry::LookupSpan,
    util::SubscriberInitExt as _,
};

/// Levels written to `stderr` rather than `stdout`.
const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

/// Maximum level to log, known only once the [`Config`] is loaded.
static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(log_layer(io::stdout, false))
        .with(log_layer(io::stderr, true))
        .init();

    _ = run().await;
}

/// Creates a compact log [`Layer`] writing into the provided `writer` either
/// the [`STDERR_LEVELS`] or all the others.
fn log_layer<S, W>(writer: W, stderr: bool) -> impl Layer<S>
where
    S: log::Subscriber + for<'s> LookupSpan<'s>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    tracing_subscriber::fmt::layer()
        .compact()
        .with_ansi(true)
        .with_thread_names(true)
        .with_writer(writer)
        .with_filter(level_filter(stderr))
}

/// Passes spans and the events of the configured [`LOG_LEVEL`] belonging to
/// the requested output.
fn level_filter(
    stderr: bool,
) -> FilterFn<impl Fn(&log::Metadata<'_>) -> bool> {
    filter_fn(move |meta| {
        if meta.is_span() {
            return true;
        }
        let max = LOG_LEVEL.get().copied().unwrap_or(log::Level::INFO);
        STDERR_LEVELS.contains(meta.level()) == stderr && max >= *meta.level()
    })
}

async fn run() -> Result<(), ()> {
    let Args { config } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        server,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    if LOG_LEVEL.set(log.level.into()).is_err() {
        log::warn!("log level is already set");
    }

    let mut postgres = Postgres::new(&postgres.into()).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;
    let report = migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;
    for m in report.applied_migrations() {
        log::info!("applied migration `{m}`");
    }

    let schema =
        api::Schema::new(api::Query, api::Mutation, EmptySubscription::new());

    let app = Router::new()
        .route(
            "/graphql",
            on(MethodFilter::GET.or(MethodFilter::POST), graphql),
        )
        .layer(Extension(Arc::new(schema)))
        .layer(Extension(Service::new(postgres)))
        .layer(cors(&server.cors)?);
    let app = with_tracing(app);

    let addr = format!("{}:{}", server.host, server.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        log::error!("failed to listen on `{addr}`: {e}");
    })?;
    log::info!("listening on `{addr}`");

    axum::serve(listener, app)
        .into_future()
        .await
        .map_err(|e| log::error!("webserver failed: {e}"))
}

/// Builds a [`CorsLayer`] allowing the configured origins to send GraphQL
/// requests on behalf of a user.
fn cors(conf: &config::Cors) -> Result<CorsLayer, ()> {
    conf.origins.iter().try_fold(
        CorsLayer::new()
            .allow_methods([
                http::Method::GET,
                http::Method::OPTIONS,
                http::Method::POST,
            ])
            .allow_headers([
                http::header::CONTENT_TYPE,
                UserIdHeader::name().clone(),
            ]),
        |cors, origin| {
            origin
                .parse::<http::HeaderValue>()
                .map(|o| cors.allow_origin(o))
                .map_err(|e| {
                    log::error!("`{origin}` is not a valid CORS origin: {e}");
                })
        },
    )
}

/// Wraps every HTTP request to the provided [`Router`] into a span and logs
/// its outcome.
fn with_tracing(app: Router) -> Router {
    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|r: &http::Request<_>| {
                let headers = r.headers();
                log::info_span!(
                    "HTTP request",
                    http.client_ip =
                        InsecureClientIp::from(headers, r.extensions())
                            .map(|ip| ip.0.to_string())
                            .ok(),
                    http.flavor = ?r.version(),
                    http.host = r.uri().host(),
                    http.method = r.method().as_str(),
                    http.route = r
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str),
                    http.target = r
                        .uri()
                        .path_and_query()
                        .map(http::uri::PathAndQuery::as_str),
                    http.user_id = headers
                        .get(UserIdHeader::name())
                        .and_then(|h| h.to_str().ok()),
                    http.user_agent = headers
                        .get(http::header::USER_AGENT)
                        .and_then(|h| h.to_str().ok()),
                    http.status_code = log::field::Empty,
                )
            })
            .on_response(
                |r: &http::Response<_>,
                 dur: time::Duration,
                 span: &log::Span| {
                    let status = r.status();
                    _ = span.record("http.status_code", status.as_u16());

                    let duration = format!("{}ms", dur.as_millis());
                    if status.is_client_error() || status.is_server_error() {
                        log::error!(duration = duration.as_str());
                    } else {
                        log::info!(duration = duration.as_str());
                    }
                },
            ),
    )
}
