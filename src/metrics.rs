use anyhow::Result;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::router::Destination;
use crate::status::Code;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Pipeline decisions
    pub records_routed_total: IntCounterVec,
    pub records_suppressed_total: IntCounter,
    pub write_errors_total: IntCounter,

    // RPC outcomes logged through the status map
    pub rpc_outcomes_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let records_routed_total = IntCounterVec::new(
            Opts::new(
                "cloud_log_records_routed_total",
                "Total number of records written, by destination",
            ),
            &["destination"],
        )?;

        let records_suppressed_total = IntCounter::new(
            "cloud_log_records_suppressed_total",
            "Total number of records dropped by the noise filter",
        )?;

        let write_errors_total = IntCounter::new(
            "cloud_log_write_errors_total",
            "Total number of records that failed to encode or write",
        )?;

        let rpc_outcomes_total = IntCounterVec::new(
            Opts::new(
                "cloud_log_rpc_outcomes_total",
                "Total number of RPC outcomes logged, by status code",
            ),
            &["code"],
        )?;

        // Register all metrics
        registry.register(Box::new(records_routed_total.clone()))?;
        registry.register(Box::new(records_suppressed_total.clone()))?;
        registry.register(Box::new(write_errors_total.clone()))?;
        registry.register(Box::new(rpc_outcomes_total.clone()))?;

        Ok(Metrics {
            registry,
            records_routed_total,
            records_suppressed_total,
            write_errors_total,
            rpc_outcomes_total,
        })
    }

    pub fn record_routed(&self, destination: Destination) {
        self.records_routed_total
            .with_label_values(&[destination.as_str()])
            .inc();
    }

    pub fn routed(&self, destination: Destination) -> u64 {
        self.records_routed_total
            .with_label_values(&[destination.as_str()])
            .get()
    }

    pub fn record_rpc_outcome(&self, code: Option<Code>) {
        let label = code.map_or("unrecognized", |c| c.as_str());
        self.rpc_outcomes_total.with_label_values(&[label]).inc();
    }

    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Start the metrics HTTP server using Hyper 1.x
pub async fn start_metrics_server(
    metrics: Metrics,
    port: u16,
    listen_address: String,
) -> Result<()> {
    let addr = listen_address
        .parse::<std::net::IpAddr>()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let sock_addr = SocketAddr::new(addr, port);

    // Bind first so a busy port fails before the relay starts
    let listener = TcpListener::bind(&sock_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind metrics server to {}: {}", sock_addr, e))?;

    let local_addr = listener.local_addr()?;
    tracing::info!("Metrics server bound to {}", local_addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let metrics = metrics.clone();
                async move { handle_request(req, metrics).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::error!("Error serving connection: {:?}", err);
            }
        });
    }
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    metrics: Metrics,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    Ok(route_request(req.method(), req.uri().path(), &metrics))
}

fn route_request(method: &Method, path: &str, metrics: &Metrics) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/metrics") => match metrics.gather() {
            Ok(body) => {
                let mut response = text_response(StatusCode::OK, body);
                response.headers_mut().insert(
                    hyper::header::CONTENT_TYPE,
                    hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
                );
                response
            }
            Err(e) => {
                tracing::error!("Failed to gather metrics: {}", e);
                text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to gather metrics",
                )
            }
        },
        (&Method::GET, "/health") => text_response(StatusCode::OK, "OK"),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    }
}
