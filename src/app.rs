use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http::{header, HeaderMap, Method};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::errors::AppError;
use crate::routes::{health, valuation};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;
    Router::<AppState>::new()
        .nest("/health", health::router())
        .merge(valuation::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(move |request: Request, next: Next| {
                    enforce_upload_limit(request, next, max_upload_bytes)
                }))
                // Lift axum's built-in 2 MB body cap to the configured
                // limit, otherwise it rejects uploads ours would accept.
                .layer(DefaultBodyLimit::max(max_upload_bytes as usize)),
        )
        .with_state(state)
}

// Oversized POST bodies are refused on their declared length, before the
// handler buffers anything.
async fn enforce_upload_limit(request: Request, next: Next, max_bytes: u64) -> Response {
    let declared = declared_content_length(request.headers());
    if request.method() == Method::POST && declared > max_bytes {
        warn!("⚠️ Rejecting {} byte upload (limit {})", declared, max_bytes);
        return AppError::Validation("File size too large".to_string()).into_response();
    }
    next.run(request).await
}

fn declared_content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use http::{HeaderValue, StatusCode};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::external::price_provider::{PriceProviderError, PriceSnapshotProvider};
    use crate::external::ticker_resolver::{ResolveError, TickerResolver};
    use crate::models::YearlyPrices;
    use crate::services::resolution_cache::ResolutionCache;

    struct UnknownResolver;

    #[async_trait]
    impl TickerResolver for UnknownResolver {
        async fn resolve(&self, _isin: &str) -> Result<Option<String>, ResolveError> {
            Ok(None)
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl PriceSnapshotProvider for EmptyProvider {
        async fn yearly_checkpoints(
            &self,
            _ticker: &str,
            _years: &[i32],
        ) -> Result<YearlyPrices, PriceProviderError> {
            Ok(YearlyPrices::new())
        }
    }

    fn test_state() -> AppState {
        AppState {
            config: AppConfig {
                port: 8000,
                openfigi_api_key: None,
                market_suffixes: vec!["AS".to_string()],
                max_upload_bytes: 5_000_000,
                lookup_concurrency: 4,
                intra_year_checkpoints: true,
            },
            ticker_resolver: Arc::new(UnknownResolver),
            price_provider: Arc::new(EmptyProvider),
            resolution_cache: ResolutionCache::new(),
        }
    }

    const BOUNDARY: &str = "gainscope-test-boundary";

    fn multipart_upload(csv: &str) -> Request {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"csv_file\"; filename=\"transactions.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );
        http::Request::builder()
            .method(Method::POST)
            .uri("/calculate_multi_year_gain/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    // A parseable export padded with repeated rows until it crosses the
    // requested size.
    fn export_of_at_least(bytes: usize) -> String {
        let mut csv = String::from(
            "Datum,Tijd,Product,ISIN,Beurs,Uitvoeringsplaats,Aantal,Koers,,Lokale waarde,,\
             Waarde,,Wisselkoers,Transactiekosten en/of,,Totaal,,Order ID",
        );
        while csv.len() < bytes {
            csv.push('\n');
            csv.push_str(
                "01-02-2021,10:30,VANGUARD S&P 500,IE00B3XXRP09,EAM,EAM,1,100.00,,-100.00,,\
                 -100.00,,1.0,0.00,,-100.00,,f1e2d3",
            );
        }
        csv
    }

    #[tokio::test]
    async fn test_upload_between_builtin_and_configured_limit_is_accepted() {
        // 3 MB: over axum's stock 2 MB body cap, under our 5 MB contract.
        let app = create_app(test_state());
        let response = app
            .oneshot(multipart_upload(&export_of_at_least(3_000_000)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        // The unmapped ISIN fails per holding, not at the transport layer.
        assert_eq!(
            json["results"][0]["error"],
            "Unable to find data for IE00B3XXRP09"
        );
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_with_json_error() {
        let app = create_app(test_state());
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/calculate_multi_year_gain/")
            .header(header::CONTENT_LENGTH, "6000000")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "File size too large");
    }

    #[test]
    fn test_declared_content_length_reads_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("5000001"));
        assert_eq!(declared_content_length(&headers), 5_000_001);
    }

    #[test]
    fn test_missing_or_garbled_length_counts_as_zero() {
        assert_eq!(declared_content_length(&HeaderMap::new()), 0);

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("huge"));
        assert_eq!(declared_content_length(&headers), 0);
    }
}
