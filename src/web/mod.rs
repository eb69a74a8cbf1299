/// Web layer: one route that turns a query into a chart page.
///
/// ```text
///   GET /?indicator=…&regions=…&chart=…&compress=…
///        │
///        ▼
///   ┌──────────┐
///   │ handlers  │  resolve defaults → DataModel::build_chart → SVG
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   page    │  HTML around the SVG, or the generic 500 page
///   └──────────┘
/// ```

pub mod handlers;
pub mod page;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .with_state(state)
}

/// Serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    log::info!(
        "serving {} records ({} duplicate keys) from {} on http://{addr}/",
        state.model.len(),
        state.model.duplicates(),
        state.model.source()
    );
    axum::serve(listener, router(state))
        .await
        .context("HTTP server stopped")
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::data::climate::DataModel;
    use crate::data::model::{Period, RawRecord};

    fn state() -> AppState {
        let mut records = Vec::new();
        for (region, base) in [("World", 1.0), ("Canada", 2.0)] {
            for year in 2018..=2021 {
                records.push(RawRecord {
                    region: region.into(),
                    indicator: "Temperature".into(),
                    period: Period::year(year),
                    unit: Some("Degree Celsius".into()),
                    value: Some(base + f64::from(year - 2018) * 0.1),
                });
            }
        }
        AppState::new(DataModel::from_records("test", records), &Config::default())
    }

    async fn get_page(uri: &str) -> (StatusCode, String) {
        let response = router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn default_selection_renders_a_chart() {
        let (status, body) = get_page("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<svg"));
        assert!(body.contains("1 of 1 regions included"));
    }

    #[tokio::test]
    async fn query_selects_regions_and_kind() {
        let (status, body) = get_page("/?indicator=Temperature&regions=World,Canada,Atlantis&chart=bar&compress=true").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("2 of 3 regions included"));
        assert!(body.contains("No data for: Atlantis"));
        assert!(body.contains(r#"<option value="bar" selected>bar</option>"#));
        assert!(body.contains(" checked>"));
    }

    #[tokio::test]
    async fn single_region_alias_is_accepted() {
        let (status, body) = get_page("/?region=Canada").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("1 of 1 regions included"));
        assert!(body.contains("Canada"));
    }

    #[tokio::test]
    async fn repeated_query_keys_are_not_rejected() {
        let (status, body) = get_page("/?chart=bar&chart=line").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<option value="bar" selected>bar</option>"#));

        let (status, body) = get_page("/?regions=World&region=Canada").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"name="regions" list="regions" value="World""#));
        assert!(body.contains("1 of 1 regions included"));
    }

    #[tokio::test]
    async fn unknown_indicator_is_a_server_error() {
        let (status, body) = get_page("/?indicator=Sea%20Level").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Chart unavailable"));
        assert!(!body.contains("<svg"));
    }
}
