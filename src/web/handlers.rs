use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use log::{error, info, warn};
use thiserror::Error;

use super::page;
use crate::chart::plot::render_svg;
use crate::data::climate::DataModel;
use crate::error::{DataLoadError, NoDataError, RenderError};
use crate::state::{AppState, ChartRequest};

// ---------------------------------------------------------------------------
// Request boundary errors
// ---------------------------------------------------------------------------

/// Everything that can fail while producing a page. All of it is a data or
/// configuration problem, so each variant maps to the same 500 page.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Load(#[from] DataLoadError),
    #[error(transparent)]
    NoData(#[from] NoDataError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("chart request failed: {self}");
        (StatusCode::INTERNAL_SERVER_ERROR, Html(page::error_page())).into_response()
    }
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Query parameters of `GET /`. Read from raw key/value pairs so repeated
/// keys never reject the request: the first value of a key wins.
#[derive(Debug, Default, PartialEq)]
pub struct ChartQuery {
    pub indicator: Option<String>,
    pub regions: Option<String>,
    pub chart: Option<String>,
    pub compress: Option<String>,
}

impl ChartQuery {
    /// `region` is accepted as an alias of `regions`; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = ChartQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "indicator" => &mut query.indicator,
                "regions" | "region" => &mut query.regions,
                "chart" => &mut query.chart,
                "compress" => &mut query.compress,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }

    /// Checkbox-style flag: `true`, `1`, `on` and `yes` enable it.
    fn compress_flag(&self) -> Option<bool> {
        self.compress.as_deref().map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "on" | "yes"
            )
        })
    }
}

pub async fn index(
    State(state): State<AppState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Html<String>, AppError> {
    let query = match pairs {
        Ok(Query(pairs)) => ChartQuery::from_pairs(pairs),
        Err(rejection) => {
            warn!("unreadable query string ({rejection}); using defaults");
            ChartQuery::default()
        }
    };
    let request = ChartRequest::resolve(
        query.indicator.as_deref(),
        query.regions.as_deref(),
        query.chart.as_deref(),
        query.compress_flag(),
        &state.defaults,
        &state.plot,
    );
    let html = build_page(&state.model, &request, state.chart_size)?;
    Ok(Html(html))
}

/// Chart → SVG → HTML for one resolved request. Shared by the server and
/// the `render` command.
pub fn build_page(
    model: &DataModel,
    request: &ChartRequest,
    size: (u32, u32),
) -> Result<String, AppError> {
    let chart = model
        .build_chart(&request.indicator, &request.regions)?
        .with_properties(&request.plot);
    let (included, requested) = chart.coverage();
    info!(
        "chart '{}' ({}) for {included} of {requested} region(s)",
        request.indicator, chart.kind
    );

    let svg = render_svg(&chart, size)?;
    Ok(page::chart_page(&chart, &svg, request, model))
}
