use std::sync::Arc;

use crate::chart::{ChartKind, PlotProperties};
use crate::config::{Config, Selection};
use crate::data::climate::DataModel;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared by every request. The model is read-only after load, so cloning
/// the state only bumps the `Arc`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub model: Arc<DataModel>,
    /// Selection used for parameters a request leaves out.
    pub defaults: Selection,
    pub plot: PlotProperties,
    pub chart_size: (u32, u32),
}

impl AppState {
    pub fn new(model: DataModel, config: &Config) -> Self {
        Self {
            model: Arc::new(model),
            defaults: config.defaults.clone(),
            plot: config.plot.clone(),
            chart_size: config.chart_size,
        }
    }
}

// ---------------------------------------------------------------------------
// ChartRequest – a fully resolved selection
// ---------------------------------------------------------------------------

/// What to chart and how, after defaults have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRequest {
    pub indicator: String,
    pub regions: Vec<String>,
    pub plot: PlotProperties,
}

impl ChartRequest {
    /// Fill in whatever the caller left unset from the configured defaults.
    /// An unrecognised chart kind falls back to the default kind.
    pub fn resolve(
        indicator: Option<&str>,
        regions: Option<&str>,
        chart: Option<&str>,
        compress: Option<bool>,
        defaults: &Selection,
        plot: &PlotProperties,
    ) -> Self {
        let indicator = indicator
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| defaults.indicator.clone(), str::to_string);

        let regions = regions
            .map(Selection::parse_regions)
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| defaults.regions.clone());

        let mut plot = plot.clone();
        if let Some(kind) = chart.filter(|k| !k.trim().is_empty()) {
            match kind.parse::<ChartKind>() {
                Ok(kind) => plot.kind = kind,
                Err(e) => log::warn!("{e}; using '{}'", plot.kind),
            }
        }
        if let Some(compress) = compress {
            plot.compress_y_axis = compress;
        }

        ChartRequest {
            indicator,
            regions,
            plot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_take_defaults() {
        let request = ChartRequest::resolve(
            None,
            Some(" , "),
            None,
            None,
            &Selection::default(),
            &PlotProperties::default(),
        );
        assert_eq!(request.indicator, "Temperature");
        assert_eq!(request.regions, ["World"]);
        assert_eq!(request.plot, PlotProperties::default());
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let request = ChartRequest::resolve(
            Some("CO2"),
            Some("World,Brazil"),
            Some("bar"),
            Some(true),
            &Selection::default(),
            &PlotProperties::default(),
        );
        assert_eq!(request.indicator, "CO2");
        assert_eq!(request.regions, ["World", "Brazil"]);
        assert_eq!(request.plot.kind, ChartKind::Bar);
        assert!(request.plot.compress_y_axis);
    }

    #[test]
    fn unknown_chart_kind_keeps_default() {
        let plot = PlotProperties {
            kind: ChartKind::Bar,
            ..PlotProperties::default()
        };
        let request = ChartRequest::resolve(None, None, Some("pie"), None, &Selection::default(), &plot);
        assert_eq!(request.plot.kind, ChartKind::Bar);
    }
}
