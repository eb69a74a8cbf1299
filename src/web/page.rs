use std::fmt::Write;

use crate::chart::{ChartKind, ChartSpec};
use crate::color::{to_hex, ColorMap};
use crate::data::climate::DataModel;
use crate::state::ChartRequest;

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; color: #222; }
form { margin-bottom: 1em; display: flex; gap: 1em; align-items: end; flex-wrap: wrap; }
label { display: flex; flex-direction: column; font-size: 0.9em; }
.coverage { font-size: 0.9em; color: #555; }
.swatch { display: inline-block; width: 0.8em; height: 0.8em; margin: 0 0.3em 0 1em; }
figure { margin: 0; }";

// ---------------------------------------------------------------------------
// Chart page
// ---------------------------------------------------------------------------

/// Full HTML document: selection form, coverage note and the inline SVG.
pub fn chart_page(chart: &ChartSpec, svg: &str, request: &ChartRequest, model: &DataModel) -> String {
    let title = escape_html(&chart.title);

    let mut indicator_options = String::new();
    for indicator in model.indicators() {
        let selected = if *indicator == request.indicator { " selected" } else { "" };
        let indicator = escape_html(indicator);
        let _ = writeln!(
            indicator_options,
            r#"<option value="{indicator}"{selected}>{indicator}</option>"#
        );
    }

    let mut region_options = String::new();
    for region in model.regions() {
        let _ = writeln!(region_options, r#"<option value="{}">"#, escape_html(region));
    }

    let mut kind_options = String::new();
    for kind in [ChartKind::Line, ChartKind::Bar] {
        let selected = if kind == chart.kind { " selected" } else { "" };
        let _ = writeln!(kind_options, r#"<option value="{kind}"{selected}>{kind}</option>"#);
    }

    let regions_value = escape_html(&request.regions.join(", "));
    let compress_checked = if chart.compress_y_axis { " checked" } else { "" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
{STYLE}
</style>
</head>
<body>
<h1>{title}</h1>
<form method="get" action="/">
<label>Indicator
<select name="indicator">
{indicator_options}</select>
</label>
<label>Regions (comma separated)
<input name="regions" list="regions" value="{regions_value}" size="40">
<datalist id="regions">
{region_options}</datalist>
</label>
<label>Chart
<select name="chart">
{kind_options}</select>
</label>
<label>Compress y axis
<input type="checkbox" name="compress" value="true"{compress_checked}>
</label>
<button type="submit">Show</button>
</form>
{coverage}
<figure>
{svg}
</figure>
</body>
</html>
"#,
        coverage = coverage_note(chart),
    )
}

fn coverage_note(chart: &ChartSpec) -> String {
    let (included, requested) = chart.coverage();
    let mut note = format!(r#"<p class="coverage">{included} of {requested} regions included"#);

    let colors = ColorMap::new(chart.series.iter().map(|s| s.region.as_str()));
    for (name, color) in colors.legend_entries() {
        let _ = write!(
            note,
            r#"<span class="swatch" style="background: {}"></span>{}"#,
            to_hex(color),
            escape_html(&name)
        );
    }
    if !chart.omitted.is_empty() {
        let omitted: Vec<String> = chart.omitted.iter().map(|r| escape_html(r)).collect();
        let _ = write!(note, ". No data for: {}", omitted.join(", "));
    }
    note.push_str("</p>");
    note
}

// ---------------------------------------------------------------------------
// Error page
// ---------------------------------------------------------------------------

/// Generic failure page. Details stay in the server log.
pub fn error_page() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Chart unavailable</title>
</head>
<body>
<h1>Chart unavailable</h1>
<p>The requested climate data could not be charted. <a href="/">Back to the default chart</a>.</p>
</body>
</html>
"#
    .to_string()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
