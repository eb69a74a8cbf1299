mod chart;
mod cli;
mod color;
mod config;
mod data;
mod error;
mod state;
mod web;

use anyhow::{Context, Result};
use clap::Parser;

use chart::file::write_plot_file;
use cli::{Cli, Command, RenderArgs};
use config::Config;
use data::climate::DataModel;
use state::{AppState, ChartRequest};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    // Loading may block on a remote fetch, so it happens before any
    // runtime exists.
    let model = DataModel::load(&config.source, &config.columns)
        .with_context(|| format!("loading dataset {}", config.source))?;

    match cli.command {
        None | Some(Command::Serve(_)) => {
            let state = AppState::new(model, &config);
            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            runtime.block_on(web::serve(config.bind, state))
        }
        Some(Command::Render(args)) => render(&model, &config, &args),
    }
}

fn render(model: &DataModel, config: &Config, args: &RenderArgs) -> Result<()> {
    let chart = args.chart.map(|kind| kind.to_string());
    let mut request = ChartRequest::resolve(
        args.indicator.as_deref(),
        args.regions.as_deref(),
        chart.as_deref(),
        args.compress.then_some(true),
        &config.defaults,
        &config.plot,
    );
    if let Some(name) = &args.name {
        request.plot.file_name = name.clone();
    }

    let html = web::handlers::build_page(model, &request, config.chart_size)?;
    let dir = args.out_dir.as_deref().unwrap_or(&config.plot_dir);
    let (path, chars) = write_plot_file(dir, &request.plot.file_name, &html)?;
    println!("Wrote {chars} characters to {}", path.display());
    Ok(())
}
