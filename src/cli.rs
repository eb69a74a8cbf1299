use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::chart::ChartKind;
use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "climate-charts", version, about = "Chart climate indicators in the browser")]
pub struct Cli {
    /// JSON config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Dataset path or http(s) URL; overrides the config file.
    #[arg(long, global = true)]
    pub data: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the dataset and serve charts over HTTP (default).
    Serve(ServeArgs),
    /// Write one chart page to an HTML file.
    Render(RenderArgs),
}

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Debug, Default, Args)]
pub struct RenderArgs {
    #[arg(long)]
    pub indicator: Option<String>,

    /// Comma-separated region names.
    #[arg(long)]
    pub regions: Option<String>,

    /// `line` or `bar`.
    #[arg(long)]
    pub chart: Option<ChartKind>,

    /// Tighten the y axis around the data.
    #[arg(long)]
    pub compress: bool,

    /// Output directory; defaults to the configured plot directory.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// File name without the `.html` suffix.
    #[arg(long)]
    pub name: Option<String>,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(data) = &self.data {
            config.source = data.clone();
        }
        if let Some(Command::Serve(ServeArgs { bind: Some(bind) })) = &self.command {
            config.bind = *bind;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "climate-charts",
            "--data",
            "other.csv",
            "serve",
            "--bind",
            "0.0.0.0:9000",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.source, "other.csv");
        assert_eq!(config.bind.port(), 9000);
    }

    #[test]
    fn render_arguments_parse() {
        let cli = Cli::parse_from([
            "climate-charts",
            "render",
            "--indicator",
            "CO2",
            "--regions",
            "World,Brazil",
            "--chart",
            "bar",
            "--compress",
        ]);
        match cli.command {
            Some(Command::Render(args)) => {
                assert_eq!(args.indicator.as_deref(), Some("CO2"));
                assert_eq!(args.chart, Some(ChartKind::Bar));
                assert!(args.compress);
            }
            other => panic!("expected render, got {other:?}"),
        }
    }
}
