use clap::Parser;
use energy_calculator::config::AppSettings;
use energy_calculator::{prepare_pipeline, watch_and_process};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CalculatorArgs {
    #[arg(long, short, help = "Path to settings file in .json format")]
    config: Option<PathBuf>,
    #[arg(long, short, help = "Path to reference data file in .xml format")]
    reference_data: Option<String>,
    #[arg(long, short, help = "Directory to watch for generation reports")]
    input: Option<String>,
    #[arg(long, short, help = "Directory to write results to")]
    output: Option<String>,
    #[arg(long, help = "Process a single generation report and exit")]
    once: Option<PathBuf>,
    #[clap(long, default_value_t = tracing::Level::INFO, help = "Most verbose level to log")]
    log_level: tracing::Level,
    #[clap(long, default_value_t = false, help = "Whether to log out spans")]
    log_spans: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CalculatorArgs::parse();

    // set up basic tracing
    let tracing_subscriber = {
        let mut builder = tracing_subscriber::fmt::fmt().with_max_level(args.log_level);

        if args.log_spans {
            builder = builder.with_span_events(FmtSpan::CLOSE);
        }

        builder.finish()
    };
    tracing::subscriber::set_global_default(tracing_subscriber)?;

    let settings = AppSettings::load(args.config.as_deref())?
        .with_overrides(args.reference_data, args.input, args.output)
        .resolve()?;

    match args.once {
        Some(report_file) => {
            let pipeline = prepare_pipeline(&settings)?;
            let summary = pipeline.process_file(&report_file)?;
            info!(
                "Processed {}: {} totals, {} max emission days, {} heat rates",
                report_file.display(),
                summary.totals,
                summary.max_emission_days,
                summary.heat_rates
            );
        }
        None => {
            let stats = watch_and_process(&settings, shutdown_signal()).await?;
            info!(
                "Stopped after processing {} reports and skipping {}",
                stats.processed, stats.skipped
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
