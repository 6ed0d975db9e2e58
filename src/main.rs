use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dinnerbell=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli::run() {
        cli::RunOutcome::Serve(config) => {
            if let Err(err) = dinnerbell::serve(config).await {
                tracing::error!(error = %err, "server stopped");
                std::process::exit(1);
            }
        }
        cli::RunOutcome::RunOnce(config) => match dinnerbell::run_once(&config).await {
            Ok(dinnerbell::RunOutcome::Sent(report)) => {
                println!(
                    "sent suggestion for {} to {} device(s)",
                    report.date, report.delivered
                );
            }
            Ok(dinnerbell::RunOutcome::Skipped(reason)) => println!("skipped: {reason}"),
            Err(err) => {
                tracing::error!(error = %err, "dinner suggestion run failed");
                std::process::exit(1);
            }
        },
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    }
}
