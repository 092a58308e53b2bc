//! Churn Sentinel - Main Entry Point
//!
//! Customer churn prediction from the command line.

use clap::{CommandFactory, Parser};
use churn_sentinel::cli::{
    cmd_compare, cmd_importance, cmd_info, cmd_predict, cmd_predict_one, cmd_train, cmd_verify,
    Cli, Commands,
};
use churn_sentinel::config::ChurnConfig;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churn_sentinel=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = ChurnConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Train { data, smote, cv_folds, models }) => {
            cmd_train(&config, data, smote, cv_folds, &models)?;
        }
        Some(Commands::Predict { data, output, model, threshold }) => {
            cmd_predict(&config, &data, output.as_deref(), model.as_deref(), threshold)?;
        }
        Some(Commands::PredictOne { customer, model, json }) => {
            cmd_predict_one(&config, customer, model.as_deref(), json)?;
        }
        Some(Commands::Compare) => {
            cmd_compare(&config)?;
        }
        Some(Commands::Importance { top, model }) => {
            cmd_importance(&config, top, model.as_deref())?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(&config, data.as_deref())?;
        }
        Some(Commands::Verify) => {
            if !cmd_verify(&config)? {
                std::process::exit(1);
            }
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
