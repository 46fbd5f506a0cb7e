use std::path::PathBuf;

use clap::{Parser, Subcommand};
use flapevo_training::{Preset, TrainingConfig};

use self::{show_config::ShowConfigArg, train::TrainArg};

mod show_config;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve flap controllers headlessly and report the best network
    Train(#[clap(flatten)] TrainArg),
    /// Print a training configuration as JSON
    ShowConfig(#[clap(flatten)] ShowConfigArg),
}

/// Where a training configuration comes from.
#[derive(Debug, Clone, Default, clap::Args)]
pub(crate) struct ConfigSourceArg {
    /// Built-in parameter set (classic, steady)
    #[arg(long, default_value = "classic", conflicts_with = "config")]
    preset: Preset,
    /// JSON configuration file; missing fields take the classic values
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigSourceArg {
    pub(crate) fn label(&self) -> String {
        match &self.config {
            Some(path) => path.display().to_string(),
            None => self.preset.to_string(),
        }
    }

    pub(crate) fn load(&self) -> anyhow::Result<TrainingConfig> {
        match &self.config {
            Some(path) => crate::util::read_config_file(path),
            None => Ok(self.preset.config()),
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::ShowConfig(arg) => show_config::run(&arg)?,
    }
    Ok(())
}
