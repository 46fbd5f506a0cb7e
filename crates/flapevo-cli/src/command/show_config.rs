use std::path::PathBuf;

use crate::{command::ConfigSourceArg, util::Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ShowConfigArg {
    #[clap(flatten)]
    source: ConfigSourceArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ShowConfigArg) -> anyhow::Result<()> {
    let ShowConfigArg { source, output } = arg;
    let config = source.load()?;
    config.validate()?;
    Output::save_json(&config, output.clone())
}
