use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use flapevo_training::GenerationController;
use tracing::info;

use crate::{command::ConfigSourceArg, model::TrainedModel, util::Output};

const REPORT_INTERVAL: u64 = 10;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    #[clap(flatten)]
    source: ConfigSourceArg,
    /// Number of generations to evolve
    #[arg(long, default_value_t = 100)]
    generations: u64,
    /// RNG seed, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,
    /// Population size, overriding the configuration
    #[arg(long)]
    population: Option<usize>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        source,
        generations,
        seed,
        population,
        output,
    } = arg;

    let mut config = source.load()?;
    if let Some(seed) = seed {
        config.seed = Some(*seed);
    }
    if let Some(population) = population {
        config.population_size = *population;
    }
    let mut controller = GenerationController::new(config)
        .with_context(|| format!("Failed to start training with {}", source.label()))?;

    eprintln!(
        "Training {} agents for {generations} generations ({})",
        controller.config().population_size,
        source.label()
    );
    for done in (0..*generations).step_by(usize::try_from(REPORT_INTERVAL)?) {
        let batch = u64::min(REPORT_INTERVAL, generations - done);
        let summaries = controller.run_generations(batch)?;
        if let Some(last) = summaries.last() {
            eprintln!(
                "  Generation #{:4}: best {:10.3}  mean {:10.3}  score {:3}  high score {:3}",
                last.generation, last.best_fitness, last.mean_fitness, last.score, last.high_score,
            );
        }
    }

    let champion = controller
        .champion()
        .context("No generation was completed")?;
    let model = TrainedModel {
        preset: source.label(),
        trained_at: Utc::now(),
        generations: controller.generation(),
        high_score: controller.high_score(),
        fitness: champion.fitness,
        config: controller.config().clone(),
        network: champion.network.clone(),
        last_generation: controller.history().back().copied(),
    };
    Output::save_json(&model, output.clone())?;
    info!(
        generations = model.generations,
        high_score = model.high_score,
        fitness = model.fitness,
        "saved trained model"
    );

    eprintln!();
    eprintln!("Training completed");
    if let Some(path) = output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Trained at: {}", model.trained_at);
    eprintln!("  Generations: {}", model.generations);
    eprintln!("  High score: {}", model.high_score);
    eprintln!(
        "  Best fitness: {:.3} (generation #{})",
        model.fitness, champion.generation
    );

    Ok(())
}
