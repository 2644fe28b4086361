use anyhow::{bail, Context};
use labelcraft::config::ConfigManager;
use labelcraft::data::CsvConnector;
use labelcraft::labeling::builtin;
use labelcraft::SearchEngine;

const USAGE: &str = "usage: labelcraft <config.toml> <events.csv> [labels.csv]";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, events_path, output_path) = match args.as_slice() {
        [config, events] => (config, events, None),
        [config, events, output] => (config, events, Some(output)),
        _ => bail!(USAGE),
    };

    let manager = ConfigManager::new();
    manager
        .load_from_file(config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;
    let config = manager.get();

    let (events, dataset) = CsvConnector::load_events(events_path, &config.columns.entity, &config.columns.time)
        .with_context(|| format!("loading events from {}", events_path))?;
    log::info!(
        "{} events for {} entities in {}",
        dataset.num_rows,
        dataset.num_entities,
        dataset.file_path
    );

    let function = builtin::aggregate(config.label.aggregation, config.label.column.as_deref())?;
    let engine = SearchEngine::new(&config.columns.entity, &config.columns.time, function);
    let labels = engine.search(&events, &config.search)?;

    println!("{}", labels.describe());

    if let Some(path) = output_path {
        labels
            .write_csv(path)
            .with_context(|| format!("writing labels to {}", path))?;
    }
    Ok(())
}
