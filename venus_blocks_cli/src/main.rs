use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar};
use indicatif_log_bridge::LogWrapper;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

use libvenus_blocks::aligner::{write_records_csv, AlignedRecord};
use libvenus_blocks::config::Config;
use libvenus_blocks::manifest::{read_manifest, write_manifest};
use libvenus_blocks::organizer::FileOrganizer;
use libvenus_blocks::process::{create_subsets, process_subset};
use libvenus_blocks::stats::{summarize, write_summary_csv};
use libvenus_blocks::worker_status::WorkerStatus;

fn make_template_config(path: &Path) {
    let config = Config::default();
    let yaml_str = serde_yaml::to_string(&config).unwrap();
    let mut file = File::create(path).expect("Could create template config file!");
    file.write_all(yaml_str.as_bytes())
        .expect("Failed to write yaml data to file!");
}

fn main() {
    // Create a cli
    let matches = Command::new("venus_blocks_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .help("Path to the file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if matches.subcommand_matches("new").is_some() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );

        make_template_config(&config_path);
        log::info!("Done.");
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!(
        "Source Manifest: {}",
        config.source_manifest_path.to_string_lossy()
    );
    log::info!("Data Path: {}", config.data_path.to_string_lossy());
    log::info!("Output Path: {}", config.output_path.to_string_lossy());
    log::info!("Summary Path: {}", config.summary_path.to_string_lossy());
    log::info!("Workers: {}", config.n_threads);

    if !config.is_n_threads_valid() {
        log::error!("Number of workers must be at least 1!");
        return;
    }

    // Organize the raw files into the run tree
    let source_entries = match read_manifest(&config.source_manifest_path) {
        Ok(entries) => entries,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Organizing {} runs...", source_entries.len());
    let organizer = match FileOrganizer::new(&config, &source_entries) {
        Ok(o) => o,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    if let Err(e) = organizer.organize(&config) {
        log::error!("{e}");
        return;
    }
    if let Err(e) = write_manifest(&config.manifest_path, organizer.manifest()) {
        log::error!("{e}");
        return;
    }

    // Deal the runs out to the workers
    let subsets: Vec<_> = create_subsets(&config, organizer.manifest())
        .into_iter()
        .filter(|subset| !subset.is_empty())
        .collect();
    let (tx, rx) = channel::<WorkerStatus>();
    let mut handles = Vec::with_capacity(subsets.len());
    let mut bars: Vec<ProgressBar> = Vec::with_capacity(subsets.len());
    for (worker_id, subset) in subsets.into_iter().enumerate() {
        bars.push(pb_manager.add(ProgressBar::new(100)));
        let worker_config = config.clone();
        let worker_tx = tx.clone();
        handles.push(std::thread::spawn(move || {
            process_subset(worker_config, worker_tx, worker_id, subset)
        }));
    }
    drop(tx);

    // The receive loop ends once every worker has dropped its sender
    for status in rx {
        if let Some(bar) = bars.get(status.worker_id) {
            bar.set_position((status.progress * 100.0) as u64);
            bar.set_message(format!(
                "trial {} run {}",
                status.trial_index, status.file_index
            ));
        }
    }

    let mut records: Vec<AlignedRecord> = Vec::new();
    let mut any_worker_failed = false;
    for handle in handles {
        match handle.join() {
            Ok(Ok(mut worker_records)) => records.append(&mut worker_records),
            Ok(Err(e)) => {
                log::error!("Worker failed with error: {e}");
                any_worker_failed = true;
            }
            Err(_) => {
                log::error!("Failed to join a worker!");
                any_worker_failed = true;
            }
        }
    }
    for bar in &bars {
        bar.finish();
    }

    // Block index is positional, so normalize the output order
    records.sort_by_key(|r| (r.trial_index, r.file_index, r.block_index));

    if let Err(e) = write_records_csv(&config.output_path, &records) {
        log::error!("{e}");
        return;
    }
    log::info!(
        "Wrote {} aligned records to {}.",
        records.len(),
        config.output_path.to_string_lossy()
    );

    let summaries = summarize(&records);
    if let Err(e) = write_summary_csv(&config.summary_path, &summaries) {
        log::error!("{e}");
        return;
    }
    log::info!(
        "Wrote {} block summaries to {}.",
        summaries.len(),
        config.summary_path.to_string_lossy()
    );

    if any_worker_failed {
        log::warn!("Some workers reported failures; check the log for details.");
    }
    log::info!("Done.");
}
