use super::object::{compile_object, object_path};
use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

/// Outcome of compiling a set of sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSet {
    /// One object per source, in source order.
    pub objects: Vec<PathBuf>,
    /// How many of them the compiler actually ran for.
    pub built: usize,
}

/// Compiles a whitespace-separated list of sources into individual objects,
/// in parallel on a pool owned by this builder.
#[derive(Debug, Clone)]
pub struct ObjectSetBuilder {
    pub config: BuildConfig,
    pub cfiles: String,
}

/// Splits a whitespace-separated path list, dropping empty entries.
pub fn parse_file_list(list: &str) -> Vec<PathBuf> {
    list.split_whitespace().map(PathBuf::from).collect()
}

impl ObjectSetBuilder {
    pub fn new(config: BuildConfig, cfiles: impl Into<String>) -> Self {
        Self {
            config,
            cfiles: cfiles.into(),
        }
    }

    pub fn run(&self) -> Result<ObjectSet> {
        let sources = parse_file_list(&self.cfiles);
        if sources.is_empty() {
            return Err(BuildError::InvalidInput("no source files given".to_string()));
        }
        check_distinct_objects(&self.config, &sources)?;

        let start_time = Instant::now();
        let jobs = self
            .config
            .jobs
            .filter(|j| *j > 0)
            .unwrap_or_else(default_jobs)
            .min(sources.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("craftc-cc-{}", i))
            .build()
            .map_err(|e| {
                BuildError::io(
                    "failed to start compile workers",
                    std::io::Error::other(e),
                )
            })?;

        // First failure stops the siblings without touching the caller's token.
        let mut worker_config = self.config.clone();
        worker_config.cancel = self.config.cancel.child();
        let worker_config = &worker_config;

        let pb = ProgressBar::new(sources.len() as u64);
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Compiling...");

        let results: Vec<Result<(PathBuf, bool)>> = pool.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    let result = compile_object(worker_config, source, Some(&pb));
                    if result.is_err() {
                        worker_config.cancel.cancel();
                    }
                    pb.inc(1);
                    result
                })
                .collect()
        });
        pb.finish_and_clear();

        let mut objects = Vec::with_capacity(results.len());
        let mut built = 0;
        let mut cancelled = false;
        let mut first_error = None;
        for result in results {
            match result {
                Ok((object, rebuilt)) => {
                    if rebuilt {
                        built += 1;
                    }
                    objects.push(object);
                }
                Err(BuildError::Cancelled) => cancelled = true,
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }
        if cancelled {
            return Err(BuildError::Cancelled);
        }

        if built > 0 {
            println!(
                "{} Compiled {} of {} objects in {:.2?}",
                "✓".green(),
                built,
                objects.len(),
                start_time.elapsed()
            );
        } else if self.config.verbose {
            println!("{} Objects up to date", "⚡".green());
        }

        Ok(ObjectSet { objects, built })
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Two sources with the same stem would race on one object file.
fn check_distinct_objects(config: &BuildConfig, sources: &[PathBuf]) -> Result<()> {
    let mut seen: HashMap<PathBuf, &PathBuf> = HashMap::new();
    for source in sources {
        let object = object_path(&config.objdir, source)?;
        if let Some(previous) = seen.insert(object.clone(), source) {
            return Err(BuildError::InvalidInput(format!(
                "{} and {} both compile to {}",
                previous.display(),
                source.display(),
                object.display()
            )));
        }
    }
    Ok(())
}
