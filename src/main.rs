//! # craftc CLI Entry Point
//!
//! Parses arguments with clap, turns them into one build [`Target`] and runs
//! it. Everything here is plumbing; the build logic lives in the library.
//!
//! ## Commands
//!
//! - `obj`: compile one source file
//! - `objs`: compile several source files in parallel
//! - `static-lib`: compile and archive into a static library
//! - `exe`: compile and link an executable
//! - `completions`: print a shell completion script

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::collections::HashMap;
use std::path::PathBuf;

use craftc::build::{
    CancelToken, ExecutableBuilder, ObjectBuilder, ObjectSetBuilder, StaticLibraryBuilder, Target,
};
use craftc::config::{self, Archiver, BuildConfig, ProjectDefaults};

#[derive(Parser)]
#[command(name = "craftc")]
#[command(about = "A fast, minimal C build tool", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Ignore unknown commands and flags
    #[arg(short, long, global = true)]
    #[allow(dead_code)] // acted on before parsing, see `filter_args`
    ignore: bool,
    /// Force a complete build
    #[arg(short, long, global = true)]
    force: bool,
    /// Number of parallel compile jobs [default: available CPUs]
    #[arg(short, long, global = true)]
    jobs: Option<usize>,
    /// Project defaults file [default: ./craftc.toml if present]
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CompileArgs {
    /// C compiler [default: craftc.toml, then $CC, then cc]
    #[arg(long)]
    cc: Option<String>,
    /// Additional compiler flags
    #[arg(long, allow_hyphen_values = true)]
    cflags: Option<String>,
    /// Output object directory
    #[arg(long)]
    objdir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a single source file to object file
    Obj {
        #[command(flatten)]
        compile: CompileArgs,
        /// C source file
        #[arg(long)]
        cfile: PathBuf,
    },
    /// Compile multiple source files to object files
    Objs {
        #[command(flatten)]
        compile: CompileArgs,
        /// Space-separated list of C source files
        #[arg(long)]
        cfiles: String,
    },
    /// Build a static library from multiple source files
    StaticLib {
        #[command(flatten)]
        compile: CompileArgs,
        /// Space-separated list of C source files
        #[arg(long)]
        cfiles: String,
        /// Library path
        #[arg(long)]
        lib_path: PathBuf,
        /// Archiver [default: craftc.toml, then $AR, then ar]
        #[arg(long)]
        ar: Option<String>,
        /// Archiver mode flags [default: rcs]
        #[arg(long, allow_hyphen_values = true)]
        arflags: Option<String>,
    },
    /// Build an application binary from source files and libraries
    Exe {
        #[command(flatten)]
        compile: CompileArgs,
        /// Space-separated list of C source files
        #[arg(long)]
        cfiles: String,
        /// Executable path
        #[arg(long)]
        exe_path: PathBuf,
        /// Space-separated list of library paths
        #[arg(long)]
        lib_paths: Option<String>,
        /// Additional linker flags
        #[arg(long, allow_hyphen_values = true)]
        ldflags: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() {
    let raw: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().to_string())
        .collect();

    // Scanned before parsing: unknown arguments would make clap bail first.
    let (known, positionals) = flag_table(Cli::command());
    let ignore = has_switch(&raw, "--ignore", 'i', &known);
    let verbose = has_switch(&raw, "--verbose", 'v', &known);

    let args = if ignore {
        filter_args(&raw, &known, &positionals, verbose)
    } else {
        raw
    };

    let cli = Cli::parse_from(args);

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
        return;
    }

    let target = match make_target(&cli) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{} craftc: {:#}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = target.run() {
        eprintln!("{} craftc: cmd `{}` failed: {}", "✗".red(), target.name(), e);
        std::process::exit(1);
    }
}

fn make_target(cli: &Cli) -> Result<Target> {
    let defaults = config::load_defaults(cli.config.as_deref())?;

    let target = match &cli.command {
        Commands::Obj { compile, cfile } => {
            Target::Object(ObjectBuilder::new(build_config(cli, compile, &defaults)?, cfile))
        }
        Commands::Objs { compile, cfiles } => Target::Objects(ObjectSetBuilder::new(
            build_config(cli, compile, &defaults)?,
            cfiles.as_str(),
        )),
        Commands::StaticLib {
            compile,
            cfiles,
            lib_path,
            ar,
            arflags,
        } => {
            let archiver = Archiver {
                program: config::resolve_tool(
                    ar.as_deref(),
                    defaults.ar.as_deref(),
                    "AR",
                    config::DEFAULT_AR,
                    cli.verbose,
                ),
                flags: config::split_flags(
                    arflags
                        .as_deref()
                        .or(defaults.arflags.as_deref())
                        .unwrap_or(config::DEFAULT_ARFLAGS),
                )?,
            };
            Target::StaticLib(
                StaticLibraryBuilder::new(
                    build_config(cli, compile, &defaults)?,
                    cfiles.as_str(),
                    lib_path,
                )
                .with_archiver(archiver),
            )
        }
        Commands::Exe {
            compile,
            cfiles,
            exe_path,
            lib_paths,
            ldflags,
        } => {
            let ldflags = config::split_flags(
                ldflags
                    .as_deref()
                    .or(defaults.ldflags.as_deref())
                    .unwrap_or(""),
            )?;
            Target::Executable(
                ExecutableBuilder::new(
                    build_config(cli, compile, &defaults)?,
                    cfiles.as_str(),
                    exe_path,
                )
                .with_lib_paths(lib_paths.clone().unwrap_or_default())
                .with_ldflags(ldflags),
            )
        }
        Commands::Completions { .. } => {
            return Err(anyhow::anyhow!("completions do not build a target"));
        }
    };
    Ok(target)
}

fn build_config(
    cli: &Cli,
    compile: &CompileArgs,
    defaults: &ProjectDefaults,
) -> Result<BuildConfig> {
    let cc = config::resolve_tool(
        compile.cc.as_deref(),
        defaults.cc.as_deref(),
        "CC",
        config::DEFAULT_CC,
        cli.verbose,
    );
    let cflags = config::split_flags(
        compile
            .cflags
            .as_deref()
            .or(defaults.cflags.as_deref())
            .unwrap_or(""),
    )?;

    Ok(BuildConfig::new(cc, &compile.objdir)
        .with_cflags(cflags)
        .with_force(cli.force)
        .with_verbose(cli.verbose)
        .with_jobs(cli.jobs.or(defaults.jobs))
        .with_cancel(CancelToken::new()))
}

/// Drops every argument the command tree does not know about. Flags that take
/// a value keep the word after them.
fn filter_args(
    args: &[String],
    known: &HashMap<String, bool>,
    positionals: &HashMap<String, usize>,
    verbose: bool,
) -> Vec<String> {
    let Some((program, rest)) = args.split_first() else {
        return Vec::new();
    };
    let mut kept = vec![program.clone()];
    let mut open_positionals = 0;
    let mut iter = rest.iter();

    while let Some(arg) = iter.next() {
        if arg.starts_with('-') && arg.len() > 1 {
            let name = arg.split_once('=').map_or(arg.as_str(), |(n, _)| n);
            match known.get(name) {
                Some(takes_value) => {
                    kept.push(arg.clone());
                    if *takes_value && !arg.contains('=') {
                        if let Some(value) = iter.next() {
                            kept.push(value.clone());
                        }
                    }
                }
                None if is_known_short_cluster(arg, known)
                    || is_attached_short_value(arg, known) =>
                {
                    kept.push(arg.clone())
                }
                None => report_ignored(arg, verbose),
            }
        } else if let Some(count) = positionals.get(arg.as_str()) {
            kept.push(arg.clone());
            open_positionals = *count;
        } else if open_positionals > 0 {
            kept.push(arg.clone());
            open_positionals -= 1;
        } else {
            report_ignored(arg, verbose);
        }
    }
    kept
}

/// Every flag in the command tree (dashed name to whether it takes a value),
/// and the positional count of each subcommand.
fn flag_table(mut cmd: clap::Command) -> (HashMap<String, bool>, HashMap<String, usize>) {
    cmd.build();

    let mut known: HashMap<String, bool> = HashMap::new();
    let mut positionals: HashMap<String, usize> = HashMap::new();
    register_flags(&cmd, &mut known);
    for sub in cmd.get_subcommands() {
        register_flags(sub, &mut known);
        positionals.insert(sub.get_name().to_string(), sub.get_positionals().count());
    }
    (known, positionals)
}

/// Whether a switch was given alone (`-i`, `--ignore`) or inside a cluster (`-vi`).
fn has_switch(args: &[String], long: &str, short: char, known: &HashMap<String, bool>) -> bool {
    args.iter().skip(1).any(|arg| {
        arg == long
            || (is_known_short_cluster(arg, known)
                && arg.strip_prefix('-').is_some_and(|s| s.contains(short)))
    })
}

fn register_flags(cmd: &clap::Command, known: &mut HashMap<String, bool>) {
    for arg in cmd.get_arguments() {
        let takes_value = arg.get_action().takes_values();
        if let Some(long) = arg.get_long() {
            known.insert(format!("--{}", long), takes_value);
        }
        if let Some(short) = arg.get_short() {
            known.insert(format!("-{}", short), takes_value);
        }
    }
}

/// `-vf` style bundles of known switches that take no value.
fn is_known_short_cluster(arg: &str, known: &HashMap<String, bool>) -> bool {
    let Some(shorts) = arg.strip_prefix('-') else {
        return false;
    };
    !shorts.is_empty()
        && !shorts.starts_with('-')
        && shorts
            .chars()
            .all(|c| known.get(&format!("-{}", c)) == Some(&false))
}

/// `-j4` style short flag with its value attached.
fn is_attached_short_value(arg: &str, known: &HashMap<String, bool>) -> bool {
    !arg.starts_with("--")
        && arg.len() > 2
        && arg.is_char_boundary(2)
        && known.get(&arg[..2]) == Some(&true)
}

fn report_ignored(arg: &str, verbose: bool) {
    if verbose {
        eprintln!("{}  Ignoring unknown arg: {:?}", "⚠".yellow(), arg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn filter(args: &[String]) -> Vec<String> {
        let (known, positionals) = flag_table(Cli::command());
        filter_args(args, &known, &positionals, false)
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_filter_drops_unknown_flags_and_words() {
        let args = words("craftc -i --jobserver-auth 3,4 obj --cc gcc --objdir out --cfile a.c -w");
        let kept = filter(&args);
        assert_eq!(
            kept,
            words("craftc -i obj --cc gcc --objdir out --cfile a.c")
        );
    }

    #[test]
    fn test_filter_keeps_values_of_known_flags() {
        let args = words("craftc -i objs --cflags -O2 --cfiles a.c --objdir=out");
        let kept = filter(&args);
        assert_eq!(kept, args);
    }

    #[test]
    fn test_filter_keeps_switch_clusters_and_subcommand_positionals() {
        let args = words("craftc -vi completions bash extra");
        let kept = filter(&args);
        assert_eq!(kept, words("craftc -vi completions bash"));
    }

    #[test]
    fn test_filter_keeps_attached_short_values() {
        let args = words("craftc -i -j4 -Wall objs --cfiles a.c --objdir o");
        let kept = filter(&args);
        assert_eq!(kept, words("craftc -i -j4 objs --cfiles a.c --objdir o"));
    }

    #[test]
    fn test_switches_detected_inside_clusters() {
        let (known, _) = flag_table(Cli::command());
        let args = words("craftc -vi --bogus objs --cfiles a.c --objdir o");
        assert!(has_switch(&args, "--ignore", 'i', &known));
        assert!(has_switch(&args, "--verbose", 'v', &known));
        assert!(!has_switch(&args, "--force", 'f', &known));

        let args = words("craftc -fi objs --cflags -O2 --cfiles a.c --objdir o");
        assert!(has_switch(&args, "--ignore", 'i', &known));
        assert!(!has_switch(&args, "--verbose", 'v', &known));
        assert!(has_switch(&words("craftc --verbose objs"), "--verbose", 'v', &known));
    }

    #[test]
    fn test_filtered_args_parse() {
        let args = words(
            "craftc --ignore -f --unknown exe --cc cc --objdir o --cfiles m.c --exe-path app",
        );
        let cli = Cli::try_parse_from(filter(&args)).unwrap();
        assert!(cli.force);
        assert!(matches!(cli.command, Commands::Exe { .. }));
    }
}
