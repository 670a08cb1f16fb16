use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};

use sos::config::SosConfig;
use sos::format::{OutputFormat, render_blocks, render_header};
use sos::hash::{ProgressIndicator, hash_file};
use sos::merge::{ConflictPrompt, ConsolePrompt, MergeOutcome, NonInteractive, merge};
use sos::model::{ChangeSet, MergePolicy};
use sos::rename::{apply_moves, match_filename, plan_renames, tokenize};
use sos::telemetry;
use sos::text::TextSource;

/// Snapshot-based version control: diff, merge and rename engine
///
/// Compares and merges two versions of a text file, hashes file content
/// for content-addressed storage, detects moved files in a changeset and
/// plans glob-based batch renames.
///
/// MERGE DIRECTION:
///   OTHER is merged into CURRENT. Lines only in CURRENT are "inserted",
///   lines only in OTHER are "removed" (like diff's +/- marks).
///
/// POLICIES:
///   insert  keep inserted lines and bring in removed ones
///   remove  drop inserted lines, do not bring in removed ones
///   both    drop inserted lines, bring in removed ones; replacements keep CURRENT
///   ask     prompt for every replacement
#[derive(Parser)]
#[command(name = "sos")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'sos <command> --help' for more information on a specific command.")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "SOS_CONFIG", default_value = "sos.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List changed blocks between two files
    Diff {
        /// The other (older) version
        other: PathBuf,
        /// The current version
        current: PathBuf,
        /// Treat lines differing only in whitespace as equal
        #[arg(long)]
        ignore_whitespace: bool,
        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
        /// Cut listed lines to this many characters
        #[arg(long)]
        width: Option<usize>,
    },

    /// Merge OTHER into CURRENT
    ///
    /// Writes the result to stdout unless --output is given. Defaults come
    /// from the [merge] section of the configuration.
    Merge {
        /// The other version
        other: PathBuf,
        /// The current version
        current: PathBuf,
        /// Policy for line blocks
        #[arg(long)]
        policy: Option<MergePolicy>,
        /// Policy for characters in single-line replacements
        #[arg(long)]
        char_policy: Option<MergePolicy>,
        /// Treat lines differing only in whitespace as equal
        #[arg(long)]
        ignore_whitespace: bool,
        /// Use OTHER's line endings for the output
        #[arg(long)]
        use_other_eol: bool,
        /// Write the merge result to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the SHA-256 of a file, optionally storing a copy
    Hash {
        /// File to hash
        file: PathBuf,
        /// Store a copy at this path (must not exist)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Gzip the stored copy (default from configuration)
        #[arg(long)]
        compress: bool,
    },

    /// Detect moves in a JSON changeset and print it with moves filled in
    Moves {
        /// Changeset file (JSON)
        changeset: PathBuf,
    },

    /// Plan a glob-based batch rename
    ///
    /// Without explicit FILES, every non-ignored file in --dir matching OLD
    /// is planned.
    MvPlan {
        /// Source pattern, e.g. "report_*.csv"
        old: String,
        /// Target pattern, e.g. "archive/report_*.csv.bak"
        new: String,
        /// Candidate file names
        files: Vec<String>,
        /// Folder to list candidates from
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Print the best order even if a rename would overwrite a source
        #[arg(long)]
        allow_conflicts: bool,
    },
}

fn main() -> Result<()> {
    let _telemetry = telemetry::init();
    let cli = Cli::parse();
    let config = SosConfig::load(&cli.config)?;

    match cli.command {
        Commands::Diff {
            other,
            current,
            ignore_whitespace,
            format,
            width,
        } => run_diff(&config, &other, &current, ignore_whitespace, format, width),
        Commands::Merge {
            other,
            current,
            policy,
            char_policy,
            ignore_whitespace,
            use_other_eol,
            output,
        } => {
            let mut options = config.merge.options(false);
            options.policy = policy.unwrap_or(options.policy);
            options.char_policy = char_policy.unwrap_or(options.char_policy);
            options.ignore_whitespace |= ignore_whitespace;
            options.use_other_eol |= use_other_eol;
            let asks = options.policy == MergePolicy::Ask || options.char_policy == MergePolicy::Ask;
            let mut prompt: Box<dyn ConflictPrompt> = if asks {
                Box::new(ConsolePrompt::stdio())
            } else {
                Box::new(NonInteractive)
            };
            let outcome = merge(
                TextSource::Path(&other),
                TextSource::Path(&current),
                &options,
                prompt.as_mut(),
            )?;
            let Some(content) = outcome.into_content() else {
                bail!("merge returned blocks instead of content");
            };
            write_output(output.as_deref(), &content)
        }
        Commands::Hash {
            file,
            store,
            compress,
        } => run_hash(&config, &file, store.as_deref(), compress),
        Commands::Moves { changeset } => {
            let text = std::fs::read_to_string(&changeset)
                .with_context(|| format!("cannot read {}", changeset.display()))?;
            let mut changes: ChangeSet = serde_json::from_str(&text)
                .with_context(|| format!("invalid changeset {}", changeset.display()))?;
            let found = apply_moves(&mut changes);
            tracing::info!(found, "move detection finished");
            println!("{}", OutputFormat::Json.serialize(&changes)?);
            Ok(())
        }
        Commands::MvPlan {
            old,
            new,
            files,
            dir,
            allow_conflicts,
        } => {
            let files = if files.is_empty() {
                list_candidates(&config, &dir, &old)?
            } else {
                files
            };
            for (source, target) in plan_renames(&files, &old, &new, !allow_conflicts)? {
                println!("{source} -> {target}");
            }
            Ok(())
        }
    }
}

fn run_diff(
    config: &SosConfig,
    other: &Path,
    current: &Path,
    ignore_whitespace: bool,
    format: OutputFormat,
    width: Option<usize>,
) -> Result<()> {
    let mut options = config.merge.options(true);
    options.ignore_whitespace |= ignore_whitespace;
    let outcome = merge(
        TextSource::Path(other),
        TextSource::Path(current),
        &options,
        &mut NonInteractive,
    )?;
    let MergeOutcome::Blocks { blocks, eol } = outcome else {
        bail!("diff returned merged content instead of blocks");
    };
    match format {
        OutputFormat::Json => println!("{}", format.serialize(&blocks)?),
        OutputFormat::Text => {
            println!(
                "{}",
                render_header(&current.display().to_string(), &blocks, eol)
            );
            print!("{}", render_blocks(&blocks, width));
        }
    }
    Ok(())
}

fn run_hash(config: &SosConfig, file: &Path, store: Option<&Path>, compress: bool) -> Result<()> {
    let compress = compress || config.compress;
    let mut stderr = std::io::stderr();
    let mut progress = ProgressIndicator::new(config.progress_symbols()).on_tick(|symbol| {
        let _ = write!(stderr, "\r{symbol}");
        let _ = stderr.flush();
    });
    let result = hash_file(file, compress, store, Some(&mut progress))?;
    drop(progress);
    eprint!("\r");
    if store.is_some() {
        println!("{}  {} ({} bytes stored)", result.digest, file.display(), result.written);
    } else {
        println!("{}  {}", result.digest, file.display());
    }
    Ok(())
}

/// Non-ignored files in `dir` matching `pattern`, relative to `dir`.
///
/// Names the `glob` crate lists but the rename matcher rejects are skipped,
/// so one odd name cannot fail the whole plan.
fn list_candidates(config: &SosConfig, dir: &Path, pattern: &str) -> Result<Vec<String>> {
    let tokens = tokenize(pattern)?;
    let full = dir.join(pattern);
    let full = full.to_str().context("pattern path is not valid UTF-8")?;
    let mut names = Vec::new();
    for entry in glob::glob(full).with_context(|| format!("invalid pattern '{pattern}'"))? {
        let path = entry?;
        if !path.is_file() {
            continue;
        }
        let relative = path.strip_prefix(dir).unwrap_or(&path);
        let name = relative.to_string_lossy().replace('\\', "/");
        let base = relative
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        if config.is_ignored(&base) {
            tracing::debug!(%name, "skipping ignored file");
            continue;
        }
        if let Err(e) = match_filename(&name, &tokens) {
            tracing::debug!(%name, error = %e, "skipping file the rename pattern does not bind");
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn write_output(output: Option<&Path>, content: &[u8]) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("cannot write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content)?;
            stdout.flush()?;
            Ok(())
        }
    }
}
