use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use common::Language;
use common::config::AppConfig;
use common::submission::Submission;
use common::test_case::TestCase;
use executor::{RunnerSet, ScriptRunner};
use judge::{JudgeOptions, MemoryStore, SubmissionProcessor, SubmissionStore};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

const SUBMISSION_ID: i32 = 1;
const PROBLEM_ID: i32 = 1;

#[derive(Parser)]
#[command(name = "gavel", version, about = "Judge a local submission the way the grading pipeline would")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Judge a source file against a directory of test cases.
    Judge {
        /// Source language: c, cpp, java or python.
        #[arg(long)]
        language: Language,
        /// Source file to judge.
        #[arg(long)]
        source: PathBuf,
        /// Directory holding N.in/N.out test-case pairs.
        #[arg(long)]
        tests: PathBuf,
        /// Per-case time limit in seconds (overrides config).
        #[arg(long)]
        time_limit: Option<u64>,
        /// Memory limit in megabytes (overrides config).
        #[arg(long)]
        memory_limit: Option<u64>,
    },
    /// List supported languages and check their runner scripts.
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load config")?;

    match cli.command {
        Command::Judge {
            language,
            source,
            tests,
            time_limit,
            memory_limit,
        } => judge_command(config, language, &source, &tests, time_limit, memory_limit).await,
        Command::Languages => Ok(languages_command(&config)),
    }
}

async fn judge_command(
    mut config: AppConfig,
    language: Language,
    source: &Path,
    tests: &Path,
    time_limit: Option<u64>,
    memory_limit: Option<u64>,
) -> anyhow::Result<ExitCode> {
    if let Some(secs) = time_limit {
        config.executor.time_limit_secs = secs;
    }
    if let Some(mb) = memory_limit {
        config.executor.memory_limit_mb = mb;
    }

    let source_code = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let test_cases = load_test_cases(tests)?;
    if test_cases.is_empty() {
        bail!(
            "no test cases in {} (expected N.in/N.out pairs)",
            tests.display()
        );
    }

    let runner = ScriptRunner::new(config.executor.clone());
    runner.verify().context("Runner scripts are not usable")?;

    let store = Arc::new(MemoryStore::new());
    let submission = Submission::new(SUBMISSION_ID, 1, PROBLEM_ID, None, source_code, language)?;
    store.create(submission).await?;
    store.add_test_cases(test_cases).await;

    let processor = SubmissionProcessor::new(
        Arc::new(runner),
        store.clone(),
        store.clone(),
        JudgeOptions::from(&config),
    );

    info!(language = %language, source = %source.display(), "judging");
    processor.process(SUBMISSION_ID).await;

    let judged = store
        .get(SUBMISSION_ID)
        .await?
        .context("submission disappeared from the in-memory store")?;

    println!("Status: {}", judged.status);
    println!("Score:  {}", judged.score);
    if let Some(time) = judged.execution_time_ms {
        println!("Time:   {time} ms");
    }
    if let Some(memory) = judged.memory_used_kb {
        println!("Memory: {memory} kB");
    }
    if let Some(result) = &judged.result {
        println!("{result}");
    }

    Ok(if judged.status.is_accepted() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn languages_command(config: &AppConfig) -> ExitCode {
    let runners = RunnerSet::new(&config.executor.runners_dir);
    println!("Runner scripts in {}", runners.dir().display());
    let mut all_ok = true;
    for language in Language::ALL {
        let script = runners.script_for(*language);
        match runners.verify_language(*language) {
            Ok(()) => println!("{:<8} {} (ok)", language.as_str(), script.display()),
            Err(error) => {
                all_ok = false;
                println!("{:<8} {} ({error})", language.as_str(), script.display());
            }
        }
    }
    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Loads `N.in`/`N.out` pairs from a directory, ordered by `N`.
fn load_test_cases(dir: &Path) -> anyhow::Result<Vec<TestCase>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read test directory {}", dir.display()))?;

    let mut numbers: Vec<i32> = vec![];
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("in")
            && let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
            && let Ok(number) = stem.parse::<i32>()
        {
            numbers.push(number);
        }
    }
    numbers.sort_unstable();

    let mut cases = Vec::with_capacity(numbers.len());
    for number in numbers {
        let input_path = dir.join(format!("{number}.in"));
        let output_path = dir.join(format!("{number}.out"));
        let input = std::fs::read_to_string(&input_path)
            .with_context(|| format!("Failed to read {}", input_path.display()))?;
        let expected_output = std::fs::read_to_string(&output_path)
            .with_context(|| format!("Failed to read {}", output_path.display()))?;
        cases.push(TestCase::new(number, PROBLEM_ID, input, expected_output));
    }
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_test_cases_pairs_and_orders_by_number() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2.in"), "two").unwrap();
        std::fs::write(dir.path().join("2.out"), "2").unwrap();
        std::fs::write(dir.path().join("1.in"), "one").unwrap();
        std::fs::write(dir.path().join("1.out"), "1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let cases = load_test_cases(dir.path()).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].id, 1);
        assert_eq!(cases[0].input, "one");
        assert_eq!(cases[1].id, 2);
        assert_eq!(cases[1].expected_output, "2");
    }

    #[test]
    fn test_load_test_cases_missing_out_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1.in"), "one").unwrap();
        assert!(load_test_cases(dir.path()).is_err());
    }
}
