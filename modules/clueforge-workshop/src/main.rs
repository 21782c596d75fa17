use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Gateway;
use clueforge_checks::{RuleAuditor, WordListLexicon};
use clueforge_common::{BatchPlan, Config, MechanismFilter, PipelinePolicy, RefereeMode};
use clueforge_workshop::{
    pool_loader, BatchScheduler, ClueLifecycle, LlmWorkshop, RunReport, WordSupply,
};

#[derive(Parser)]
#[command(name = "clueforge", about = "Generate and check cryptic crossword clues")]
struct Cli {
    /// Stop once this many clues have passed
    #[arg(long, default_value_t = 10)]
    target: usize,

    /// Words drawn per batch
    #[arg(long, default_value_t = 5)]
    batch_size: usize,

    /// Candidates in flight at once
    #[arg(long, default_value_t = 3)]
    concurrency: usize,

    /// Comma-separated mechanisms to cycle through, e.g. `anagram,hidden_word`
    #[arg(long)]
    types: Option<String>,

    /// Where the run report is written
    #[arg(long, default_value = "final_clues_output.json")]
    output: PathBuf,

    /// Word pool directory (overrides WORD_POOLS_DIR)
    #[arg(long)]
    pools_dir: Option<PathBuf>,

    /// Accept near-miss solver answers (similarity >= 0.90)
    #[arg(long)]
    lenient: bool,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::from_default_env().add_directive("clueforge=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Clueforge starting...");

    // Load config
    let config = Config::from_env()?;
    config.log_redacted();

    // Model tiers
    let logic = Gateway::with_endpoint(
        &config.gateway_api_key,
        &config.logic_model_id,
        &config.gateway_base_url,
        config.call_timeout,
    )?;
    let surface = Gateway::with_endpoint(
        &config.gateway_api_key,
        &config.surface_model_id,
        &config.gateway_base_url,
        config.call_timeout,
    )?;
    let workshop = LlmWorkshop::new(Arc::new(logic), Arc::new(surface), config.temperature);

    // Optional dictionary for the word-validity checks
    let mut auditor = RuleAuditor::new();
    if let Some(path) = &config.dictionary_path {
        auditor = auditor.with_lexicon(Arc::new(WordListLexicon::from_file(path)?));
    } else {
        info!("No DICTIONARY_PATH set, dictionary checks disabled");
    }

    let policy = PipelinePolicy {
        referee_mode: if cli.lenient {
            RefereeMode::Lenient
        } else {
            RefereeMode::Strict
        },
        call_timeout: config.call_timeout,
        ..PipelinePolicy::default()
    };
    let lifecycle = ClueLifecycle::new(Arc::new(workshop), policy).with_auditor(auditor);

    // Word supply
    let pools_dir = cli.pools_dir.unwrap_or(config.word_pools_dir);
    let pool = pool_loader::load_dir(&pools_dir)?;
    let stats = pool.stats();
    info!(
        entries = stats.total_entries,
        unique = stats.unique_words,
        "Word pool loaded"
    );

    let plan = BatchPlan {
        target_pass_count: cli.target,
        batch_size: cli.batch_size,
        max_concurrency: cli.concurrency,
        mechanisms: match &cli.types {
            Some(types) => MechanismFilter::parse_list(types)?,
            None => MechanismFilter::Any,
        },
    };

    let scheduler = BatchScheduler::new(Arc::new(lifecycle));
    let supply: &dyn WordSupply = &pool;
    let outcome = scheduler.run(&plan, supply).await?;

    let report = RunReport::new(&outcome, plan.target_pass_count);
    report.write_to(&cli.output)?;
    info!(path = %cli.output.display(), "Report written");

    info!("Clueforge complete. {outcome}");
    Ok(())
}
