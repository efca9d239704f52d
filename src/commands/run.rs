//! The evaluation run: load inputs, evaluate, persist snapshots, summarize.

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;

use promptest_core::backend::ProviderClient;
use promptest_core::config::ProviderConfig;
use promptest_core::error::Result;
use promptest_core::prompt::PromptSpec;
use promptest_core::report;
use promptest_core::runner::Runner;
use promptest_core::suite::TestSuite;
use promptest_core::trace_time;

use crate::cli::Cli;

pub fn execute(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let provider = ProviderConfig::load_or_default(&cwd)?;
    let prompt = PromptSpec::load(&cli.prompt)?;
    let suite = TestSuite::load(&cli.tests)?;
    trace_time!(start, "load_inputs");

    tracing::info!(
        output_key = %prompt.output_key,
        models = suite.config.model_names.len(),
        tests = suite.tests.len(),
        "run_start"
    );

    let client = ProviderClient::from_config(&provider);
    let summaries = Runner::new(&prompt, &suite.config, &client).run(&suite.tests)?;

    let run_dir = report::output_directory(
        &provider.output_dir,
        &report::template_name(&cli.prompt),
        Local::now(),
    );
    let paths = report::save_snapshots(&run_dir, &summaries, &suite.config, &prompt.template)?;
    tracing::info!(dir = %run_dir.display(), files = paths.len(), "snapshots_saved");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report::write_summary(&mut out, &summaries)?;
    out.flush()?;

    trace_time!(start, "run_complete");
    Ok(())
}
