use anyhow::Context;
use env_logger::Env;
use plot_results::Job;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();
    let job = Job::default();
    job.run().with_context(|| format!(
        "plotting {} into {}", job.input.display(), job.output.display()))?;
    Ok(())
}
