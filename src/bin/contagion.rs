use contagion::runner::run_with_args;

fn main() -> anyhow::Result<()> {
    let summaries = run_with_args()?;
    let json = match summaries.as_slice() {
        [summary] => serde_json::to_string_pretty(summary)?,
        _ => serde_json::to_string_pretty(&summaries)?,
    };
    println!("{json}");
    Ok(())
}
