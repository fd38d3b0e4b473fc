use clap::Parser;
use plague::history::Compartment;
use plague::runner::{run_with_args, BaseArgs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = BaseArgs::parse();
    let export = run_with_args(&args)?;

    let last_step = args.steps.unwrap_or(export.horizon - 1);
    let susceptible = Compartment::Susceptible as usize;
    let dead = Compartment::Dead as usize;

    let reached = export
        .counts
        .iter()
        .filter(|city| city[susceptible][last_step] < export.population)
        .count();
    let deaths: u64 = export
        .counts
        .iter()
        .map(|city| u64::from(city[dead][last_step]))
        .sum();

    println!(
        "step {last_step}: {reached} of {} cities reached, {deaths} dead",
        export.cities.len()
    );
    Ok(())
}
