//! Configuration validation command

use anyhow::{Context, Result};
use shimmer_particles::EngineConfig;

pub fn run(path: &str) -> Result<()> {
    let mut config =
        EngineConfig::load(path).with_context(|| format!("failed to load '{}'", path))?;
    let warnings = config.sanitize();

    println!(
        "{}: {} emitter(s), {} force(s), max {} particles",
        path,
        config.emitters.len(),
        config.forces.len(),
        config.max_particles
    );

    if warnings.is_empty() {
        println!("  OK: no adjustments needed.");
    } else {
        println!("  {} value(s) will be adjusted:", warnings.len());
        for warning in &warnings {
            println!("  - {}", warning);
        }
    }
    Ok(())
}
