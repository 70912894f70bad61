//! Headless simulation command

use anyhow::{Context, Result};
use shimmer_particles::{
    CommandRecorder, EngineConfig, EngineEvent, ParticleEngine, RenderableSnapshot,
};

pub struct RunArgs {
    pub config: String,
    pub ticks: u64,
    pub dt: f32,
    pub seed: Option<u32>,
    pub pointer: Option<[f32; 2]>,
    pub report_every: u64,
    pub debug: bool,
    pub json: bool,
}

/// Event totals over a run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct EventTally {
    pub emitter_triggers: usize,
    pub particles_spawned: usize,
    pub force_applications: usize,
}

impl EventTally {
    pub fn record(&mut self, events: Vec<EngineEvent>) {
        for event in events {
            match event {
                EngineEvent::EmitterTriggered { spawned, .. } => {
                    self.emitter_triggers += 1;
                    self.particles_spawned += spawned;
                }
                EngineEvent::ForceApplied { affected, .. } => {
                    self.force_applications += affected;
                }
                EngineEvent::ParticleClicked { .. } => {}
            }
        }
    }
}

pub fn run(args: RunArgs) -> Result<()> {
    let mut config = EngineConfig::load(&args.config)
        .with_context(|| format!("failed to load '{}'", args.config))?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.debug {
        config.debug = true;
    }

    let (engine, tally) = simulate(config, &args)?;

    if args.json {
        let frame = engine.snapshot().to_frame();
        println!("{}", serde_json::to_string_pretty(&frame)?);
        return Ok(());
    }

    let mut surface = CommandRecorder::new();
    let stats = engine.render(&mut surface);
    let (circles, polygons, lines, texts) = surface.counts();

    println!("\nAfter {} tick(s):", args.ticks);
    println!("  Live particles:     {}", engine.particle_count());
    println!("  Spawned (total):    {}", tally.particles_spawned);
    println!("  Emitter triggers:   {}", tally.emitter_triggers);
    println!("  Force applications: {}", tally.force_applications);
    println!(
        "  Render: {} drawn, {} culled, {} failed",
        stats.drawn, stats.culled, stats.failed
    );
    println!(
        "  Draw calls: {} circle(s), {} polygon(s), {} line(s), {} text(s)",
        circles, polygons, lines, texts
    );
    for text in surface.texts() {
        println!("  | {}", text);
    }
    Ok(())
}

/// Drive the engine for `args.ticks` ticks, printing periodic telemetry
pub fn simulate(config: EngineConfig, args: &RunArgs) -> Result<(ParticleEngine, EventTally)> {
    if !args.dt.is_finite() || args.dt <= 0.0 {
        anyhow::bail!("--dt must be positive, got {}", args.dt);
    }

    let mut engine = ParticleEngine::new(config);
    engine.set_event_recording(true);
    if let Some([x, y]) = args.pointer {
        engine.pointer_moved(x, y);
    }

    log::info!("[run] {} tick(s) at dt = {}s", args.ticks, args.dt);

    let mut tally = EventTally::default();
    for _ in 0..args.ticks {
        let snapshot = engine.advance(args.dt);
        if args.report_every > 0 && snapshot.tick % args.report_every == 0 && !args.json {
            report(&snapshot);
        }
        tally.record(engine.drain_events());
    }
    Ok((engine, tally))
}

fn report(snapshot: &RenderableSnapshot<'_>) {
    let t = &snapshot.telemetry;
    println!(
        "tick {:>6}  particles {:>6}  +{:<4} -{:<4}  fps {:>6.1}  emitters {}/{}  forces {}/{}",
        snapshot.tick,
        t.live_particles,
        snapshot.spawned,
        snapshot.expired,
        t.fps,
        t.enabled_emitters,
        t.total_emitters,
        t.enabled_forces,
        t.total_forces
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::STARTER_CONFIG;

    fn args(ticks: u64) -> RunArgs {
        RunArgs {
            config: String::new(),
            ticks,
            dt: 1.0 / 60.0,
            seed: Some(3),
            pointer: Some([400.0, 300.0]),
            report_every: 0,
            debug: false,
            json: false,
        }
    }

    #[test]
    fn starter_scene_simulates() {
        let mut config = EngineConfig::from_toml_str(STARTER_CONFIG).unwrap();
        config.seed = Some(3);
        let (engine, tally) = simulate(config, &args(120)).unwrap();
        assert!(engine.particle_count() > 0);
        assert!(engine.particle_count() <= 2000);
        assert!(tally.emitter_triggers > 0);
        assert!(tally.particles_spawned >= engine.particle_count());
    }

    #[test]
    fn seeded_runs_repeat() {
        let config = || {
            let mut c = EngineConfig::from_toml_str(STARTER_CONFIG).unwrap();
            c.seed = Some(11);
            c
        };
        let (a, tally_a) = simulate(config(), &args(60)).unwrap();
        let (b, tally_b) = simulate(config(), &args(60)).unwrap();
        assert_eq!(tally_a, tally_b);
        let pa: Vec<_> = a.particles().cloned().collect();
        let pb: Vec<_> = b.particles().cloned().collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn rejects_non_positive_dt() {
        let mut bad = args(1);
        bad.dt = 0.0;
        assert!(simulate(EngineConfig::default(), &bad).is_err());
    }

    #[test]
    fn tally_counts_events() {
        let mut tally = EventTally::default();
        tally.record(vec![
            EngineEvent::EmitterTriggered {
                emitter: "a".into(),
                spawned: 3,
            },
            EngineEvent::ForceApplied {
                force: "g".into(),
                affected: 7,
            },
        ]);
        assert_eq!(tally.emitter_triggers, 1);
        assert_eq!(tally.particles_spawned, 3);
        assert_eq!(tally.force_applications, 7);
    }
}
