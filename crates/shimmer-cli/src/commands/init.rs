//! Starter configuration command

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Starter scene: a fountain falling under gravity with a vortex in the middle
pub const STARTER_CONFIG: &str = r##"# Shimmer engine configuration
max_particles = 2000
trails_enabled = true
interactive = true
color_scheme = "aurora"
speed_multiplier = 1.0
emission = "accumulate"

[bounds]
width = 800
height = 600
depth = 200

[performance]
culling = true
lod_distance = 150
target_fps = 60

[effects]
glow = true

[pointer_force]
type = "repulsion"
strength = 800
radius = 120

[[emitters]]
name = "fountain"
position = { x = 400, y = 560 }
rate = 120
velocity = [120, 260]
angle = [-2.0, -1.14]
size = [2, 6]
life = [1.5, 3.5]
shape = "sphere"

[[emitters]]
name = "stars"
position = { x = 400, y = 300 }
rate = 0
shape = "star"
burst = { count = 30, interval = 2.0 }

[[forces]]
name = "gravity"
type = "gravity"
strength = 120

[[forces]]
name = "swirl"
type = "vortex"
strength = 60
position = { x = 400, y = 300 }
radius = 180
"##;

pub fn run(path: &str, force: bool) -> Result<()> {
    let target = Path::new(path);
    if target.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path);
    }
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(target, STARTER_CONFIG)?;
    println!("Wrote starter configuration to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shimmer_particles::EngineConfig;

    #[test]
    fn starter_config_is_clean() {
        let mut config = EngineConfig::from_toml_str(STARTER_CONFIG).unwrap();
        assert!(config.sanitize().is_empty());
        assert_eq!(config.emitters.len(), 2);
        assert_eq!(config.forces.len(), 2);
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = std::env::temp_dir().join("shimmer_init_test");
        let _ = fs::create_dir_all(&dir);
        let path = dir.join("scene.toml");
        let path_str = path.to_str().unwrap();

        run(path_str, true).expect("init failed");
        assert!(run(path_str, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), STARTER_CONFIG);
    }
}
