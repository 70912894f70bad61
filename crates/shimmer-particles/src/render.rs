//! Perspective projection and draw-command generation
//!
//! The renderer never touches a graphics API. It talks to a [`DrawSurface`]
//! (anything that can draw shapes, lines and text) and delegates per-particle
//! geometry to a [`ShapeRenderer`] strategy, so hosts can add shapes without
//! touching the engine.

use crate::governor::Telemetry;
use crate::particle::{Particle, ParticleShape};
use serde::Serialize;
use shimmer_core::{Color, ParticleId, Result, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Star inner radius as a fraction of the outer radius
pub const STAR_INNER_RATIO: f32 = 0.4;
/// Opacity multiplier for glow halos
pub const GLOW_OPACITY: f32 = 0.3;
/// Opacity multiplier for trails
pub const TRAIL_OPACITY: f32 = 0.5;
/// Smallest click radius in surface pixels
pub const MIN_HIT_RADIUS: f32 = 4.0;

/// Geometry handed to a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapePrimitive<'a> {
    Circle { center: Vec2, radius: f32 },
    Polygon(&'a [Vec2]),
}

/// A 2D drawable output
pub trait DrawSurface {
    fn draw_shape(&mut self, shape: ShapePrimitive<'_>, color: Color, opacity: f32);
    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color, opacity: f32, width: f32);
    fn draw_text(&mut self, position: Vec2, text: &str);
}

/// A particle after perspective projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub center: Vec2,
    /// Projected diameter
    pub size: f32,
    pub scale: f32,
}

/// Pinhole projection: `scale = perspective / (perspective + z)`.
/// None when the point is at or behind the camera plane.
pub fn project(position: Vec3, size: f32, perspective: f32) -> Option<Projected> {
    let denom = perspective + position.z;
    if denom <= 0.0 {
        return None;
    }
    let scale = perspective / denom;
    Some(Projected {
        center: Vec2::new(position.x * scale, position.y * scale),
        size: size * scale,
        scale,
    })
}

/// Turns one projected particle into draw calls
pub trait ShapeRenderer {
    fn draw(
        &self,
        particle: &Particle,
        projected: &Projected,
        surface: &mut dyn DrawSurface,
    ) -> Result<()>;
}

/// Built-in sphere/square/triangle/star geometry. Custom shapes render as spheres.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardShapes;

impl ShapeRenderer for StandardShapes {
    fn draw(
        &self,
        particle: &Particle,
        projected: &Projected,
        surface: &mut dyn DrawSurface,
    ) -> Result<()> {
        let c = projected.center;
        let r = projected.size / 2.0;
        let (color, opacity) = (particle.color, particle.opacity);
        match particle.shape {
            ParticleShape::Sphere | ParticleShape::Custom => {
                surface.draw_shape(ShapePrimitive::Circle { center: c, radius: r }, color, opacity);
            }
            ParticleShape::Square => {
                let points = [
                    Vec2::new(c.x - r, c.y - r),
                    Vec2::new(c.x + r, c.y - r),
                    Vec2::new(c.x + r, c.y + r),
                    Vec2::new(c.x - r, c.y + r),
                ];
                surface.draw_shape(ShapePrimitive::Polygon(&points), color, opacity);
            }
            ParticleShape::Triangle => {
                let points = regular_polygon::<3>(c, r);
                surface.draw_shape(ShapePrimitive::Polygon(&points), color, opacity);
            }
            ParticleShape::Star => {
                let points = star_points(c, r);
                surface.draw_shape(ShapePrimitive::Polygon(&points), color, opacity);
            }
        }
        Ok(())
    }
}

fn regular_polygon<const N: usize>(center: Vec2, radius: f32) -> [Vec2; N] {
    std::array::from_fn(|i| {
        let a = -FRAC_PI_2 + TAU * i as f32 / N as f32;
        Vec2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
    })
}

/// Five-point star alternating outer and inner vertices, first point up
pub fn star_points(center: Vec2, outer: f32) -> [Vec2; 10] {
    let inner = outer * STAR_INNER_RATIO;
    std::array::from_fn(|i| {
        let r = if i % 2 == 0 { outer } else { inner };
        let a = -FRAC_PI_2 + PI * i as f32 / 5.0;
        Vec2::new(center.x + r * a.cos(), center.y + r * a.sin())
    })
}

/// Renderer settings, resolved from the engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub perspective: f32,
    /// Seconds of travel the trail line covers
    pub trail_length: f32,
    pub glow: bool,
    pub culling: bool,
    pub lod_distance: f32,
    /// Visible surface size used for culling
    pub viewport: Vec2,
    pub debug: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            perspective: 1000.0,
            trail_length: 0.1,
            glow: false,
            culling: false,
            lod_distance: 500.0,
            viewport: Vec2::new(800.0, 600.0),
            debug: false,
        }
    }
}

/// Counts from one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub drawn: usize,
    pub culled: usize,
    pub failed: usize,
}

/// Draws particle sets onto a surface
pub struct Renderer {
    pub settings: RenderSettings,
    standard: StandardShapes,
    custom: Option<Box<dyn ShapeRenderer>>,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            standard: StandardShapes,
            custom: None,
        }
    }

    /// Install the strategy used for `ParticleShape::Custom`
    pub fn set_custom_shape(&mut self, renderer: Box<dyn ShapeRenderer>) {
        self.custom = Some(renderer);
    }

    fn is_offscreen(&self, projected: &Projected) -> bool {
        let margin = projected.size;
        let v = self.settings.viewport;
        projected.center.x < -margin
            || projected.center.y < -margin
            || projected.center.x > v.x + margin
            || projected.center.y > v.y + margin
    }

    /// Draw every particle, then the debug overlay when enabled
    pub fn draw<'p, I>(
        &self,
        particles: I,
        telemetry: Option<&Telemetry>,
        surface: &mut dyn DrawSurface,
    ) -> RenderStats
    where
        I: IntoIterator<Item = &'p Particle>,
    {
        let mut stats = RenderStats::default();
        for particle in particles {
            let Some(projected) = project(particle.position, particle.size, self.settings.perspective)
            else {
                stats.culled += 1;
                continue;
            };
            if self.settings.culling && self.is_offscreen(&projected) {
                stats.culled += 1;
                continue;
            }

            let simplified = self.settings.culling && particle.position.z > self.settings.lod_distance;
            if simplified {
                surface.draw_shape(
                    ShapePrimitive::Circle {
                        center: projected.center,
                        radius: projected.size / 2.0,
                    },
                    particle.color,
                    particle.opacity,
                );
                stats.drawn += 1;
                continue;
            }

            if self.settings.glow {
                surface.draw_shape(
                    ShapePrimitive::Circle {
                        center: projected.center,
                        radius: projected.size,
                    },
                    particle.color,
                    particle.opacity * GLOW_OPACITY,
                );
            }

            if particle.trail_enabled && !particle.velocity.is_zero() {
                self.draw_trail(particle, &projected, surface);
            }

            let strategy: &dyn ShapeRenderer = match (particle.shape, self.custom.as_deref()) {
                (ParticleShape::Custom, Some(custom)) => custom,
                _ => &self.standard,
            };
            match strategy.draw(particle, &projected, surface) {
                Ok(()) => stats.drawn += 1,
                Err(e) => {
                    stats.failed += 1;
                    log::error!("[render] shape renderer failed for particle {}: {}", particle.id, e);
                }
            }
        }

        if self.settings.debug {
            if let Some(telemetry) = telemetry {
                draw_overlay(telemetry, surface);
            }
        }
        stats
    }

    fn draw_trail(&self, particle: &Particle, projected: &Projected, surface: &mut dyn DrawSurface) {
        let tail = particle.position - particle.velocity * self.settings.trail_length;
        let end = Vec2::new(tail.x * projected.scale, tail.y * projected.scale);
        surface.draw_line(
            projected.center,
            end,
            particle.color,
            particle.opacity * TRAIL_OPACITY,
            (projected.size * 0.5).max(1.0),
        );
    }

    /// Closest particle whose projected disc contains `point` (surface space)
    pub fn hit_test<'p, I>(&self, particles: I, point: Vec2) -> Option<ParticleId>
    where
        I: IntoIterator<Item = &'p Particle>,
    {
        particles
            .into_iter()
            .filter_map(|p| {
                let projected = project(p.position, p.size, self.settings.perspective)?;
                let radius = (projected.size / 2.0).max(MIN_HIT_RADIUS);
                let dist = projected.center.distance(point);
                (dist <= radius).then_some((p.id, dist))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

/// Plain-text telemetry in the top-left corner
pub fn draw_overlay(telemetry: &Telemetry, surface: &mut dyn DrawSurface) {
    let lines = [
        format!("Particles: {}", telemetry.live_particles),
        format!("FPS: {:.1}", telemetry.fps),
        format!(
            "Emitters: {}/{}",
            telemetry.enabled_emitters, telemetry.total_emitters
        ),
        format!("Forces: {}/{}", telemetry.enabled_forces, telemetry.total_forces),
    ];
    for (i, line) in lines.iter().enumerate() {
        surface.draw_text(Vec2::new(10.0, 20.0 + 16.0 * i as f32), line);
    }
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DrawCommand {
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
        opacity: f32,
    },
    Polygon {
        points: Vec<Vec2>,
        color: Color,
        opacity: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        opacity: f32,
        width: f32,
    },
    Text {
        position: Vec2,
        text: String,
    },
}

/// In-memory surface that keeps every draw call
#[derive(Debug, Default)]
pub struct CommandRecorder {
    pub commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// (circles, polygons, lines, texts)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for cmd in &self.commands {
            match cmd {
                DrawCommand::Circle { .. } => counts.0 += 1,
                DrawCommand::Polygon { .. } => counts.1 += 1,
                DrawCommand::Line { .. } => counts.2 += 1,
                DrawCommand::Text { .. } => counts.3 += 1,
            }
        }
        counts
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl DrawSurface for CommandRecorder {
    fn draw_shape(&mut self, shape: ShapePrimitive<'_>, color: Color, opacity: f32) {
        self.commands.push(match shape {
            ShapePrimitive::Circle { center, radius } => DrawCommand::Circle {
                center,
                radius,
                color,
                opacity,
            },
            ShapePrimitive::Polygon(points) => DrawCommand::Polygon {
                points: points.to_vec(),
                color,
                opacity,
            },
        });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Color, opacity: f32, width: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            opacity,
            width,
        });
    }

    fn draw_text(&mut self, position: Vec2, text: &str) {
        self.commands.push(DrawCommand::Text {
            position,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shimmer_core::ShimmerError;

    fn particle(shape: ParticleShape, position: Vec3) -> Particle {
        let mut p = Particle::new(ParticleId(1), position, Vec3::ZERO, 10.0, 1.0);
        p.shape = shape;
        p
    }

    #[test]
    fn projection_scales_with_depth() {
        let p = project(Vec3::new(100.0, 50.0, 1000.0), 10.0, 1000.0).unwrap();
        assert!((p.scale - 0.5).abs() < 1e-6);
        assert_eq!(p.center, Vec2::new(50.0, 25.0));
        assert!((p.size - 5.0).abs() < 1e-6);

        let flat = project(Vec3::new(100.0, 50.0, 0.0), 10.0, 1000.0).unwrap();
        assert_eq!(flat.scale, 1.0);

        assert!(project(Vec3::new(0.0, 0.0, -1000.0), 10.0, 1000.0).is_none());
    }

    #[test]
    fn star_alternates_radii() {
        let points = star_points(Vec2::ZERO, 10.0);
        for (i, p) in points.iter().enumerate() {
            let expected = if i % 2 == 0 { 10.0 } else { 4.0 };
            assert!((p.length() - expected).abs() < 1e-4);
        }
        // First vertex points up
        assert!((points[0].y + 10.0).abs() < 1e-4);
    }

    #[test]
    fn each_shape_draws_one_primitive() {
        let renderer = Renderer::default();
        for (shape, vertices) in [
            (ParticleShape::Square, 4),
            (ParticleShape::Triangle, 3),
            (ParticleShape::Star, 10),
        ] {
            let mut surface = CommandRecorder::new();
            let p = particle(shape, Vec3::new(10.0, 10.0, 0.0));
            renderer.draw([&p], None, &mut surface);
            match &surface.commands[..] {
                [DrawCommand::Polygon { points, .. }] => assert_eq!(points.len(), vertices),
                other => panic!("unexpected commands for {shape:?}: {other:?}"),
            }
        }

        let mut surface = CommandRecorder::new();
        let p = particle(ParticleShape::Sphere, Vec3::new(10.0, 10.0, 0.0));
        renderer.draw([&p], None, &mut surface);
        assert!(matches!(
            &surface.commands[..],
            [DrawCommand::Circle { radius, .. }] if (*radius - 5.0).abs() < 1e-6
        ));
    }

    #[test]
    fn glow_and_trail_add_commands() {
        let mut renderer = Renderer::default();
        renderer.settings.glow = true;
        let mut p = particle(ParticleShape::Sphere, Vec3::new(100.0, 100.0, 0.0));
        p.trail_enabled = true;
        p.velocity = Vec3::new(50.0, 0.0, 0.0);
        p.opacity = 0.8;

        let mut surface = CommandRecorder::new();
        renderer.draw([&p], None, &mut surface);
        assert_eq!(surface.counts(), (2, 0, 1, 0));

        match &surface.commands[0] {
            DrawCommand::Circle { radius, opacity, .. } => {
                assert!((radius - 10.0).abs() < 1e-6);
                assert!((opacity - 0.8 * GLOW_OPACITY).abs() < 1e-6);
            }
            other => panic!("expected glow halo, got {other:?}"),
        }
        match &surface.commands[1] {
            DrawCommand::Line { to, .. } => assert!((to.x - 95.0).abs() < 1e-4),
            other => panic!("expected trail, got {other:?}"),
        }
    }

    #[test]
    fn stationary_particle_has_no_trail() {
        let renderer = Renderer::default();
        let mut p = particle(ParticleShape::Sphere, Vec3::new(10.0, 10.0, 0.0));
        p.trail_enabled = true;
        let mut surface = CommandRecorder::new();
        renderer.draw([&p], None, &mut surface);
        assert_eq!(surface.counts().2, 0);
    }

    #[test]
    fn culling_skips_offscreen() {
        let mut renderer = Renderer::default();
        renderer.settings.culling = true;
        let on = particle(ParticleShape::Sphere, Vec3::new(10.0, 10.0, 0.0));
        let off = particle(ParticleShape::Sphere, Vec3::new(5000.0, 10.0, 0.0));

        let mut surface = CommandRecorder::new();
        let stats = renderer.draw([&on, &off], None, &mut surface);
        assert_eq!(stats.drawn, 1);
        assert_eq!(stats.culled, 1);
    }

    #[test]
    fn distant_particles_draw_as_plain_circles() {
        let mut renderer = Renderer::default();
        renderer.settings.culling = true;
        renderer.settings.glow = true;
        renderer.settings.lod_distance = 100.0;

        let mut far = particle(ParticleShape::Star, Vec3::new(50.0, 50.0, 150.0));
        far.trail_enabled = true;
        far.velocity = Vec3::new(30.0, 0.0, 0.0);

        let mut surface = CommandRecorder::new();
        let stats = renderer.draw([&far], None, &mut surface);
        assert_eq!(stats.drawn, 1);
        assert_eq!(surface.counts(), (1, 0, 0, 0));
        match &surface.commands[0] {
            DrawCommand::Circle { radius, opacity, .. } => {
                let scale = 1000.0 / 1150.0;
                assert!((radius - 5.0 * scale).abs() < 1e-4);
                assert_eq!(*opacity, far.opacity);
            }
            other => panic!("expected plain circle, got {other:?}"),
        }

        // The same particle inside the LOD distance gets glow, trail and its shape
        far.position.z = 50.0;
        surface.clear();
        renderer.draw([&far], None, &mut surface);
        assert_eq!(surface.counts(), (1, 1, 1, 0));
    }

    struct Diamond;

    impl ShapeRenderer for Diamond {
        fn draw(&self, _p: &Particle, proj: &Projected, surface: &mut dyn DrawSurface) -> Result<()> {
            let c = proj.center;
            let points = [
                Vec2::new(c.x, c.y - 1.0),
                Vec2::new(c.x + 1.0, c.y),
                Vec2::new(c.x, c.y + 1.0),
                Vec2::new(c.x - 1.0, c.y),
            ];
            surface.draw_shape(ShapePrimitive::Polygon(&points), Color::BLACK, 1.0);
            Ok(())
        }
    }

    struct Broken;

    impl ShapeRenderer for Broken {
        fn draw(&self, _: &Particle, _: &Projected, _: &mut dyn DrawSurface) -> Result<()> {
            Err(ShimmerError::callback("custom_shape", "no geometry"))
        }
    }

    #[test]
    fn custom_shapes_use_host_strategy() {
        let mut renderer = Renderer::default();
        let p = particle(ParticleShape::Custom, Vec3::new(10.0, 10.0, 0.0));

        let mut surface = CommandRecorder::new();
        renderer.draw([&p], None, &mut surface);
        assert_eq!(surface.counts(), (1, 0, 0, 0));

        renderer.set_custom_shape(Box::new(Diamond));
        surface.clear();
        renderer.draw([&p], None, &mut surface);
        assert_eq!(surface.counts(), (0, 1, 0, 0));
    }

    #[test]
    fn failing_strategy_does_not_stop_the_pass() {
        let mut renderer = Renderer::default();
        renderer.set_custom_shape(Box::new(Broken));
        let broken = particle(ParticleShape::Custom, Vec3::new(10.0, 10.0, 0.0));
        let fine = particle(ParticleShape::Sphere, Vec3::new(20.0, 10.0, 0.0));

        let mut surface = CommandRecorder::new();
        let stats = renderer.draw([&broken, &fine], None, &mut surface);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.drawn, 1);
    }

    #[test]
    fn debug_overlay_lists_telemetry() {
        let mut renderer = Renderer::default();
        renderer.settings.debug = true;
        let telemetry = Telemetry {
            live_particles: 42,
            enabled_emitters: 1,
            total_emitters: 2,
            ..Default::default()
        };
        let mut surface = CommandRecorder::new();
        renderer.draw(std::iter::empty::<&Particle>(), Some(&telemetry), &mut surface);
        let texts: Vec<_> = surface.texts().collect();
        assert_eq!(texts.len(), 4);
        assert_eq!(texts[0], "Particles: 42");
        assert_eq!(texts[2], "Emitters: 1/2");
    }

    #[test]
    fn hit_test_picks_closest() {
        let renderer = Renderer::default();
        let mut a = particle(ParticleShape::Sphere, Vec3::new(10.0, 10.0, 0.0));
        a.id = ParticleId(1);
        let mut b = particle(ParticleShape::Sphere, Vec3::new(13.0, 10.0, 0.0));
        b.id = ParticleId(2);

        assert_eq!(renderer.hit_test([&a, &b], Vec2::new(12.0, 10.0)), Some(ParticleId(2)));
        assert_eq!(renderer.hit_test([&a, &b], Vec2::new(100.0, 100.0)), None);
    }
}
