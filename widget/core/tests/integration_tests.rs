//! Integration tests for the rendering pipeline
//!
//! These tests drive several components together the way a daemon does:
//! - Animation library feeding the face layer through the compositor
//! - Spawners feeding the weather layer over many ticks
//! - Opaque layers cutting holes in the layers beneath them
//! - Config files shaping the full frame renderer

use std::io::Write;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use widget_core::animation::AnimationLibrary;
use widget_core::compositor::{fixed_origin, Compositor};
use widget_core::config::load_config_from_path;
use widget_core::grid::Grid;
use widget_core::layers::{FaceLayer, WeatherParticleLayer, WeatherTuning, WeatherType};
use widget_core::renderer::FrameRenderer;
use widget_core::sprite::{
    LifetimeRange, ShapeCatalog, SpawnRange, SpawnerConfig, Sprite, SpriteSpawner,
};
use widget_core::wire::WireEncoder;
use widget_core::Rgb;

// =============================================================================
// Scenario: Blank Face
// =============================================================================

/// A face whose every slot is a space composites to an all-space frame with
/// every colour code 0.
#[test]
fn test_blank_face_renders_all_spaces() {
    let library = AnimationLibrary::from_toml_str(
        r#"
[presets.blank]
eyes = " "
mouth = " "
border = " "
edge = " "
corners = "    "
substrate = "         "

[status.idle]
frames = ["blank"]
"#,
    )
    .unwrap();

    let mut compositor = Compositor::new(11, 5);
    compositor.add_layer(FaceLayer::new(Arc::new(library)), 0);

    let frame = WireEncoder::encode(&compositor.render(), Rgb::new(10, 20, 30));

    assert_eq!(frame.rows, vec![" ".repeat(11); 5]);
    assert!(frame.cell_colors.iter().flatten().all(|&c| c == 0));
}

// =============================================================================
// Scenario: Spawner Fills To Cap
// =============================================================================

/// With rate 1.0 and cap 5 the population grows by one per tick, reaches
/// exactly 5 after five ticks, and stays there.
#[test]
fn test_spawner_fills_to_cap_and_holds() {
    let catalog = Arc::new(ShapeCatalog::builtin().unwrap());
    let mut layer = WeatherParticleLayer::new(29, 12, WeatherTuning::default(), catalog)
        .unwrap()
        .with_seed(99);
    layer.replace_spawner(
        SpriteSpawner::new(SpawnerConfig {
            variants: vec![Arc::new(Sprite::from_text("*").unwrap())],
            spawn_rate: 1.0,
            max_instances: 5,
            x: SpawnRange::new(2.0, 26.0),
            y: SpawnRange::new(2.0, 9.0),
            vx: SpawnRange::fixed(0.0),
            vy: SpawnRange::fixed(0.0),
            animation_speed: SpawnRange::fixed(0.0),
            lifetime: LifetimeRange::Infinite,
        })
        .unwrap(),
    );

    for tick in 1..=5 {
        layer.render((29, 12));
        assert_eq!(layer.population(), tick);
    }
    for _ in 0..200 {
        layer.render((29, 12));
        assert_eq!(layer.population(), 5);
    }
}

// =============================================================================
// Scenario: Opaque Layer Over A Block
// =============================================================================

/// An opaque 1x1 layer at the centre of a 3x3 block replaces only the centre.
#[test]
fn test_opaque_centre_over_block() {
    let mut compositor = Compositor::new(3, 3);
    compositor.add_layer(Grid::from_text("###\n###\n###", ' ', 0), 0);
    let top = compositor.add_layer(Grid::from_text("@", ' ', 0), 1);
    compositor.set_origin(top, fixed_origin(1, 1));
    compositor.set_subtracts(top, true);

    assert_eq!(compositor.render().to_wire_rows(), vec!["###", "#@#", "###"]);
}

// =============================================================================
// Full Renderer
// =============================================================================

/// Two renderers with the same seed produce identical frames.
#[test]
fn test_seeded_renderers_agree() {
    let build = || {
        let library = Arc::new(AnimationLibrary::builtin().unwrap());
        let config = widget_core::WidgetConfig::default();
        let mut renderer = FrameRenderer::new(&config, library).unwrap().with_seed(1234);
        renderer.set_weather(WeatherType::Rain(1.0)).unwrap();
        renderer.set_status("thinking");
        renderer.set_context_percent(40.0);
        renderer
    };
    let (mut a, mut b) = (build(), build());

    for _ in 0..50 {
        assert_eq!(a.render(), b.render());
        a.tick();
        b.tick();
    }
}

/// A config file changes the canvas, theme and weather tuning end to end.
#[test]
fn test_config_file_drives_renderer() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[display]
grid_width = 33
grid_height = 14

[theme]
base = "matrix"

[weather]
particle_color = 2
"#,
    )
    .unwrap();

    let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
    let library = Arc::new(AnimationLibrary::builtin().unwrap());
    let mut renderer = FrameRenderer::new(&config, library).unwrap().with_seed(3);
    renderer.set_weather(WeatherType::Snow(1.0)).unwrap();

    let mut frame = renderer.render();
    for _ in 0..60 {
        frame = renderer.render();
    }
    assert_eq!(frame.size(), (33, 14));
    assert!(frame.is_well_formed());
    assert!(frame.cell_colors.iter().flatten().any(|&c| c == 2));
}

/// Status changes flow through to the face and the theme colour.
#[test]
fn test_status_change_updates_face_and_theme() {
    let library = Arc::new(AnimationLibrary::builtin().unwrap());
    let config = widget_core::WidgetConfig::default();
    let mut renderer = FrameRenderer::new(&config, library).unwrap().with_seed(8);

    let idle = renderer.render();
    renderer.set_status("offline");
    let offline = renderer.render();

    assert_ne!(idle.theme_color, [0.0; 3]);
    assert_ne!(idle.rows[2..7], offline.rows[2..7]);
}
