use macroquad::prelude::*;
use tile_compositor::{
    AnimationFrame, Camera2d, ColliderShape, ColliderTemplate, LayerDescriptor, MacroquadSurface,
    TextureId, TileGrid, TileId, TileLayer, TileScene, Tileset, TilesetCatalog,
};
use tracing_subscriber::EnvFilter;

const TILE: u32 = 16;
const WIDTH: u32 = 64;
const HEIGHT: u32 = 24;

const GRASS: u32 = 1;
const WATER: u32 = 2;
const WATER_ALT: u32 = 3;
const WALL: u32 = 4;

fn window_conf() -> Conf {
    Conf {
        window_title: "Basic Layer".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

/// 2x2 tile atlas, one flat colour per tile with a darker border.
fn atlas() -> Texture2D {
    let size = (TILE * 2) as usize;
    let colours = [
        [70u8, 160, 70],
        [40, 90, 200],
        [60, 120, 230],
        [120, 110, 100],
    ];
    let mut bytes = vec![0u8; size * size * 4];
    for y in 0..size {
        for x in 0..size {
            let tile = (y / TILE as usize) * 2 + x / TILE as usize;
            let (lx, ly) = (x % TILE as usize, y % TILE as usize);
            let edge = lx == 0 || ly == 0 || lx == TILE as usize - 1 || ly == TILE as usize - 1;
            let [r, g, b] = colours[tile];
            let shade = if edge { 2 } else { 1 };
            let px = (y * size + x) * 4;
            bytes[px..px + 4].copy_from_slice(&[r / shade, g / shade, b / shade, 255]);
        }
    }
    Texture2D::from_rgba8(size as u16, size as u16, &bytes)
}

fn ground() -> TileGrid {
    let mut data = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let id = match (x, y) {
                (_, 0) | (0, _) => WALL,
                (x, y) if x == WIDTH - 1 || y == HEIGHT - 1 => WALL,
                (x, y) if (x / 6 + y / 4) % 5 == 0 => WATER,
                _ => GRASS,
            };
            data.push(id);
        }
    }
    TileGrid::from_row_major(WIDTH, HEIGHT, &data, "ground").expect("grid matches its size")
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = TilesetCatalog::new()
        .with(Tileset::new(1, 4, (TILE, TILE), (TILE * 2, TILE * 2), TextureId(0)))
        .expect("atlas tileset");
    let mut scene = TileScene::new(catalog);
    scene
        .animations_mut()
        .insert(
            WATER,
            vec![AnimationFrame::new(WATER, 0.4), AnimationFrame::new(WATER_ALT, 0.4)],
        )
        .expect("water animation");
    scene.colliders_mut().add_template(ColliderTemplate {
        id: "wall".into(),
        tile: WALL,
        offset: Vec2::ZERO,
        shape: ColliderShape::Rectangle {
            size: vec2(TILE as f32, TILE as f32),
        },
    });
    scene
        .add_layer(TileLayer::new(LayerDescriptor::new("ground"), ground()))
        .expect("fresh scene");
    scene.build().expect("ground layer builds");

    let mut surface = MacroquadSurface::new();
    surface.insert_texture(TextureId(0), atlas());

    let view_h = (HEIGHT * TILE) as f32;
    let mut camera = Camera2d::new(vec2(view_h, view_h * 0.5), vec2(view_h * 16.0 / 9.0, view_h));
    let mut brush = WALL;

    loop {
        clear_background(BLACK);
        let dt = get_frame_time();

        let speed = 200.0 * dt;
        if is_key_down(KeyCode::Left) {
            camera.center.x -= speed;
        }
        if is_key_down(KeyCode::Right) {
            camera.center.x += speed;
        }
        if is_key_pressed(KeyCode::Space) {
            let aa = scene.render_config().anti_aliasing;
            scene.set_anti_aliasing(!aa);
        }
        for (key, tile) in [
            (KeyCode::Key1, GRASS),
            (KeyCode::Key2, WATER),
            (KeyCode::Key3, WALL),
            (KeyCode::Key0, 0),
        ] {
            if is_key_pressed(key) {
                brush = tile;
            }
        }
        camera.size.x = camera.size.y * screen_width() / screen_height();

        if is_mouse_button_down(MouseButton::Left) {
            let (mx, my) = mouse_position();
            let scale = camera.size.y / screen_height();
            let world = camera.center + (vec2(mx, my) - vec2(screen_width(), screen_height()) * 0.5) * scale;
            if world.x >= 0.0 && world.y >= 0.0 {
                let (x, y) = ((world.x / TILE as f32) as u32, (world.y / TILE as f32) as u32);
                let current = scene.get_tile("ground", x, y).unwrap_or(TileId::EMPTY);
                if current.raw() != brush {
                    if let Err(err) = scene.set_tile("ground", x, y, brush) {
                        tracing::warn!(%err, "could not paint tile");
                    }
                }
            }
        }

        scene.advance_animations(dt);
        if let Err(err) = scene.draw(&mut surface, &camera) {
            tracing::error!(%err, "draw failed");
        }

        draw_text(
            &format!(
                "FPS: {}  colliders: {}  brush: {}  aa: {}",
                get_fps(),
                scene.colliders().len(),
                brush,
                scene.render_config().anti_aliasing
            ),
            20.0,
            30.0,
            26.0,
            RED,
        );

        next_frame().await;
    }
}
