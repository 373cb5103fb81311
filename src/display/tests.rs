use super::*;
use crate::config::{DisplayConfig, PicamConfig, Rotation};
use crate::frame::FrameData;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use std::io::Read;
use std::time::{Duration, SystemTime};

fn create_test_config() -> DisplayConfig {
    DisplayConfig {
        device: "/tmp/test_fb".to_string(),
        backlight_device: None,
        ..PicamConfig::default().display
    }
}

fn create_test_renderer(panel: &MemoryPanel) -> FrameRenderer {
    FrameRenderer::new(Box::new(panel.clone()), 128, 128, Duration::from_millis(66))
}

#[test]
fn test_render_pushes_complete_frame() {
    let panel = MemoryPanel::new();
    let mut renderer = create_test_renderer(&panel);

    let mut scene = Scene::new();
    scene
        .clear(palette::BACKGROUND)
        .fill_rect(0, 0, 128, 18, palette::STATUS_BAR)
        .text(4, 40, "Camera", TextSize::Large, palette::TEXT);

    assert_eq!(renderer.render(&scene).unwrap(), RenderOutcome::Presented);
    assert_eq!(panel.blit_count(), 1);

    let frame = panel.last_frame().unwrap();
    assert_eq!(frame.pixel(0, 0), Some(palette::STATUS_BAR));
    assert_eq!(frame.pixel(127, 127), Some(palette::BACKGROUND));
    assert!(frame.count_color(palette::TEXT) > 0);
    assert_eq!(renderer.stats().frames_presented, 1);
}

#[test]
fn test_over_budget_frame_is_dropped() {
    let panel = MemoryPanel::new();
    let mut renderer = FrameRenderer::new(Box::new(panel.clone()), 128, 128, Duration::ZERO);

    let mut scene = Scene::new();
    scene.clear(palette::BACKGROUND);

    assert_eq!(renderer.render(&scene).unwrap(), RenderOutcome::Dropped);
    assert_eq!(panel.blit_count(), 0);
    assert_eq!(renderer.stats().frames_dropped, 1);
}

#[test]
fn test_blit_error_is_reported_and_counted() {
    let panel = MemoryPanel::new();
    let mut renderer = create_test_renderer(&panel);
    panel.fail_next_blit();

    let mut scene = Scene::new();
    scene.clear(palette::BLACK);

    assert!(renderer.render(&scene).is_err());
    assert_eq!(renderer.stats().blit_errors, 1);
    assert_eq!(renderer.render(&scene).unwrap(), RenderOutcome::Presented);
}

#[test]
fn test_backlight_follows_renderer() {
    let panel = MemoryPanel::new();
    let mut renderer = create_test_renderer(&panel);

    renderer.set_backlight(false).unwrap();
    assert!(!panel.backlight_on());
    assert!(!renderer.backlight_on());

    renderer.set_backlight(true).unwrap();
    assert!(panel.backlight_on());
}

#[test]
fn test_preview_scales_over_buffer() {
    // 2x2 frame: red, green / blue, white
    let data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
    let frame = FrameData::new(1, SystemTime::now(), data, 2, 2);

    let mut buffer = FrameBuffer::new(4, 4);
    let mut scene = Scene::new();
    scene.preview(frame);
    scene.compose(&mut buffer);

    assert_eq!(buffer.pixel(0, 0), Some(Rgb565::RED));
    assert_eq!(buffer.pixel(3, 0), Some(Rgb565::GREEN));
    assert_eq!(buffer.pixel(0, 3), Some(Rgb565::BLUE));
    assert_eq!(buffer.pixel(3, 3), Some(Rgb565::WHITE));
}

#[test]
fn test_draw_target_clips_out_of_bounds() {
    let mut buffer = FrameBuffer::new(8, 8);
    buffer
        .draw_iter([
            Pixel(Point::new(-1, 0), Rgb565::RED),
            Pixel(Point::new(8, 8), Rgb565::RED),
            Pixel(Point::new(7, 7), Rgb565::RED),
        ])
        .unwrap();

    assert_eq!(buffer.count_color(Rgb565::RED), 1);
    assert_eq!(buffer.size(), Size::new(8, 8));
}

#[test]
fn test_icons_draw_inside_their_cell() {
    for icon in [
        Icon::Camera,
        Icon::Gear,
        Icon::Wifi,
        Icon::Warning,
        Icon::Folder,
        Icon::Hourglass,
    ] {
        let mut buffer = FrameBuffer::new(20, 20);
        icon.draw(&mut buffer, Point::new(4, 4), Rgb565::WHITE).unwrap();

        let lit = buffer.count_color(Rgb565::WHITE);
        assert!(lit > 0, "{:?} drew nothing", icon);
        for y in 0..20 {
            for x in 0..20 {
                if buffer.pixel(x, y) == Some(Rgb565::WHITE) {
                    assert!((4..16).contains(&x) && (4..16).contains(&y));
                }
            }
        }
    }
}

#[test]
fn test_scene_queries() {
    let mut scene = Scene::new();
    scene
        .icon(2, 2, Icon::Warning, palette::WARNING)
        .centered_text(128, 60, "Saved", TextSize::Large, palette::OK);

    assert!(scene.contains_icon(Icon::Warning));
    assert!(!scene.contains_icon(Icon::Gear));
    assert!(scene.contains_text("Saved"));
    match &scene.commands()[1] {
        DrawCommand::Text { x, .. } => assert_eq!(*x, (128 - 5 * 9) / 2),
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_rgb24_conversion() {
    let rgb24 = vec![255, 0, 0, 0, 255, 0];
    let words = DisplayConverter::rgb24_to_rgb565(&rgb24, 2, 1).unwrap();
    assert_eq!(words, vec![0xF800, 0x07E0]);

    assert!(DisplayConverter::rgb24_to_rgb565(&rgb24, 3, 1).is_err());
}

#[test]
fn test_rotation() {
    // 3x2 image
    // 1 2 3
    // 4 5 6
    let data = vec![1, 2, 3, 4, 5, 6];

    let (rotated, w, h) = DisplayConverter::rotate_rgb565(&data, 3, 2, Rotation::Rotate90).unwrap();
    assert_eq!((w, h), (2, 3));
    assert_eq!(rotated, vec![4, 1, 5, 2, 6, 3]);

    let (rotated, _, _) = DisplayConverter::rotate_rgb565(&data, 3, 2, Rotation::Rotate180).unwrap();
    assert_eq!(rotated, vec![6, 5, 4, 3, 2, 1]);

    let (rotated, w, h) =
        DisplayConverter::rotate_rgb565(&data, 3, 2, Rotation::Rotate270).unwrap();
    assert_eq!((w, h), (2, 3));
    assert_eq!(rotated, vec![3, 6, 2, 5, 1, 4]);
}

#[test]
fn test_framebuffer_panel_writes_le_rgb565() {
    let fb = tempfile::NamedTempFile::new().unwrap();
    let config = DisplayConfig {
        device: fb.path().to_string_lossy().to_string(),
        width: 2,
        height: 1,
        ..create_test_config()
    };

    let mut panel = FramebufferPanel::open(&config).unwrap();
    let mut buffer = FrameBuffer::new(2, 1);
    buffer
        .draw_iter([
            Pixel(Point::new(0, 0), Rgb565::RED),
            Pixel(Point::new(1, 0), Rgb565::BLUE),
        ])
        .unwrap();
    panel.blit(&buffer).unwrap();
    panel.set_backlight(false).unwrap();

    let mut written = Vec::new();
    std::fs::File::open(fb.path())
        .unwrap()
        .read_to_end(&mut written)
        .unwrap();
    assert_eq!(written, vec![0x00, 0xF8, 0x1F, 0x00]);
}

#[test]
fn test_missing_framebuffer_is_fatal() {
    let config = DisplayConfig {
        device: "/nonexistent/fb9".to_string(),
        ..create_test_config()
    };
    let err = open_renderer(&config, false).err().unwrap();
    assert!(!err.is_recoverable());

    assert!(open_renderer(&config, true).is_ok());
}
