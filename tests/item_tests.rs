// Incremental redraw of a single item

mod common;

use common::{BlockTypesetter, GLYPH_HEIGHT, GLYPH_WIDTH, RecordingDisplay, canvas, canvas_sized};
use csm::item::{Canvas, Item, LEFT_MARGIN};
use csm::models::Region;
use tokio::sync::mpsc;

const OFFSET: i32 = 30;

fn item() -> Item {
    item_with_font(common::font())
}

fn item_with_font(font: std::sync::Arc<csm::models::Font>) -> Item {
    let (_tx, rx) = mpsc::channel(8);
    Item::new("cpu", rx, OFFSET, font)
}

fn text_region(chars: u32) -> Region {
    Region::new(LEFT_MARGIN, OFFSET, chars * GLYPH_WIDTH, GLYPH_HEIGHT)
}

fn blit_regions(canvas: &Canvas<RecordingDisplay, BlockTypesetter>) -> Vec<Region> {
    canvas.display.blits.iter().map(|b| b.region).collect()
}

#[test]
fn test_same_text_twice_draws_once() {
    let mut canvas = canvas();
    let mut item = item();

    assert!(item.update("CPU: 3%".into(), &mut canvas).unwrap());
    assert!(!item.update("CPU: 3%".into(), &mut canvas).unwrap());

    assert_eq!(canvas.display.blits.len(), 1);
    assert_eq!(canvas.typesetter.drawn.len(), 1);
}

#[test]
fn test_empty_text_on_fresh_item_is_a_no_op() {
    let mut canvas = canvas();
    let mut item = item();

    assert!(!item.update(String::new(), &mut canvas).unwrap());
    assert!(canvas.display.blits.is_empty());
    assert!(canvas.typesetter.measured.is_empty());
}

#[test]
fn test_first_text_uses_its_own_extent() {
    let mut canvas = canvas();
    let mut item = item();

    item.update("Memory: 42%".into(), &mut canvas).unwrap();

    assert_eq!(canvas.typesetter.measured, vec!["Memory: 42%".to_string()]);
    assert_eq!(blit_regions(&canvas), vec![text_region(11)]);
    assert_eq!(
        canvas.typesetter.drawn,
        vec![("Memory: 42%".to_string(), LEFT_MARGIN, OFFSET)]
    );
    assert_eq!(item.displayed(), "Memory: 42%");
}

#[test]
fn test_erase_rectangle_uses_previous_text_extent() {
    let mut canvas = canvas();
    let mut item = item();

    item.update("abc".into(), &mut canvas).unwrap();
    item.update("abcdef".into(), &mut canvas).unwrap();
    item.update("ab".into(), &mut canvas).unwrap();

    assert_eq!(
        canvas.typesetter.measured,
        vec!["abc".to_string(), "abc".to_string(), "abcdef".to_string()]
    );
    assert_eq!(
        blit_regions(&canvas),
        vec![text_region(3), text_region(3), text_region(6)]
    );
    assert_eq!(item.displayed(), "ab");
}

#[test]
fn test_shorter_text_clears_trailing_pixels() {
    let mut canvas = canvas();
    let mut item = item();
    let row = (OFFSET + 1) as u32;
    let green = Some([0x00, 0xff, 0x00, 0xff]);

    item.update("abcdef".into(), &mut canvas).unwrap();
    assert_eq!(canvas.surface.pixel(LEFT_MARGIN as u32 + 30, row), green);

    item.update("a".into(), &mut canvas).unwrap();
    assert_eq!(canvas.surface.pixel(LEFT_MARGIN as u32 + 1, row), green);
    assert_eq!(
        canvas.surface.pixel(LEFT_MARGIN as u32 + 30, row),
        Some([0, 0, 0, 0])
    );
}

#[test]
fn test_wider_text_is_blitted_only_within_previous_extent() {
    // Growing text is drawn into the surface in full, but only the old
    // extent is cleared and sent to the window.
    let mut canvas = canvas();
    let mut item = item();
    let row = (OFFSET + 1) as u32;

    item.update("a".into(), &mut canvas).unwrap();
    item.update("abcdef".into(), &mut canvas).unwrap();

    let last = canvas.display.blits.last().unwrap();
    assert_eq!(last.region, text_region(1));
    assert_eq!(last.pixels.len(), (GLYPH_WIDTH * GLYPH_HEIGHT * 4) as usize);
    assert_eq!(
        canvas.surface.pixel(LEFT_MARGIN as u32 + 30, row),
        Some([0x00, 0xff, 0x00, 0xff])
    );
}

#[test]
fn test_blit_carries_surface_pixels_as_bgra() {
    let mut canvas = canvas();
    let mut item = item_with_font(common::font_with_color([0xff, 0x00, 0x00, 0xff]));

    item.update("x".into(), &mut canvas).unwrap();

    let blit = &canvas.display.blits[0];
    assert!(
        blit.pixels
            .chunks_exact(4)
            .all(|px| px == [0x00, 0x00, 0xff, 0xff])
    );
}

#[test]
fn test_region_is_clipped_to_surface() {
    let mut canvas = canvas_sized(40, 60);
    let mut item = item();

    item.update("abcdefghij".into(), &mut canvas).unwrap();

    assert_eq!(
        blit_regions(&canvas),
        vec![Region::new(LEFT_MARGIN, OFFSET, 30, GLYPH_HEIGHT)]
    );
}

#[test]
fn test_failed_blit_still_records_drawn_text() {
    let mut canvas = canvas();
    canvas.display.fail_blits = true;
    let mut item = item();

    assert!(item.update("CPU: 1%".into(), &mut canvas).is_err());
    assert_eq!(item.displayed(), "CPU: 1%");
    assert!(!item.update("CPU: 1%".into(), &mut canvas).unwrap());
}

#[test]
fn test_repaint_blits_whole_surface() {
    let mut canvas = canvas_sized(20, 10);
    canvas.repaint().unwrap();

    let blit = &canvas.display.blits[0];
    assert_eq!(blit.region, Region::new(0, 0, 20, 10));
    assert_eq!(blit.pixels.len(), 20 * 10 * 4);
}
