use silverton_core::Direction;
use silverton_rendering_macroquad::{resolve_held_direction, wrap_text};

#[test]
fn no_keys_held_yields_no_direction() {
    assert_eq!(resolve_held_direction(false, false, false, false), None);
}

#[test]
fn single_keys_map_to_their_direction() {
    assert_eq!(
        resolve_held_direction(true, false, false, false),
        Some(Direction::Up)
    );
    assert_eq!(
        resolve_held_direction(false, true, false, false),
        Some(Direction::Down)
    );
    assert_eq!(
        resolve_held_direction(false, false, true, false),
        Some(Direction::Left)
    );
    assert_eq!(
        resolve_held_direction(false, false, false, true),
        Some(Direction::Right)
    );
}

#[test]
fn vertical_keys_win_over_horizontal_ones() {
    assert_eq!(
        resolve_held_direction(true, false, true, true),
        Some(Direction::Up)
    );
    assert_eq!(
        resolve_held_direction(false, true, false, true),
        Some(Direction::Down)
    );
}

#[test]
fn up_beats_down_and_left_beats_right() {
    assert_eq!(
        resolve_held_direction(true, true, false, false),
        Some(Direction::Up)
    );
    assert_eq!(
        resolve_held_direction(false, false, true, true),
        Some(Direction::Left)
    );
}

#[test]
fn wrapped_dialog_lines_fit_the_box() {
    let text = "The town has a rich history. Explore and talk to everyone!";
    let lines = wrap_text(text, 120.0, |line| line.len() as f32 * 8.0);

    assert!(lines.len() > 1);
    assert!(lines.iter().all(|line| line.len() as f32 * 8.0 <= 120.0));
    assert_eq!(lines.join(" "), text);
}
