use pretty_assertions::assert_eq;
use rdp_input::{MouseButton, SessionCommand};
use rdp_replay::script::Script;

fn button(x: i32, y: i32, down: bool) -> SessionCommand {
    SessionCommand::PointerButton {
        x,
        y,
        button: MouseButton::Left,
        down,
    }
}

#[test]
fn test_long_press_drag_script() {
    let script = Script::from_toml_str(include_str!("../scripts/long_press_drag.toml")).unwrap();
    let config = script.config.clone().unwrap_or_default();
    let lines = script.replay(config, false);

    let remote: Vec<_> = lines
        .iter()
        .filter(|l| l.command.is_remote_input())
        .map(|l| (l.t, l.command.clone()))
        .collect();
    assert_eq!(
        remote,
        vec![
            (600, button(50, 50, true)),
            (800, SessionCommand::PointerMove { x: 80, y: 80 }),
            (800, button(80, 80, false)),
            (1000, SessionCommand::Key { code: 0xA2, down: true }),
            (1100, SessionCommand::Key { code: 0x41, down: true }),
            (1100, SessionCommand::Key { code: 0x41, down: false }),
            (1100, SessionCommand::Key { code: 0xA2, down: false }),
        ]
    );
}

#[test]
fn test_overlay_drag_scrolls_view() {
    let script = Script::from_toml_str(include_str!("../scripts/overlay_drag.toml")).unwrap();
    let config = script.config.clone().unwrap_or_default();
    let lines = script.replay(config, false);

    let scrolls: Vec<_> = lines
        .iter()
        .filter_map(|l| match l.command {
            SessionCommand::ViewportChanged { scroll_x, .. } => Some(scroll_x),
            _ => None,
        })
        .collect();
    assert_eq!(scrolls, vec![20.0, 40.0, 60.0]);
}

#[test]
fn test_drain_fires_pending_timers() {
    let script = Script::from_toml_str(
        r#"
        [[event]]
        kind = "pointer"
        t = 0
        x = 10.0
        y = 10.0
        phase = "down"
        "#,
    )
    .unwrap();
    assert!(script.replay(Default::default(), false).is_empty());

    let lines = script.replay(Default::default(), true);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].t, 500);
    assert_eq!(lines[0].command, SessionCommand::BeginTouch);
}
