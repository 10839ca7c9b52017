use super::*;

#[test]
fn paint_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from(["pixelboard", "--user-id", "u1", "paint", "-3", "7", "#ff0000"]).expect("parse");
    let Command::Paint { x, y, color } = cli.command else { panic!("expected paint") };
    assert_eq!((x, y, color.as_str()), (-3, 7, "#ff0000"));
    assert_eq!(cli.user_id.as_deref(), Some("u1"));
}

#[test]
fn watch_defaults() {
    let cli = Cli::try_parse_from(["pixelboard", "watch"]).expect("parse");
    let Command::Watch { seconds, report_every } = cli.command else { panic!("expected watch") };
    assert_eq!(seconds, None);
    assert_eq!(report_every, 5);
    assert!(!cli.verbose);
}

#[test]
fn paint_requires_color() {
    assert!(Cli::try_parse_from(["pixelboard", "paint", "1", "2"]).is_err());
}

#[test]
fn explicit_base_url_wins_and_drops_trailing_slash() {
    let config = resolve_config(Some("http://example.test:8080/")).expect("config");
    assert_eq!(config.base_url, "http://example.test:8080");
    assert_eq!(config.cells_url(), "http://example.test:8080/api/cells");
}
