use super::*;

#[test]
fn parses_track_defaults() {
    let cli = Cli::try_parse_from(["bilitrack", "track"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Track { checkpoint: None }));
    assert!(!cli.json);
}

#[test]
fn parses_track_with_single_checkpoint() {
    let cli = Cli::try_parse_from(["bilitrack", "track", "--checkpoint", "24"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Track {
            checkpoint: Some(24)
        }
    ));
}

#[test]
fn parses_global_json_flag_after_subcommand() {
    let cli = Cli::try_parse_from(["bilitrack", "stats", "--json"]).unwrap();
    assert!(cli.json);
    assert!(matches!(cli.command, Commands::Stats));
}

#[test]
fn parses_add_with_uploaded_at() {
    let cli = Cli::try_parse_from([
        "bilitrack",
        "add",
        "vid-123",
        "BV1xx411x7xx",
        "--channel",
        "100",
        "--uploaded-at",
        "2026-08-01T12:00:00Z",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Add {
            ref video_id,
            ref bvid,
            ref channel,
            uploaded_at: Some(_),
        } if video_id == "vid-123" && bvid == "BV1xx411x7xx" && channel == "100"
    ));
}

#[test]
fn parses_label_and_relabel() {
    let cli = Cli::try_parse_from(["bilitrack", "label", "--min-checkpoint", "168"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Label {
            min_checkpoint: Some(168)
        }
    ));

    let cli = Cli::try_parse_from(["bilitrack", "relabel"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Relabel {
            min_checkpoint: None
        }
    ));
}

#[test]
fn parses_channels_collect_all_with_count() {
    let cli =
        Cli::try_parse_from(["bilitrack", "channels", "collect-all", "--count", "50"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Channels(channels::ChannelsCommand::CollectAll { count: 50 })
    ));
}

#[test]
fn channels_collect_count_defaults_to_twenty() {
    let cli = Cli::try_parse_from(["bilitrack", "channels", "collect", "642389251"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Channels(channels::ChannelsCommand::Collect { ref uid, count: 20 })
            if uid == "642389251"
    ));
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["bilitrack"]).is_err());
}
