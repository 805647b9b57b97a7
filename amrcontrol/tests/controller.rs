//! MusicController against a fake Music application.

mod common;

use std::time::Duration;

use amrcontrol::invoker::{CallContext, ExecFailure, ExecOutcome, Invoker};
use amrcontrol::{
    CatalogProvider, ControlError, MatchTier, MusicController, PlaybackState, PlaybackStatus,
    RepeatMode, ScriptBuilder, TransportControl, VolumeControl,
};

use common::{FakeMusic, RecordingSleeper, ok, transient};

const PLAYLISTS: &str = "A1\tChill\tnone\n\
B2\tChill Vibes\tnone\n\
C3\tSuper Chill Mix\tnone\n\
D4\tFocus\u{FE0F}\tnone\n\
E5\tDeep Focus\tnone\n\
F6\tFocus Mix\tnone\n";

const DEVICES: &str = "OUT0\tComputer\tcomputer\ttrue\ttrue\t100\n\
OUT1\tKitchen\tHomePod\tfalse\ttrue\t40\n\
OUT2\tLiving Room\tApple TV\ttrue\ttrue\t60\n\
OUT3\tLiving Room Speaker\tAirPlay device\tfalse\ttrue\tmissing value\n";

fn controller(music: &FakeMusic) -> MusicController<FakeMusic, RecordingSleeper> {
    MusicController::new(
        Invoker::new(music.clone(), RecordingSleeper::default()),
        ScriptBuilder::default(),
    )
}

fn library() -> FakeMusic {
    FakeMusic::new()
        .respond("list playlists", ok(PLAYLISTS))
        .respond("list output devices", ok(DEVICES))
}

#[tokio::test]
async fn test_transport_commands() {
    let music = FakeMusic::new();
    let control = controller(&music);
    let ctx = CallContext::new();

    control.play(&ctx).await.unwrap();
    control.pause(&ctx).await.unwrap();
    control.toggle(&ctx).await.unwrap();
    control.next_track(&ctx).await.unwrap();
    control.previous_track(&ctx).await.unwrap();
    control.stop(&ctx).await.unwrap();

    assert_eq!(
        music.labels(),
        vec!["play", "pause", "toggle", "next track", "previous track", "stop"]
    );
    assert_eq!(
        music.script("toggle").unwrap(),
        "tell application \"Music\" to playpause"
    );
}

#[tokio::test]
async fn test_volume_and_modes() {
    let music = FakeMusic::new().respond("get volume", ok("65\n"));
    let control = controller(&music);
    let ctx = CallContext::new();

    assert_eq!(control.volume(&ctx).await.unwrap(), 65);

    control.set_volume(&ctx, 30).await.unwrap();
    assert!(music.script("set volume").unwrap().ends_with("set sound volume to 30"));

    let err = control.set_volume(&ctx, 101).await.unwrap_err();
    assert!(matches!(err, ControlError::InvalidArgument(_)));

    control.set_shuffle(&ctx, true).await.unwrap();
    assert!(music.script("set shuffle").unwrap().ends_with("set shuffle enabled to true"));

    control.set_repeat(&ctx, RepeatMode::One).await.unwrap();
    assert!(music.script("set repeat").unwrap().ends_with("set song repeat to one"));
}

#[tokio::test]
async fn test_bad_volume_output_is_a_parsing_error() {
    let music = FakeMusic::new().respond("get volume", ok("missing value"));
    let err = controller(&music)
        .volume(&CallContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::ParsingError(_)));
}

#[tokio::test]
async fn test_status() {
    let music = FakeMusic::new().respond(
        "status",
        ok("paused\t80\tfalse\toff\t61.2\t337\nBlue in Green\nMiles Davis\nKind of Blue\n"),
    );
    let status = controller(&music).status(&CallContext::new()).await.unwrap();

    assert_eq!(status.state, PlaybackState::Paused);
    assert_eq!(status.volume, 80);
    assert_eq!(status.repeat, RepeatMode::Off);
    assert_eq!(status.track.unwrap().name, "Blue in Green");
}

#[tokio::test]
async fn test_find_playlists_ranks() {
    let music = library();
    let ranked = controller(&music)
        .find_playlists(&CallContext::new(), "chill")
        .await
        .unwrap();

    let names: Vec<_> = ranked.iter().map(|r| r.item.name.as_str()).collect();
    assert_eq!(names, vec!["Chill", "Chill Vibes", "Super Chill Mix"]);
    assert_eq!(ranked[0].tier, MatchTier::Exact);
    assert_eq!(ranked[2].tier, MatchTier::Contains);
}

#[tokio::test]
async fn test_find_playlists_empty_query_lists_all() {
    let music = library();
    let ranked = controller(&music)
        .find_playlists(&CallContext::new(), "")
        .await
        .unwrap();
    assert_eq!(ranked.len(), 6);
}

#[tokio::test]
async fn test_play_playlist_resolves_by_id() {
    let music = library();
    let played = controller(&music)
        .play_playlist(&CallContext::new(), "focus")
        .await
        .unwrap();

    assert_eq!(played.id, "D4");
    assert_eq!(music.labels(), vec!["list playlists", "play playlist"]);
    assert!(music
        .script("play playlist")
        .unwrap()
        .contains("persistent ID is \"D4\""));
}

#[tokio::test]
async fn test_play_playlist_ambiguous_plays_nothing() {
    let music = library();
    let err = controller(&music)
        .play_playlist(&CallContext::new(), "fo")
        .await
        .unwrap_err();

    match err {
        ControlError::Ambiguous { kind, matches, .. } => {
            assert_eq!(kind, "playlist");
            let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
            assert_eq!(names, vec!["Focus\u{FE0F}", "Focus Mix"]);
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert_eq!(music.labels(), vec!["list playlists"]);
}

#[tokio::test]
async fn test_play_playlist_not_found() {
    let music = library();
    let err = controller(&music)
        .play_playlist(&CallContext::new(), "death metal")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No playlist matches 'death metal'");
}

#[tokio::test]
async fn test_play_playlist_rejects_blank_query() {
    let music = library();
    let err = controller(&music)
        .play_playlist(&CallContext::new(), " \u{FE0F} ")
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidArgument(_)));
    assert!(music.labels().is_empty());
}

#[tokio::test]
async fn test_route_outputs() {
    let music = library();
    let control = controller(&music);
    let selected = control
        .route_outputs(&CallContext::new(), &["kitchen", "computer"])
        .await
        .unwrap();

    let ids: Vec<_> = selected.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["OUT1", "OUT0"]);
    let script = music.script("set output devices").unwrap();
    assert!(script.contains("\"OUT1\""));
    assert!(script.contains("\"OUT0\""));
    assert!(!script.contains("\"OUT2\""));
}

#[tokio::test]
async fn test_route_outputs_is_all_or_nothing() {
    let music = library();
    let err = controller(&music)
        .route_outputs(&CallContext::new(), &["kitchen", "garage"])
        .await
        .unwrap_err();

    assert!(matches!(err, ControlError::NotFound { .. }));
    assert!(music.script("set output devices").is_none());
}

#[tokio::test]
async fn test_route_outputs_requires_a_device() {
    let music = library();
    let none: [&str; 0] = [];
    let err = controller(&music)
        .route_outputs(&CallContext::new(), &none)
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidArgument(_)));
    assert!(music.labels().is_empty());
}

#[tokio::test]
async fn test_add_and_remove_output() {
    let music = library();
    let control = controller(&music);
    let ctx = CallContext::new();

    let selected = control.add_output(&ctx, "kitch").await.unwrap();
    let ids: Vec<_> = selected.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["OUT0", "OUT2", "OUT1"]);

    // Exact "Living Room" wins over the longer "Living Room Speaker"
    let selected = control.remove_output(&ctx, "living room").await.unwrap();
    let ids: Vec<_> = selected.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["OUT0"]);
}

#[tokio::test]
async fn test_remove_last_output_is_refused() {
    let music = FakeMusic::new().respond(
        "list output devices",
        ok("OUT0\tComputer\tcomputer\ttrue\ttrue\t100\nOUT1\tKitchen\tHomePod\tfalse\ttrue\t40\n"),
    );
    let err = controller(&music)
        .remove_output(&CallContext::new(), "computer")
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidArgument(_)));
    assert!(music.script("set output devices").is_none());
}

#[tokio::test]
async fn test_remove_unselected_output_is_refused() {
    let music = FakeMusic::new().respond(
        "list output devices",
        ok("OUT0\tComputer\tcomputer\tfalse\ttrue\t100\nOUT1\tKitchen\tHomePod\tfalse\ttrue\t40\n"),
    );
    let err = controller(&music)
        .remove_output(&CallContext::new(), "kitchen")
        .await
        .unwrap_err();
    match err {
        ControlError::InvalidArgument(message) => {
            assert_eq!(message, "'Kitchen' is not a selected output device");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(music.script("set output devices").is_none());
}

#[tokio::test]
async fn test_seek() {
    let music = FakeMusic::new();
    controller(&music)
        .seek(&CallContext::new(), 95)
        .await
        .unwrap();
    assert!(music.script("seek").unwrap().ends_with("set player position to 95"));
}

#[tokio::test]
async fn test_listing_failures_propagate() {
    let music = FakeMusic::new().respond("list playlists", transient());
    let err = controller(&music)
        .playlists(&CallContext::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ControlError::TransientExhausted { attempts: 3, .. }));
    assert_eq!(music.labels().len(), 3);
}

#[tokio::test]
async fn test_permanent_failure_surfaces_output() {
    let music = FakeMusic::new().respond(
        "play",
        ExecOutcome::failure(
            "execution error: Music got an error: Can't get playlist. (-1728)\n",
            ExecFailure::Exit(Some(1)),
        ),
    );
    let err = controller(&music).play(&CallContext::new()).await.unwrap_err();
    match err {
        ControlError::PermanentExecution { label, output, .. } => {
            assert_eq!(label, "play");
            assert!(output.ends_with("(-1728)"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_deadline_interrupts_operation() {
    let music = FakeMusic::new();
    let ctx = CallContext::with_timeout(Duration::from_secs(1));
    tokio::time::advance(Duration::from_secs(2)).await;

    let err = controller(&music).play(&ctx).await.unwrap_err();
    assert!(err.is_interrupted());
}
