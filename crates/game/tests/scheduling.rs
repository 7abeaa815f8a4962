use duel::{
    BufferState, CombatantProfile, CommandKind, Delivery, Frame, FrameCommand, Lockstep,
    MatchContext, MatchEvent, PlayerId, ResumeKind, SyncConfig,
};

const INTERVAL: u64 = 33;

fn duel() -> MatchContext {
    MatchContext::two_player(
        (PlayerId::from("alice"), CombatantProfile::named("Alice")),
        (PlayerId::from("bob"), CombatantProfile::named("Bob")),
        Default::default(),
    )
    .unwrap()
}

fn alice() -> PlayerId {
    PlayerId::from("alice")
}

#[test]
fn two_frames_do_not_start_a_third_does() {
    let mut sync = Lockstep::new(SyncConfig::default());
    let mut ctx = duel();

    sync.receive(Frame::new(1), Delivery::Live, 0);
    sync.receive(Frame::new(2), Delivery::Live, 0);
    for now in [0, 33, 66, 99] {
        assert_eq!(sync.update(&mut ctx, now, 33.0).frames_executed, 0);
    }
    assert_eq!(sync.executed_frames(), 0);
    assert_eq!(sync.state(), BufferState::Buffering);

    sync.receive(Frame::new(3), Delivery::Live, 100);
    let report = sync.update(&mut ctx, 100, 1.0);

    assert_eq!(report.frames_executed, 1);
    assert_eq!(ctx.frame_id(), Some(1));
}

#[test]
fn backlog_is_drained_before_prediction() {
    let mut sync = Lockstep::new(SyncConfig::default());
    let mut ctx = duel();

    let mut frames: Vec<Frame> = (1..=10).map(Frame::new).collect();
    frames[0].push(FrameCommand::set_heading("alice", 90.0));
    for frame in frames {
        sync.receive(frame, Delivery::Live, 0);
    }

    let before = sync.executed_frames();
    let report = sync.update(&mut ctx, 0, 0.0);

    assert_eq!(report.frames_executed, 10);
    assert!(report.caught_up);
    assert_eq!(sync.executed_frames(), before + 10);
    assert_eq!(sync.buffered(), 0);
    assert_eq!(sync.state(), BufferState::Running);

    // Prediction ran after the last frame, one interval ahead.
    let a = ctx.combatant(&alice()).unwrap();
    let expected = a.logic_position() + a.velocity() * INTERVAL as f32;
    assert!((a.predicted_position() - expected).length() < 1e-3);
}

#[test]
fn stop_freezes_heading_where_it_was() {
    let mut sync = Lockstep::new(SyncConfig::default());
    let mut ctx = duel();

    sync.receive(
        Frame::with_commands(1, vec![FrameCommand::set_heading("alice", 90.0)]),
        Delivery::Live,
        0,
    );
    sync.receive(
        Frame::with_commands(2, vec![FrameCommand::stop("alice")]),
        Delivery::Live,
        0,
    );
    sync.receive(Frame::new(3), Delivery::Live, 0);

    sync.update(&mut ctx, 0, 0.0);
    let heading_at_stop = ctx.combatant(&alice()).unwrap().logic_heading();
    assert_eq!(heading_at_stop, 10.0);

    sync.update(&mut ctx, 33, 33.0);
    let a = ctx.combatant(&alice()).unwrap();
    assert_eq!(a.destination_heading(), heading_at_stop);
    assert_eq!(a.speed(), 0.0);

    sync.update(&mut ctx, 66, 33.0);
    let a = ctx.combatant(&alice()).unwrap();
    assert_eq!(sync.last_executed_id(), Some(3));
    assert_eq!(a.logic_heading(), heading_at_stop);
    assert_eq!(a.destination_heading(), heading_at_stop);
}

#[test]
fn unknown_actor_is_dropped_and_frame_still_runs() {
    let mut sync = Lockstep::new(SyncConfig::default());
    let mut ctx = duel();

    sync.receive(
        Frame::with_commands(
            1,
            vec![
                FrameCommand::fire("mallory"),
                FrameCommand::set_heading("alice", 450.0),
            ],
        ),
        Delivery::Live,
        0,
    );
    sync.receive(Frame::new(2), Delivery::Live, 0);
    sync.receive(Frame::new(3), Delivery::Live, 0);
    sync.update(&mut ctx, 0, 0.0);

    assert_eq!(sync.processor().dropped(), 1);
    assert_eq!(ctx.combatant(&alice()).unwrap().destination_heading(), 90.0);
    assert!(ctx.projectiles().is_empty());
}

#[test]
fn resume_reanchors_clock_after_backlog() {
    let mut sync = Lockstep::new(SyncConfig::default());
    let mut ctx = duel();

    for id in 1..=3 {
        sync.receive(Frame::new(id), Delivery::Live, 0);
    }
    sync.update(&mut ctx, 0, 0.0);

    sync.resume(&mut ctx, ResumeKind::NetworkDrop, 1000);
    sync.set_resume_target(30);
    for id in 4..=30 {
        sync.receive(Frame::new(id), Delivery::Replay, 1000);
    }
    assert_eq!(sync.state(), BufferState::Reconnecting);

    let report = sync.update(&mut ctx, 1000, 16.0);
    assert!(!report.rendered);
    assert!(!report.reconnect_completed);
    assert_eq!(sync.last_executed_id(), Some(30));
    assert!(sync.is_reconnecting());

    sync.receive(Frame::new(31), Delivery::Live, 1010);
    let report = sync.update(&mut ctx, 1010, 10.0);

    assert!(report.reconnect_completed);
    assert!(!sync.is_reconnecting());
    assert_eq!(sync.state(), BufferState::Running);
    assert_eq!(sync.executed_frames(), 31);
    // Origin now sits exactly 31 intervals before the completion time.
    assert_eq!(sync.clock().lag_ms(1010), 0);
    assert!(!sync.clock().frame_due(1010 + INTERVAL - 1));
    assert!(sync.clock().frame_due(1010 + INTERVAL));

    let overlay = sync.debug_overlay(1010);
    assert_eq!(overlay.reconnect_successes, 1);
    assert!(sync.drain_events().iter().any(|e| matches!(
        e.event,
        MatchEvent::ReconnectCompleted { frame_id: 31, executed: 31 }
    )));
}

#[test]
fn rejoin_applies_snapshot_before_backlog() {
    let mut sync = Lockstep::new(SyncConfig::default().with_local_player("alice"));
    let mut ctx = duel();

    let mut snapshot = ctx.snapshot();
    snapshot.combatants[0].position = glam::Vec2::new(600.0, 300.0);
    snapshot.combatants[0].hit_points = 12;

    sync.resume(&mut ctx, ResumeKind::Rejoin(snapshot), 0);

    let a = ctx.combatant(&alice()).unwrap();
    assert_eq!(a.logic_position(), glam::Vec2::new(600.0, 300.0));
    assert_eq!(a.render_position(), glam::Vec2::new(600.0, 300.0));
    assert_eq!(a.hit_points(), 12);
    assert!(sync.drain_events().iter().any(|e| e.event
        == MatchEvent::ReconnectStarted { rejoin: true }));
}

#[test]
fn heartbeat_delay_feeds_overlay() {
    let mut sync = Lockstep::new(SyncConfig::default().with_local_player("alice"));

    let probe = sync.next_heartbeat(500).unwrap();
    assert!(matches!(probe.kind, CommandKind::Heartbeat { seq: 1, sent_at_ms: 500 }));

    let echoed = FrameCommand::new("bob", CommandKind::Heartbeat { seq: 9, sent_at_ms: 0 });
    sync.receive(Frame::with_commands(1, vec![probe, echoed]), Delivery::Live, 560);

    let overlay = sync.debug_overlay(560);
    assert_eq!(overlay.last_delay_ms, 60);
    assert_eq!(sync.telemetry().delay().samples(), 1);
    assert!(overlay.lines().iter().any(|l| l == "command delay: 60.0(60)ms"));
}
