//! Integration tests for meters running against a live session.

use mixdesk_core::MixdeskConfig;
use mixdesk_meter::{MeterSource, MeterTicker, SimulatedMeterSource};
use mixdesk_session::{ChannelKind, ChannelPatch, MixerAction, Session};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn ticker_sees_dispatched_changes() {
    let mut session = Session::with_defaults();
    let audio = session.state().channels.of_kind(ChannelKind::Audio).next().unwrap().id;
    let ticker = MeterTicker::spawn(
        session.subscribe(),
        SimulatedMeterSource::seeded(7, 0.0, 0.0),
        Duration::from_millis(20),
    );
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!ticker.latest().get(audio).unwrap().is_silent());

    session
        .dispatch(MixerAction::UpdateChannel {
            id: audio,
            patch: ChannelPatch::muted(true),
        })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(ticker.latest().get(audio).unwrap().is_silent());
    ticker.stop();
}

#[tokio::test(start_paused = true)]
async fn meters_never_write_state() {
    let session = Session::with_defaults();
    let before = session.shared();
    let config = MixdeskConfig::default();
    let ticker = MeterTicker::spawn(
        session.subscribe(),
        SimulatedMeterSource::seeded(8, config.meter_jitter, config.peak_decay),
        config.meter_interval(),
    );
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(ticker.latest().tick > 1);
    assert!(std::sync::Arc::ptr_eq(&before, &session.shared()));
}

#[tokio::test(start_paused = true)]
async fn prefader_meters_show_pulled_faders() {
    let mut session = Session::with_defaults();
    let audio = session.state().channels.of_kind(ChannelKind::Audio).next().unwrap().id;
    session
        .dispatch(MixerAction::UpdateChannel {
            id: audio,
            patch: ChannelPatch::volume(0.0),
        })
        .unwrap();
    let ticker = MeterTicker::spawn(
        session.subscribe(),
        SimulatedMeterSource::seeded(10, 0.0, 0.0),
        Duration::from_millis(20),
    );
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(ticker.latest().get(audio).unwrap().is_silent());

    session
        .dispatch(MixerAction::SetPrefaderMetering { on: true })
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let reading = *ticker.latest().get(audio).unwrap();
    assert!(reading.pre_fader);
    assert!(!reading.is_silent());
    ticker.stop();
}

#[test]
fn solo_silences_other_channels() {
    let mut session = Session::with_defaults();
    let ids: Vec<_> = session
        .state()
        .channels
        .of_kind(ChannelKind::Audio)
        .map(|c| c.id)
        .collect();
    session
        .dispatch(MixerAction::UpdateChannel {
            id: ids[1],
            patch: ChannelPatch::solo(true),
        })
        .unwrap();
    let mut source = SimulatedMeterSource::seeded(9, 0.1, 0.9);
    let readings = source.read(session.state());
    for reading in readings {
        assert_eq!(reading.is_silent(), reading.channel_id != ids[1]);
    }
}
