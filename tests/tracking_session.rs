//! Full-session behavior against a fake rigctld: initialization sequence,
//! shutdown restore, and fatal initialization failures.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use rigtrack::predict::GroundStation;
use rigtrack::track::{SessionState, TrackError, Tracker, TrackingSession};

// ISS-like elements with the drag terms zeroed so propagation is valid at
// any test wall-clock time.
const TLE_LINE1: &str = "1 25544U 98067A   08264.51782528  .00000000  00000-0  00000-0 0  9998";
const TLE_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

fn elements() -> sgp4::Elements {
    sgp4::Elements::from_tle(None, TLE_LINE1.as_bytes(), TLE_LINE2.as_bytes()).unwrap()
}

fn session() -> TrackingSession {
    TrackingSession {
        base_frequency_hz: 435_310_000,
        tune_step_hz: 50,
        horizon_deg: 0.0,
        pointing_threshold_deg: 1.0,
        tuning_enabled: true,
    }
}

/// A fake radio that answers every command and records what it saw.
async fn spawn_fake_radio(status: &'static str) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let commands = Arc::new(Mutex::new(Vec::new()));
    let seen = commands.clone();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let command = line.trim_start_matches('+').trim().to_string();
            seen.lock().unwrap().push(command.clone());
            let response = match command.chars().next() {
                Some('s') => format!("get_split_vfo:\nSplit: 1\nTX VFO: VFOB\n{status}\n"),
                Some('f') => format!("get_freq:\nFrequency: 435310000\n{status}\n"),
                _ => format!("{command}:\n{status}\n"),
            };
            if write_half.write_all(response.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    (addr, commands)
}

/// A device that accepts commands but never answers any of them.
async fn spawn_mute_device() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let commands = Arc::new(Mutex::new(Vec::new()));
    let seen = commands.clone();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(stream);
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => seen
                    .lock()
                    .unwrap()
                    .push(line.trim_start_matches('+').trim().to_string()),
            }
        }
    });

    (addr, commands)
}

/// A radio that answers everything except the split query, which it ignores.
async fn spawn_radio_without_split_reply() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let commands = Arc::new(Mutex::new(Vec::new()));
    let seen = commands.clone();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        loop {
            let mut line = String::new();
            match reader.read_line(&mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let command = line.trim_start_matches('+').trim().to_string();
            seen.lock().unwrap().push(command.clone());
            if command == "s" {
                continue;
            }
            let response = format!("{command}:\nRPRT 0\n");
            if write_half.write_all(response.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    (addr, commands)
}

#[tokio::test]
async fn interruption_restores_unsplit_mode_exactly_once() {
    let (addr, commands) = spawn_fake_radio("RPRT 0").await;
    let station = GroundStation::from_locator("JO89", 0.0).unwrap();

    let tracker = Tracker::connect(&addr.to_string(), None, session(), station, elements())
        .await
        .unwrap();
    assert_eq!(tracker.state(), SessionState::Connecting);

    let (stop_tx, stop_rx) = oneshot::channel();
    let run = tokio::spawn(tracker.run(stop_rx));

    // Let a couple of ticks happen, then interrupt mid-loop.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    stop_tx.send(()).unwrap();
    run.await.unwrap().unwrap();

    let seen = commands.lock().unwrap();
    assert_eq!(
        &seen[..3],
        &["S 1 VFOB", "M USB 2300", "X USB 2300"],
        "initialization sequence"
    );

    let restores = seen.iter().filter(|c| c.as_str() == "S 0 VFOA").count();
    assert_eq!(restores, 1, "exactly one unsplit command: {seen:?}");
    assert_eq!(seen.last().map(String::as_str), Some("S 0 VFOA"));
}

#[tokio::test]
async fn tracking_ticks_retune_the_downlink() {
    let (addr, commands) = spawn_fake_radio("RPRT 0").await;
    let station = GroundStation::from_locator("JO89", 0.0).unwrap();

    let tracker = Tracker::connect(&addr.to_string(), None, session(), station, elements())
        .await
        .unwrap();

    let (stop_tx, stop_rx) = oneshot::channel();
    let run = tokio::spawn(tracker.run(stop_rx));
    tokio::time::sleep(Duration::from_millis(2500)).await;
    stop_tx.send(()).unwrap();
    run.await.unwrap().unwrap();

    let seen = commands.lock().unwrap();
    // Each tick queries split state and commands a downlink frequency.
    assert!(seen.iter().any(|c| c == "s"), "{seen:?}");
    assert!(seen.iter().any(|c| c.starts_with("F ")), "{seen:?}");
    // Tuning enabled: the receive frequency is read back for drift.
    assert!(seen.iter().any(|c| c == "f"), "{seen:?}");
}

#[tokio::test]
async fn rotator_is_pointed_once_until_the_threshold_is_passed() {
    let (radio_addr, _radio_commands) = spawn_fake_radio("RPRT 0").await;
    let (rotator_addr, rotator_commands) = spawn_fake_radio("RPRT 0").await;
    let station = GroundStation::from_locator("JN58td", 0.0).unwrap();

    // A horizon below any reachable elevation keeps pointing on the live
    // geometry, and a huge threshold means only the first target moves it.
    let mut session = session();
    session.horizon_deg = -90.0;
    session.pointing_threshold_deg = 360.0;

    let tracker = Tracker::connect(
        &radio_addr.to_string(),
        Some(&rotator_addr.to_string()),
        session,
        station,
        elements(),
    )
    .await
    .unwrap();

    let (stop_tx, stop_rx) = oneshot::channel();
    let run = tokio::spawn(tracker.run(stop_rx));
    tokio::time::sleep(Duration::from_millis(3500)).await;
    stop_tx.send(()).unwrap();
    run.await.unwrap().unwrap();

    let seen = rotator_commands.lock().unwrap();
    let pointed: Vec<&String> = seen.iter().filter(|c| c.starts_with("P ")).collect();
    assert_eq!(pointed.len(), 1, "{seen:?}");

    // Well-formed two-axis target.
    let fields: Vec<&str> = pointed[0].split_whitespace().collect();
    assert_eq!(fields.len(), 3, "{:?}", pointed[0]);
    let azimuth: f64 = fields[1].parse().unwrap();
    let elevation: f64 = fields[2].parse().unwrap();
    assert!((0.0..=360.0).contains(&azimuth), "{azimuth}");
    assert!((-90.0..=90.0).contains(&elevation), "{elevation}");
}

#[tokio::test]
async fn silent_rotator_does_not_block_radio_tuning() {
    let (radio_addr, radio_commands) = spawn_fake_radio("RPRT 0").await;
    let (rotator_addr, rotator_commands) = spawn_mute_device().await;
    let station = GroundStation::from_locator("JN58td", 0.0).unwrap();

    let mut session = session();
    session.horizon_deg = -90.0;

    let tracker = Tracker::connect(
        &radio_addr.to_string(),
        Some(&rotator_addr.to_string()),
        session,
        station,
        elements(),
    )
    .await
    .unwrap();

    let (stop_tx, stop_rx) = oneshot::channel();
    let run = tokio::spawn(tracker.run(stop_rx));
    // Each tick stalls two seconds on the mute rotator; leave room for a few.
    tokio::time::sleep(Duration::from_millis(6500)).await;
    stop_tx.send(()).unwrap();
    run.await.unwrap().unwrap();

    // The rotator branch timed out every tick, the radio kept retuning.
    let pointed = rotator_commands.lock().unwrap();
    assert!(pointed.iter().any(|c| c.starts_with("P ")), "{pointed:?}");
    let tuned = radio_commands.lock().unwrap();
    let retunes = tuned.iter().filter(|c| c.starts_with("F ")).count();
    assert!(retunes >= 2, "{tuned:?}");
    assert_eq!(tuned.last().map(String::as_str), Some("S 0 VFOA"));
}

#[tokio::test]
async fn failed_split_check_does_not_block_pointing() {
    let (radio_addr, radio_commands) = spawn_radio_without_split_reply().await;
    let (rotator_addr, rotator_commands) = spawn_fake_radio("RPRT 0").await;
    let station = GroundStation::from_locator("JN58td", 0.0).unwrap();

    let mut session = session();
    session.horizon_deg = -90.0;

    let tracker = Tracker::connect(
        &radio_addr.to_string(),
        Some(&rotator_addr.to_string()),
        session,
        station,
        elements(),
    )
    .await
    .unwrap();

    let (stop_tx, stop_rx) = oneshot::channel();
    let run = tokio::spawn(tracker.run(stop_rx));
    tokio::time::sleep(Duration::from_millis(5500)).await;
    stop_tx.send(()).unwrap();
    run.await.unwrap().unwrap();

    // The radio branch forfeited every tick, the rotator was still pointed.
    let pointed = rotator_commands.lock().unwrap();
    assert!(pointed.iter().any(|c| c.starts_with("P ")), "{pointed:?}");
    let tuned = radio_commands.lock().unwrap();
    assert!(tuned.iter().all(|c| !c.starts_with("F ")), "{tuned:?}");
    assert_eq!(tuned.last().map(String::as_str), Some("S 0 VFOA"));
}

#[tokio::test]
async fn device_error_during_initialization_is_fatal() {
    let (addr, commands) = spawn_fake_radio("RPRT -11").await;
    let station = GroundStation::from_locator("JO89", 0.0).unwrap();

    let tracker = Tracker::connect(&addr.to_string(), None, session(), station, elements())
        .await
        .unwrap();

    let (_stop_tx, stop_rx) = oneshot::channel();
    let result = tracker.run(stop_rx).await;
    assert!(matches!(result, Err(TrackError::Initialize(_))));

    // The session never reached the tracking loop.
    let seen = commands.lock().unwrap();
    assert!(seen.iter().all(|c| !c.starts_with("F ")), "{seen:?}");
}

#[tokio::test]
async fn unreachable_radio_fails_to_connect() {
    // Bind-then-drop to get a port with no listener.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let station = GroundStation::from_locator("JO89", 0.0).unwrap();
    let result =
        Tracker::connect(&addr.to_string(), None, session(), station, elements()).await;
    assert!(matches!(result, Err(TrackError::RadioConnect(_))));
}
