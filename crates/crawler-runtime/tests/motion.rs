//! End-to-end runs of the motion engine against the simulated robot.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crawler_geometry::Pose;
use crawler_hal::{SimPlant, SimRobot};
use crawler_runtime::recipes::{self, Mechanisms};
use crawler_runtime::{CancelToken, MotionEngine, MotionProgram, PathMarker};
use crawler_types::config::LocalizerKind;
use crawler_types::{CrawlerConfig, MotionOutcome, WheelPowers};

fn quick_config() -> CrawlerConfig {
    let mut config = CrawlerConfig {
        settle_ms: 0,
        loop_period_ms: 2,
        ..CrawlerConfig::default()
    };
    config.follower.timeout_secs = Some(10.0);
    config
}

fn robot(config: CrawlerConfig) -> (MotionEngine, SimPlant) {
    let (hw, plant) = SimRobot::builder().with_config(&config).build();
    let mut engine = MotionEngine::new(hw, config).expect("valid config");
    engine.prepare().expect("sim hardware prepares");
    (engine, plant)
}

type Log = Arc<Mutex<Vec<String>>>;

fn logging_marker(log: &Log, name: &str, percentage: f64) -> PathMarker {
    let log = Arc::clone(log);
    let label = name.to_string();
    PathMarker::new(name, percentage, move || {
        log.lock().unwrap().push(label.clone());
        Ok(())
    })
}

#[test]
fn stalled_encoders_time_out_after_budget() {
    let config = CrawlerConfig {
        timeout_secs: 1.0,
        ..quick_config()
    };
    let (mut engine, plant) = robot(config);
    plant.stall_all_encoders();

    let started = Instant::now();
    let outcome = engine.drive_distance(1.0, 0.0).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(outcome, MotionOutcome::TimedOut);
    assert!(elapsed >= Duration::from_secs(1), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "elapsed {elapsed:?}");
    assert_eq!(plant.wheel_powers(), WheelPowers::ZERO);
}

#[test]
fn settle_delay_holds_after_primitive() {
    let config = CrawlerConfig {
        settle_ms: 150,
        ..quick_config()
    };
    let (mut engine, plant) = robot(config);

    let started = Instant::now();
    assert_eq!(engine.turn_to_heading(0.0).unwrap(), MotionOutcome::Converged);
    assert!(started.elapsed() >= Duration::from_millis(150));
    assert!(plant.wheel_powers().is_zero());
}

#[test]
fn single_waypoint_path_finishes_immediately() {
    let (mut engine, plant) = robot(quick_config());
    let outcome = engine.follow_path(&[Pose::origin()], &mut []).unwrap();
    assert_eq!(outcome, MotionOutcome::Converged);
    assert!(plant.wheel_powers().is_zero());
    assert!(plant.pose().distance_to(&Pose::origin()) < 1e-6);
}

#[test]
fn markers_fire_in_ascending_order_along_a_straight_path() {
    let (mut engine, plant) = robot(quick_config());
    let log: Log = Arc::default();
    let mut markers = vec![
        logging_marker(&log, "85", 85.0),
        logging_marker(&log, "150", 150.0),
        logging_marker(&log, "25", 25.0),
        logging_marker(&log, "50", 50.0),
    ];
    let path = [Pose::origin(), Pose::point(0.5, 0.0)];

    let outcome = engine.follow_path(&path, &mut markers).unwrap();

    assert_eq!(outcome, MotionOutcome::Converged);
    assert_eq!(*log.lock().unwrap(), ["25", "50", "85"]);
    assert!(plant.pose().distance_to(&path[1]) < 0.05);
    assert!(plant.wheel_powers().is_zero());
}

#[test]
fn field_demo_completes_with_tracking_odometry() {
    let mut config = quick_config();
    config.follower.localizer = LocalizerKind::Tracking;
    let (mut engine, plant) = robot(config);

    let log: Log = Arc::default();
    let mut markers = recipes::demo_markers(
        Box::new(logging_action(&log, "intake on")),
        Box::new(logging_action(&log, "cycle indexer")),
        Box::new(logging_action(&log, "intake off")),
    );
    let path = recipes::demo_path();

    let outcome = engine.follow_path(&path, &mut markers).unwrap();

    assert_eq!(outcome, MotionOutcome::Converged);
    assert_eq!(
        *log.lock().unwrap(),
        ["intake on", "cycle indexer", "intake off"]
    );
    assert!(plant.pose().distance_to(&path[3]) < 0.05);
}

fn logging_action(
    log: &Log,
    label: &'static str,
) -> impl FnMut() -> Result<(), crawler_types::CrawlerError> + Send + 'static {
    let log = Arc::clone(log);
    move || {
        log.lock().unwrap().push(label.to_string());
        Ok(())
    }
}

#[test]
fn cancel_from_another_thread_stops_a_long_drive() {
    let token = CancelToken::new();
    let (engine, plant) = robot(quick_config());
    let mut engine = engine.with_cancel_token(token.clone());

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(150));
        token.cancel();
    });

    let started = Instant::now();
    let outcome = engine.drive_distance(3.0, 0.0).unwrap();
    canceller.join().unwrap();

    assert_eq!(outcome, MotionOutcome::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(plant.pose().x > 0.0 && plant.pose().x < 3.0);
    assert!(plant.wheel_powers().is_zero());
}

#[test]
fn sensor_dropouts_do_not_derail_a_drive() {
    let (mut engine, plant) = robot(quick_config());
    plant.fail_next_reads(10);
    let outcome = engine.drive_distance(0.3, 0.0).unwrap();
    assert_eq!(outcome, MotionOutcome::Converged);
    assert!((plant.pose().x - 0.3).abs() < 0.02);
}

#[test]
fn just_go_straight_recipe_moves_half_a_meter() {
    let (mut engine, plant) = robot(quick_config());
    let mut recipe = recipes::build("just_go_straight", Mechanisms::logging()).unwrap();

    let outcome = recipe.execute(&mut engine).unwrap();

    assert_eq!(outcome, MotionOutcome::Converged);
    let pose = plant.pose();
    assert!((pose.x - 0.5).abs() < 0.02, "x = {}", pose.x);
    assert!(pose.heading.abs() < 0.05);
}

#[test]
fn red_goal_shoots_once_between_drive_and_strafe() {
    let config = CrawlerConfig {
        timeout_secs: 8.0,
        ..quick_config()
    };
    let (mut engine, plant) = robot(config);
    let shots = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&shots);
    let observer = plant.clone();
    let mut recipe = recipes::red_goal(move || {
        recorder.lock().unwrap().push(observer.pose());
        Ok(())
    });

    let outcome = recipe.execute(&mut engine).unwrap();

    assert_eq!(outcome, MotionOutcome::Converged);
    let shots = shots.lock().unwrap();
    assert_eq!(shots.len(), 1);
    assert!((shots[0].x - 1.54).abs() < 0.03);
    assert!(shots[0].y.abs() < 0.03);
    let end = plant.pose();
    assert!((end.y + 1.0).abs() < 0.03, "y = {}", end.y);
}
