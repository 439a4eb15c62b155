//! Integration tests for the geolocation monitor

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use stockwatch_core::models::AreaMatch;
use stockwatch_geo::{AreaClassifier, MapConverter, TrackingLog};
use stockwatch_pipeline::GeolocationMonitor;
use stockwatch_store::{MemoryNotificationStore, NotificationFeed, ProcessedSet};

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes
}

struct Fixture {
    root: TempDir,
    store: Arc<MemoryNotificationStore>,
    monitor: Arc<GeolocationMonitor>,
}

impl Fixture {
    fn defect_dir(&self) -> PathBuf {
        self.root.path().join("images")
    }

    fn add_defect(&self, name: &str) {
        fs::write(self.defect_dir().join(name), b"jpeg").unwrap();
    }
}

fn fixture(processed_capacity: usize) -> Fixture {
    let root = TempDir::new().unwrap();
    let dir = root.path();
    fs::create_dir_all(dir.join("images")).unwrap();

    fs::write(
        dir.join("tracking.csv"),
        "1707000000.0,5.0,5.0\n1707000010.0,0.5,0.5\nbroken,row\n1707000060.0,9.0,9.0\n",
    )
    .unwrap();
    fs::write(dir.join("map.yaml"), "image: map.png\nresolution: 0.05\norigin: [0.0, 0.0, 0.0]\n")
        .unwrap();
    fs::write(dir.join("map.png"), png(640, 400)).unwrap();
    fs::write(
        dir.join("areas.json"),
        r#"[{"name": "Dairy", "x": 50, "y": 250, "w": 100, "h": 100}]"#,
    )
    .unwrap();

    let store = Arc::new(MemoryNotificationStore::new(200));
    let monitor = GeolocationMonitor::new(
        dir.join("images"),
        store.clone() as Arc<dyn NotificationFeed>,
        ProcessedSet::new(processed_capacity),
        Arc::new(MapConverter::new(dir.join("map.yaml"), dir.join("map.png"))),
        TrackingLog::new(dir.join("tracking.csv")),
        AreaClassifier::new(dir.join("areas.json")),
    )
    .with_interval(Duration::from_millis(20));

    Fixture {
        root,
        store,
        monitor: Arc::new(monitor),
    }
}

#[test]
fn test_scan_publishes_geolocated_event() {
    let fx = fixture(100);
    fx.add_defect("defect_1707000001.5.jpg");

    let report = fx.monitor.scan_once().unwrap();
    assert_eq!(report.published, 1);

    let events = fx.store.snapshot();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.area, AreaMatch::Named("Dairy".to_string()));
    assert_eq!(event.coords_label(), "(5.0, 5.0)");
    assert!((event.pixel.x - 100.0).abs() < 1e-9);
    assert!((event.pixel.y - 300.0).abs() < 1e-9);
    assert_eq!(event.image, "defect_1707000001.5.jpg");
    assert_eq!(event.captured_at.timestamp(), 1_707_000_001);
}

#[test]
fn test_same_image_is_notified_once() {
    let fx = fixture(100);
    fx.add_defect("defect_1707000000.jpg");

    assert_eq!(fx.monitor.scan_once().unwrap().published, 1);
    assert_eq!(fx.monitor.scan_once().unwrap().published, 0);
    assert_eq!(fx.store.len(), 1);
}

#[test]
fn test_unmatched_and_bad_names_are_marked_processed() {
    let fx = fixture(100);
    fx.add_defect("defect_1707000030.jpg");
    fx.add_defect("defect_not-a-time.jpg");
    fx.add_defect("readme.txt");

    let report = fx.monitor.scan_once().unwrap();
    assert_eq!(report.published, 0);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(fx.monitor.processed().len(), 2);

    let again = fx.monitor.scan_once().unwrap();
    assert_eq!(again.unmatched + again.skipped, 0);
    assert!(fx.store.is_empty());
}

#[test]
fn test_point_outside_areas_is_unclassified() {
    let fx = fixture(100);
    // 0.5m -> pixel (10, 390), outside the Dairy rectangle
    fx.add_defect("defect_1707000011.jpg");

    fx.monitor.scan_once().unwrap();
    assert_eq!(fx.store.snapshot()[0].area, AreaMatch::Unclassified);
}

#[test]
fn test_missing_area_file_reports_sentinel() {
    let fx = fixture(100);
    fs::remove_file(fx.root.path().join("areas.json")).unwrap();
    fx.add_defect("defect_1707000000.jpg");

    fx.monitor.scan_once().unwrap();
    assert_eq!(fx.store.snapshot()[0].area, AreaMatch::NoAreasConfigured);
}

#[test]
fn test_more_images_than_processed_capacity() {
    let fx = fixture(3);
    for name in [
        "defect_1707000000.jpg",
        "defect_1707000001.jpg",
        "defect_1707000002.jpg",
        "defect_1707000003.jpg",
    ] {
        fx.add_defect(name);
    }

    assert_eq!(fx.monitor.scan_once().unwrap().published, 4);
    assert_eq!(fx.monitor.scan_once().unwrap().published, 0);
    assert_eq!(fx.monitor.scan_once().unwrap().published, 0);
    assert_eq!(fx.store.len(), 4);

    // Entries for removed files make room again
    fs::remove_file(fx.defect_dir().join("defect_1707000000.jpg")).unwrap();
    fs::remove_file(fx.defect_dir().join("defect_1707000001.jpg")).unwrap();
    fx.add_defect("defect_1707000004.jpg");
    assert_eq!(fx.monitor.scan_once().unwrap().published, 1);
    assert_eq!(fx.monitor.processed().len(), 3);
}

#[test]
fn test_processed_set_reconciles_with_directory() {
    let fx = fixture(100);
    fx.add_defect("defect_1707000000.jpg");
    fx.monitor.scan_once().unwrap();

    fs::remove_file(fx.defect_dir().join("defect_1707000000.jpg")).unwrap();
    let report = fx.monitor.scan_once().unwrap();
    assert_eq!(report.forgotten, 1);
    assert!(fx.monitor.processed().is_empty());
}

#[test]
fn test_missing_defect_dir_is_not_an_error() {
    let fx = fixture(100);
    fs::remove_dir_all(fx.defect_dir()).unwrap();
    assert_eq!(fx.monitor.scan_once().unwrap().published, 0);
}

#[tokio::test]
async fn test_run_picks_up_new_images_and_stops() {
    let fx = fixture(100);
    let token = CancellationToken::new();
    let handle = tokio::spawn(fx.monitor.clone().run(token.clone()));

    fx.add_defect("defect_1707000059.jpg");

    for _ in 0..100 {
        if !fx.store.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(fx.store.len(), 1);
    assert_eq!(fx.store.snapshot()[0].coords_label(), "(9.0, 9.0)");

    token.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("monitor did not stop")
        .unwrap();
}
