//! Capture-timestamp naming policy for raw and defect images.
//!
//! Defect images are named `defect_<timestamp>.jpg`, where `<timestamp>` is
//! fractional seconds since the Unix epoch. The geolocation monitor reads the
//! timestamp back from that name, so the policy here must stay stable.

use chrono::Utc;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

pub const DEFECT_PREFIX: &str = "defect_";
pub const RAW_PREFIX: &str = "image_";
pub const DEFECT_SUFFIX: &str = ".jpg";

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?$").expect("valid numeric pattern"));

static EMBEDDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{9,}(?:\.[0-9]+)?").expect("valid timestamp pattern"));

/// Current wall-clock time as epoch seconds with microsecond precision
pub fn clock_timestamp() -> String {
    format_micros(Utc::now().timestamp_micros())
}

fn format_micros(micros: i64) -> String {
    format!("{}.{:06}", micros.div_euclid(1_000_000), micros.rem_euclid(1_000_000))
}

/// The timestamp carried by a file name, if any.
///
/// A leading `image_` or `defect_` is stripped from the stem; a purely numeric
/// remainder is used verbatim. Otherwise the first run of at least nine digits
/// (with an optional fraction) anywhere in the stem is used.
pub fn embedded_timestamp(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);

    let candidate = stem
        .strip_prefix(RAW_PREFIX)
        .or_else(|| stem.strip_prefix(DEFECT_PREFIX))
        .unwrap_or(stem);

    if NUMERIC.is_match(candidate) {
        return Some(candidate.to_string());
    }

    EMBEDDED.find(stem).map(|m| m.as_str().to_string())
}

/// Timestamp for a raw image name, falling back to the current clock
pub fn extract_timestamp(file_name: &str) -> String {
    embedded_timestamp(file_name).unwrap_or_else(clock_timestamp)
}

/// `defect_<timestamp>.jpg`
pub fn defect_file_name(timestamp: &str) -> String {
    format!("{DEFECT_PREFIX}{timestamp}{DEFECT_SUFFIX}")
}

/// Defect name for `src_name` that does not exist yet in `defect_dir`.
///
/// On collision the timestamp is regenerated from the clock until the name is
/// free. Regenerated timestamps strictly increase so the loop terminates even
/// when the clock has not advanced.
pub fn unique_defect_name(src_name: &str, defect_dir: &Path) -> String {
    let mut name = defect_file_name(&extract_timestamp(src_name));
    let mut last_micros: Option<i64> = None;

    while defect_dir.join(&name).exists() {
        let mut micros = Utc::now().timestamp_micros();
        if let Some(last) = last_micros {
            if micros <= last {
                micros = last + 1;
            }
        }
        last_micros = Some(micros);
        name = defect_file_name(&format_micros(micros));
    }

    name
}

/// Free defect name for a known capture `timestamp`.
///
/// On collision extra fractional digits are appended (`100.5` -> `100.5001`,
/// `100.5002`, ...) so the name stays parseable and the capture time moves by
/// well under a millisecond.
pub fn free_defect_name(timestamp: &str, defect_dir: &Path) -> String {
    let name = defect_file_name(timestamp);
    if !defect_dir.join(&name).exists() {
        return name;
    }

    let base = if timestamp.contains('.') {
        timestamp.to_string()
    } else {
        format!("{timestamp}.")
    };
    (1u64..)
        .map(|n| defect_file_name(&format!("{base}{n:03}")))
        .find(|candidate| !defect_dir.join(candidate).exists())
        .unwrap_or(name)
}

/// Capture time of a defect image, `None` if the name does not follow the
/// `defect_<seconds>.jpg` pattern
pub fn parse_defect_timestamp(file_name: &str) -> Option<f64> {
    let raw = file_name.strip_prefix(DEFECT_PREFIX)?.strip_suffix(DEFECT_SUFFIX)?;
    raw.parse::<f64>().ok().filter(|t| t.is_finite())
}

/// Whether a name looks like a defect image produced by the worker
pub fn is_defect_file_name(file_name: &str) -> bool {
    file_name.starts_with(DEFECT_PREFIX) && file_name.ends_with(DEFECT_SUFFIX)
}

/// Archive name used when `file_name` already exists in the archive
pub fn archive_collision_name(file_name: &str) -> String {
    format!("{}_{}", clock_timestamp(), file_name)
}

/// Archive name for an item whose processing failed
pub fn error_archive_name(file_name: &str) -> String {
    format!("error_{}_{}", clock_timestamp(), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_numeric_stem_after_prefix() {
        assert_eq!(extract_timestamp("image_1707000000.123456.jpg"), "1707000000.123456");
        assert_eq!(extract_timestamp("defect_1707000000.5.jpg"), "1707000000.5");
        assert_eq!(extract_timestamp("42.jpg"), "42");
    }

    #[test]
    fn test_embedded_digit_run() {
        assert_eq!(extract_timestamp("cam0_1707000000.25_left.jpg"), "1707000000.25");
        assert_eq!(extract_timestamp("frame-123456789.jpg"), "123456789");
    }

    #[test]
    fn test_short_digit_run_falls_back_to_clock() {
        assert_eq!(embedded_timestamp("frame-12345678.jpg"), None);
        let ts = extract_timestamp("frame-12345678.jpg");
        let (secs, frac) = ts.split_once('.').unwrap();
        assert!(secs.parse::<i64>().unwrap() > 1_600_000_000);
        assert_eq!(frac.len(), 6);
    }

    #[test]
    fn test_parse_defect_timestamp() {
        assert_eq!(parse_defect_timestamp("defect_100.5.jpg"), Some(100.5));
        assert_eq!(parse_defect_timestamp("defect_abc.jpg"), None);
        assert_eq!(parse_defect_timestamp("photo_100.jpg"), None);
        assert_eq!(parse_defect_timestamp("defect_inf.jpg"), None);
    }

    #[test]
    fn test_unique_defect_name_avoids_collision() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("defect_1707000000.000001.jpg"), b"x").unwrap();

        let name = unique_defect_name("image_1707000000.000001.jpg", dir.path());
        assert_ne!(name, "defect_1707000000.000001.jpg");
        assert!(!dir.path().join(&name).exists());
        assert!(parse_defect_timestamp(&name).is_some());
    }

    #[test]
    fn test_free_defect_name_keeps_capture_time() {
        let dir = TempDir::new().unwrap();
        assert_eq!(free_defect_name("1707000000.5", dir.path()), "defect_1707000000.5.jpg");

        fs::write(dir.path().join("defect_1707000000.5.jpg"), b"x").unwrap();
        fs::write(dir.path().join("defect_1707000000.5001.jpg"), b"x").unwrap();
        let name = free_defect_name("1707000000.5", dir.path());
        assert_eq!(name, "defect_1707000000.5002.jpg");
        let seconds = parse_defect_timestamp(&name).unwrap();
        assert!((seconds - 1707000000.5).abs() < 1e-3);

        fs::write(dir.path().join("defect_1707000009.jpg"), b"x").unwrap();
        assert_eq!(free_defect_name("1707000009", dir.path()), "defect_1707000009.001.jpg");
    }

    #[test]
    fn test_error_and_collision_names() {
        let name = error_archive_name("a.jpg");
        assert!(name.starts_with("error_"));
        assert!(name.ends_with("_a.jpg"));
        assert!(archive_collision_name("a.jpg").ends_with("_a.jpg"));
    }

    proptest! {
        #[test]
        fn prop_defect_name_round_trip(secs in 0u64..10_000_000_000u64, frac in proptest::option::of(0u32..1_000_000u32)) {
            let stem = match frac {
                Some(f) => format!("{secs}.{f:06}"),
                None => secs.to_string(),
            };
            let raw = format!("image_{stem}.jpg");
            let first = extract_timestamp(&raw);
            prop_assert_eq!(&first, &stem);
            let again = extract_timestamp(&defect_file_name(&first));
            prop_assert_eq!(again, first);
        }

        #[test]
        fn prop_parse_matches_extract(secs in 1u64..10_000_000_000u64, frac in 0u32..1_000_000u32) {
            let name = defect_file_name(&format!("{secs}.{frac:06}"));
            let parsed = parse_defect_timestamp(&name).unwrap();
            let expected: f64 = extract_timestamp(&name).parse().unwrap();
            prop_assert_eq!(parsed, expected);
        }
    }
}
