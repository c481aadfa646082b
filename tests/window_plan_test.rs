//! Integration tests for window planning
//!
//! Windows must tile the requested range exactly: newest first, contiguous,
//! and never reaching below the floor.

use chrono::{Duration, TimeZone, Utc};
use nightscout_export::core::plan::WindowPlan;
use nightscout_export::domain::{parse_date_bound, DataType};
use test_case::test_case;

#[test_case(DataType::Entries, "2020-01-10", Some("2019-01-01"); "entries over a year")]
#[test_case(DataType::Treatments, "2020-03-01", Some("2020-01-01"); "treatments over two months")]
#[test_case(DataType::DeviceStatus, "2020-01-10", Some("2020-01-01"); "devicestatus over nine days")]
#[test_case(DataType::Treatments, "2012-03-01", None; "treatments down to the hard floor")]
fn test_windows_partition_the_range(data_type: DataType, before: &str, after: Option<&str>) {
    let before = parse_date_bound(before).unwrap();
    let after = after.map(|a| parse_date_bound(a).unwrap());
    let plan = WindowPlan::new(data_type, before, after).unwrap();
    let floor = plan.floor();
    let ceiling = plan.ceiling();
    let chunk = data_type.chunk().unwrap();

    let windows: Vec<_> = plan.collect();
    assert!(!windows.is_empty());
    assert_eq!(windows[0].end, ceiling);
    assert_eq!(windows.last().unwrap().start, floor);
    assert!(windows.last().unwrap().is_final);

    for pair in windows.windows(2) {
        assert_eq!(pair[0].start, pair[1].end);
        assert!(!pair[0].is_final);
    }
    for window in &windows {
        assert!(window.start < window.end);
        assert!(window.duration() <= chunk);
    }
}

#[test]
fn test_after_at_or_above_ceiling_yields_nothing() {
    let before = Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap();
    let plan = WindowPlan::new(DataType::Entries, before, Some(before)).unwrap();
    assert_eq!(plan.count(), 0);
}

#[test]
fn test_profile_has_no_plan() {
    let before = Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap();
    assert!(WindowPlan::new(DataType::Profile, before, None).is_err());
}

#[test]
fn test_plan_is_restartable() {
    let before = Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap();
    let after = before - Duration::milliseconds(3 * 5_000_000_000);
    let mut plan = WindowPlan::new(DataType::Entries, before, Some(after)).unwrap();

    let first: Vec<_> = plan.by_ref().collect();
    plan.restart();
    let second: Vec<_> = plan.collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}
