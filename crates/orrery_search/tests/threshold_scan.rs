//! Integration tests for threshold interval scanning with synthetic oracles.

use orrery_search::{
    CancelFlag, OracleError, OracleResult, ScanConfig, SearchError, TimePoint, scan_targets,
    scan_threshold_intervals, scan_threshold_intervals_cancellable,
    scan_threshold_intervals_report,
};

const T0: f64 = 2_460_676.5; // 2025-01-01 00:00 UTC
const MINUTE: f64 = 1.0 / 1440.0;

fn minute_index(t: TimePoint) -> f64 {
    ((t.jd() - T0) / MINUTE).round()
}

#[test]
fn constant_below_threshold_spans_whole_window() {
    let config = ScanConfig::occultation();
    let t0 = TimePoint::new(T0);
    let t1 = t0 + 0.5;
    let events = scan_threshold_intervals(|_| Ok(0.125), t0, t1, &config).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start, t0);
    assert_eq!(events[0].end, t1);
    assert_eq!(events[0].extreme_value, 0.125);
}

#[test]
fn always_above_threshold_is_empty() {
    let config = ScanConfig::occultation();
    let t0 = TimePoint::new(T0);
    let events = scan_threshold_intervals(|_| Ok(3.0), t0, t0 + 1.0, &config).unwrap();
    assert!(events.is_empty());
}

#[test]
fn v_dip_touching_threshold_at_boundaries() {
    let config = ScanConfig::occultation();
    let t0 = TimePoint::new(T0);
    // Threshold at minutes 100 and 102, minimum 0.125 at minute 101.
    let f = |t: TimePoint| -> OracleResult<f64> {
        let k = minute_index(t);
        Ok(0.125 + 0.125 * (k - 101.0).abs())
    };
    let events = scan_threshold_intervals(f, t0, t0 + 0.25, &config).unwrap();
    assert_eq!(events.len(), 1);
    let e = events[0];
    assert_eq!(minute_index(e.start), 100.0);
    assert_eq!(minute_index(e.peak), 101.0);
    assert_eq!(minute_index(e.end), 102.0);
    assert!((e.extreme_value - 0.125).abs() < 1e-12);
}

/// Close pass with 0.05 degree minimum at minute 37, moving 0.01 deg/min.
fn close_pass(t: TimePoint) -> OracleResult<f64> {
    let dm = (t.jd() - T0) / MINUTE - 37.0;
    Ok((0.05f64.powi(2) + (0.01 * dm).powi(2)).sqrt())
}

#[test]
fn close_pass_peaks_at_minute_37() {
    let config = ScanConfig::minutes(1.0, 0.25);
    let t0 = TimePoint::new(T0);
    let t1 = t0 + 1440.0 * MINUTE;
    let events = scan_threshold_intervals(close_pass, t0, t1, &config).unwrap();
    assert_eq!(events.len(), 1);
    let e = events[0];
    assert_eq!(minute_index(e.peak), 37.0);
    assert!((e.extreme_value - 0.05).abs() < 1e-9);
    // |dm| <= 24.49 minutes is inside.
    assert_eq!(minute_index(e.start), 13.0);
    assert_eq!(minute_index(e.end), 61.0);
}

#[test]
fn peak_refinement_stays_inside_interval() {
    let config = ScanConfig::minutes(1.0, 0.25).with_peak_refinement();
    let t0 = TimePoint::new(T0);
    let shifted = |t: TimePoint| close_pass(t - 0.3 * MINUTE);
    let events = scan_threshold_intervals(shifted, t0, t0 + 0.1, &config).unwrap();
    assert_eq!(events.len(), 1);
    let e = events[0];
    assert!(e.start <= e.peak && e.peak <= e.end);
    let peak_minute = (e.peak.jd() - T0) / MINUTE;
    assert!((peak_minute - 37.3).abs() < 0.05, "peak at minute {peak_minute}");
}

#[test]
fn scan_is_deterministic() {
    let config = ScanConfig::occultation();
    let t0 = TimePoint::new(T0);
    let wobble = |t: TimePoint| -> OracleResult<f64> {
        let x = (t.jd() - T0) * 40.0;
        Ok(0.3 + 0.2 * x.sin() * (3.0 * x).cos())
    };
    let a = scan_threshold_intervals(wobble, t0, t0 + 1.0, &config).unwrap();
    let b = scan_threshold_intervals(wobble, t0, t0 + 1.0, &config).unwrap();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn failed_samples_are_reported_not_fatal() {
    let config = ScanConfig::occultation();
    let t0 = TimePoint::new(T0);
    let flaky = |t: TimePoint| -> OracleResult<f64> {
        if minute_index(t) as i64 % 10 == 5 {
            Err(OracleError::new("no data"))
        } else {
            close_pass(t)
        }
    };
    let report = scan_threshold_intervals_report(flaky, t0, t0 + 0.1, &config).unwrap();
    assert_eq!(report.events.len(), 1);
    assert!(report.skipped > 0);
    assert_eq!(minute_index(report.events[0].peak), 37.0);
}

#[test]
fn cancelled_scan_stops() {
    let flag = CancelFlag::new();
    flag.cancel();
    let t0 = TimePoint::new(T0);
    let err = scan_threshold_intervals_cancellable(
        close_pass,
        t0,
        t0 + 1.0,
        &ScanConfig::occultation(),
        &flag,
    )
    .unwrap_err();
    assert_eq!(err, SearchError::Cancelled);
}

#[test]
fn star_survey_in_parallel() {
    // Minimum separation and minute of closest approach per star.
    let stars = [(0.05, 37.0), (1.5, 200.0), (0.2, 600.0), (0.1, 900.0)];
    let f = |star: &(f64, f64), t: TimePoint| -> OracleResult<f64> {
        let dm = (t.jd() - T0) / MINUTE - star.1;
        Ok((star.0 * star.0 + (0.01 * dm).powi(2)).sqrt())
    };
    let t0 = TimePoint::new(T0);
    let config = ScanConfig::occultation();
    let seq = scan_targets(&stars, f, t0, t0 + 1.0, &config, 1, None).unwrap();
    let par = scan_targets(&stars, f, t0, t0 + 1.0, &config, 3, None).unwrap();
    assert_eq!(seq, par);
    let targets: Vec<usize> = par.iter().map(|h| h.target).collect();
    assert_eq!(targets, vec![0, 2, 3]);
}
