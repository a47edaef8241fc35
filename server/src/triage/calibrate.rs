/// Sharpen the top-class probability without changing the predicted label.
///
/// The local model is systematically under-confident above the midpoint, so
/// the upper half of the range is expanded toward 1.0 while genuinely
/// uncertain predictions (< 0.5) pass through untouched and can still
/// trigger the fallback.
pub fn calibrate(raw_confidence: f64) -> f64 {
    if raw_confidence >= 0.5 {
        raw_confidence.sqrt().min(1.0)
    } else {
        raw_confidence
    }
}

/// Confidence is reported to callers rounded to 3 decimals.
pub fn round3(confidence: f64) -> f64 {
    (confidence * 1000.0).round() / 1000.0
}
