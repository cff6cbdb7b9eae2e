//! Prometheus text exposition renderer.
//!
//! Histograms are summarized as `_sum` and `_count` only; raw observations are
//! kept, so there are no bucket or quantile lines.

use std::fmt::{self, Write};

use indexmap::IndexMap;

use crate::error::Result;

use super::event::MetricKind;
use super::registry::MetricKey;

/// Sample value with exposition spellings for non-finite floats.
struct Sample(f64);

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            f.write_str("NaN")
        } else if v.is_infinite() {
            f.write_str(if v > 0.0 { "+Inf" } else { "-Inf" })
        } else {
            write!(f, "{}", v)
        }
    }
}

/// Counters, then gauges, then histograms; each in discovery order with one
/// `# TYPE` line per identity.
pub(crate) fn render(
    counters: &IndexMap<MetricKey, f64>,
    gauges: &IndexMap<MetricKey, f64>,
    histograms: &IndexMap<MetricKey, Vec<f64>>,
) -> Result<String> {
    let mut out = String::new();
    for (key, value) in counters {
        render_scalar(&mut out, key, MetricKind::Counter, *value)?;
    }
    for (key, value) in gauges {
        render_scalar(&mut out, key, MetricKind::Gauge, *value)?;
    }
    for (key, values) in histograms {
        let sum: f64 = values.iter().sum();
        writeln!(out, "# TYPE {} {}", key.name, MetricKind::Histogram.as_str())?;
        writeln!(out, "{}_sum{} {}", key.name, key.labels, Sample(sum))?;
        writeln!(out, "{}_count{} {}", key.name, key.labels, values.len())?;
    }
    Ok(out)
}

fn render_scalar(out: &mut String, key: &MetricKey, kind: MetricKind, value: f64) -> fmt::Result {
    writeln!(out, "# TYPE {} {}", key.name, kind.as_str())?;
    writeln!(out, "{}{} {}", key.name, key.labels, Sample(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::LabelSet;

    #[test]
    fn sample_spelling() {
        assert_eq!(Sample(3.0).to_string(), "3");
        assert_eq!(Sample(0.25).to_string(), "0.25");
        assert_eq!(Sample(f64::INFINITY).to_string(), "+Inf");
        assert_eq!(Sample(f64::NEG_INFINITY).to_string(), "-Inf");
        assert_eq!(Sample(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn renders_in_type_order() {
        let mut counters = IndexMap::new();
        counters.insert(MetricKey::new("c", LabelSet::default()), 1.0);
        let mut gauges = IndexMap::new();
        gauges.insert(MetricKey::new("g", LabelSet::new(&[("k", "v")])), -2.5);
        let mut histograms = IndexMap::new();
        histograms.insert(MetricKey::new("h", LabelSet::default()), vec![1.5, 2.0]);

        let out = render(&counters, &gauges, &histograms).unwrap_or_default();
        assert_eq!(
            out,
            "# TYPE c counter\nc 1\n\
             # TYPE g gauge\ng{k=\"v\"} -2.5\n\
             # TYPE h histogram\nh_sum 3.5\nh_count 2\n"
        );
    }
}
