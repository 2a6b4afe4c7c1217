//! Registry-free construction of gauge metric families.
//!
//! Families are assembled directly as protobuf values so each collection
//! pass owns its output and sample order is fixed by construction.

use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};

/// Create an empty gauge family with a fully qualified name.
pub(crate) fn new_gauge_family(name: impl Into<String>, help: impl Into<String>) -> MetricFamily {
    let mut family = MetricFamily::default();
    family.set_name(name.into());
    family.set_help(help.into());
    family.set_field_type(MetricType::GAUGE);
    family
}

/// Append one sample with the given label pairs.
pub(crate) fn push_sample(family: &mut MetricFamily, labels: &[(&str, &str)], value: f64) {
    let mut metric = Metric::default();
    for (name, label_value) in labels {
        let mut pair = LabelPair::default();
        pair.set_name((*name).to_string());
        pair.set_value((*label_value).to_string());
        metric.mut_label().push(pair);
    }

    let mut gauge = Gauge::default();
    gauge.set_value(value);
    metric.set_gauge(gauge);

    family.mut_metric().push(metric);
}

/// Single-sample gauge family without labels.
pub(crate) fn gauge(name: impl Into<String>, help: impl Into<String>, value: f64) -> MetricFamily {
    let mut family = new_gauge_family(name, help);
    push_sample(&mut family, &[], value);
    family
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_family_shape() {
        let family = gauge("up", "server up", 1.0);

        assert_eq!(family.get_name(), "up");
        assert_eq!(family.get_help(), "server up");
        assert_eq!(family.get_field_type(), MetricType::GAUGE);
        assert_eq!(family.get_metric().len(), 1);
        assert!(family.get_metric()[0].get_label().is_empty());
        assert_eq!(family.get_metric()[0].get_gauge().get_value(), 1.0);
    }

    #[test]
    fn test_push_sample_preserves_order() {
        let mut family = new_gauge_family("load", "load average");
        push_sample(&mut family, &[("bucket", "1m")], 0.1);
        push_sample(&mut family, &[("bucket", "5m")], 0.2);
        push_sample(&mut family, &[("bucket", "15m")], 0.3);

        let buckets: Vec<&str> = family
            .get_metric()
            .iter()
            .map(|m| m.get_label()[0].get_value())
            .collect();
        assert_eq!(buckets, vec!["1m", "5m", "15m"]);
    }

    #[test]
    fn test_sample_labels() {
        let mut family = new_gauge_family("load", "load average");
        push_sample(&mut family, &[("bucket", "1m")], 0.5);

        let labels = family.get_metric()[0].get_label();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].get_name(), "bucket");
        assert_eq!(labels[0].get_value(), "1m");
        assert_eq!(family.get_metric()[0].get_gauge().get_value(), 0.5);
    }
}
