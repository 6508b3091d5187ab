//! Data Processor Module
//! Column dropping, trimming and smoothing applied per scenario.

use crate::data::dataset::{DeviceDataset, Recording};

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Remove every sensor channel whose name contains one of `substrings`.
    pub fn drop_columns(dataset: &mut DeviceDataset, substrings: &[String]) {
        if substrings.is_empty() {
            return;
        }
        for recording in &mut dataset.recordings {
            recording
                .channels
                .retain(|c| !substrings.iter().any(|s| c.name.contains(s.as_str())));
        }
    }

    /// Keep only the last `n` rows of each scenario.
    pub fn take_last_n(dataset: &mut DeviceDataset, n: usize) {
        for recording in &mut dataset.recordings {
            let start = recording.len().saturating_sub(n);
            Self::trim_front(recording, start);
        }
    }

    fn trim_front(recording: &mut Recording, start: usize) {
        if start == 0 {
            return;
        }
        recording.timestamps.drain(..start.min(recording.timestamps.len()));
        recording.relative_time.drain(..start);
        for channel in &mut recording.channels {
            channel.values.drain(..start.min(channel.values.len()));
        }
    }

    /// Trailing moving average of every sensor channel, per scenario.
    ///
    /// Windows at the start are partial (`min_periods = 1`); NaN samples are
    /// skipped and a window with no valid samples stays NaN.
    pub fn moving_average(dataset: &mut DeviceDataset, window: usize) {
        let window = window.max(1);
        for recording in &mut dataset.recordings {
            for channel in &mut recording.channels {
                channel.values = rolling_mean(&channel.values, window);
            }
        }
    }

    /// Sorted unique sensor names across datasets.
    pub fn sensor_names(datasets: &[DeviceDataset]) -> Vec<String> {
        let mut names: Vec<String> = datasets
            .iter()
            .flat_map(|d| d.channel_names())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            crate::data::loader::nan_mean(&values[start..=i])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::Channel;

    fn dataset() -> DeviceDataset {
        let mut dataset = DeviceDataset::new("DEV1");
        for (scenario, offset) in [("Background", 0.0), ("Lure", 100.0)] {
            dataset.push_recording(Recording {
                scenario: scenario.to_string(),
                timestamps: (0..5).map(|i| i as f64 * 1000.0).collect(),
                relative_time: (0..5).map(|i| i as f64).collect(),
                channels: vec![
                    Channel::new("ENS160_R0", (1..=5).map(|v| v as f64 + offset).collect()),
                    Channel::new("ENS160_R1", vec![0.0; 5]),
                    Channel::new("BME688_R", vec![1.0; 5]),
                ],
            });
        }
        dataset
    }

    #[test]
    fn drop_columns_matches_substrings() {
        let mut data = dataset();
        DataProcessor::drop_columns(&mut data, &["BME688".to_string(), "_R1".to_string()]);
        assert_eq!(data.channel_names(), vec!["ENS160_R0"]);
    }

    #[test]
    fn take_last_n_trims_each_scenario() {
        let mut data = dataset();
        DataProcessor::take_last_n(&mut data, 2);
        for recording in &data.recordings {
            assert_eq!(recording.relative_time, vec![3.0, 4.0]);
            assert_eq!(recording.timestamps, vec![3000.0, 4000.0]);
        }
        assert_eq!(
            data.recordings[1].channel("ENS160_R0").unwrap().values,
            vec![104.0, 105.0]
        );
    }

    #[test]
    fn take_last_n_larger_than_data_keeps_everything() {
        let mut data = dataset();
        DataProcessor::take_last_n(&mut data, 50);
        assert_eq!(data.row_count(), 10);
    }

    #[test]
    fn moving_average_uses_partial_leading_windows() {
        let mut data = dataset();
        DataProcessor::moving_average(&mut data, 3);
        assert_eq!(
            data.recordings[0].channel("ENS160_R0").unwrap().values,
            vec![1.0, 1.5, 2.0, 3.0, 4.0]
        );
        // Scenarios are smoothed independently
        assert_eq!(
            data.recordings[1].channel("ENS160_R0").unwrap().values[0],
            101.0
        );
    }

    #[test]
    fn rolling_mean_skips_nan() {
        let smoothed = rolling_mean(&[f64::NAN, 2.0, f64::NAN, 4.0], 2);
        assert!(smoothed[0].is_nan());
        assert_eq!(&smoothed[1..], &[2.0, 2.0, 4.0]);
    }

    #[test]
    fn sensor_names_are_sorted_and_unique() {
        let names = DataProcessor::sensor_names(&[dataset(), dataset()]);
        assert_eq!(names, vec!["BME688_R", "ENS160_R0", "ENS160_R1"]);
    }
}
