//! Sensor Dataset Types
//! In-memory representation of per-device recordings.

/// Columns that identify a row rather than carry a sensor reading.
pub const IDENTIFIER_COLUMNS: [&str; 4] = ["timestamp", "relative_time", "device_id", "scenario"];

/// Returns true when `name` is a sensor reading column.
pub fn is_sensor_column(name: &str) -> bool {
    !IDENTIFIER_COLUMNS.contains(&name)
}

/// A single sensor column.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub values: Vec<f64>,
}

impl Channel {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// All rows recorded for one scenario on one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub scenario: String,
    /// Raw timestamps in milliseconds
    pub timestamps: Vec<f64>,
    /// Seconds since the first sample of the source file
    pub relative_time: Vec<f64>,
    pub channels: Vec<Channel>,
}

impl Recording {
    pub fn len(&self) -> usize {
        self.relative_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relative_time.is_empty()
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Append rows from another recording of the same scenario.
    ///
    /// Channels missing on either side are padded with NaN so every column
    /// keeps the same length.
    pub fn append(&mut self, other: Recording) {
        let existing_rows = self.len();
        let incoming_rows = other.len();

        self.timestamps.extend(other.timestamps);
        self.relative_time.extend(other.relative_time);

        let mut incoming = other.channels;
        for channel in &mut self.channels {
            match incoming.iter().position(|c| c.name == channel.name) {
                Some(pos) => {
                    let matched = incoming.remove(pos);
                    channel.values.extend(matched.values);
                }
                None => channel
                    .values
                    .extend(std::iter::repeat(f64::NAN).take(incoming_rows)),
            }
        }

        for mut channel in incoming {
            let mut values = vec![f64::NAN; existing_rows];
            values.append(&mut channel.values);
            channel.values = values;
            self.channels.push(channel);
        }
    }
}

/// Every recording for a single device, one per distinct scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDataset {
    pub device_id: String,
    pub recordings: Vec<Recording>,
}

impl DeviceDataset {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            recordings: Vec::new(),
        }
    }

    /// Add a recording, merging it into an existing one with the same scenario.
    pub fn push_recording(&mut self, recording: Recording) {
        match self
            .recordings
            .iter_mut()
            .find(|r| r.scenario == recording.scenario)
        {
            Some(existing) => existing.append(recording),
            None => self.recordings.push(recording),
        }
    }

    /// Scenario labels in first-appearance order.
    pub fn scenarios(&self) -> Vec<&str> {
        self.recordings.iter().map(|r| r.scenario.as_str()).collect()
    }

    /// Sensor channel names in column order, without duplicates.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for recording in &self.recordings {
            for channel in &recording.channels {
                if !names.contains(&channel.name) {
                    names.push(channel.name.clone());
                }
            }
        }
        names
    }

    pub fn row_count(&self) -> usize {
        self.recordings.iter().map(Recording::len).sum()
    }
}
