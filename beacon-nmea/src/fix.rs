/// One decoded value plus the flags the publisher cares about.
///
/// `valid` survives until a sentence explicitly says otherwise, `updated`
/// is raised on every commit and cleared by whoever consumes it.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Field<T> {
    value: T,
    valid: bool,
    updated: bool,
}

impl<T: Copy> Field<T> {
    pub fn value(&self) -> Option<T> {
        if self.valid {
            Some(self.value)
        } else {
            None
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Return the update flag and clear it
    pub fn take_updated(&mut self) -> bool {
        core::mem::replace(&mut self.updated, false)
    }

    pub(crate) fn commit(&mut self, value: T) {
        self.value = value;
        self.valid = true;
        self.updated = true;
    }

    /// Losing a value counts as an update, repeated losses do not
    pub(crate) fn invalidate(&mut self) {
        if self.valid {
            self.valid = false;
            self.updated = true;
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FixSnapshot {
    /// (latitude, longitude) in decimal degrees, south and west negative
    pub location: Field<(f64, f64)>,
    /// Metres above mean sea level
    pub altitude: Field<f64>,
    pub satellites: Field<u32>,
    pub hdop: Field<f64>,
    /// Milliseconds since UTC midnight
    pub time: Field<u32>,
    /// Days since 1970-01-01
    pub date: Field<u32>,
    /// Knots
    pub speed: Field<f64>,
    /// Degrees true
    pub course: Field<f64>,
}

impl FixSnapshot {
    pub fn has_fix(&self) -> bool {
        self.location.is_valid()
    }

    /// Unix time in milliseconds, once both date and time have been seen
    pub fn utc_timestamp_ms(&self) -> Option<u64> {
        match (self.date.value(), self.time.value()) {
            (Some(days), Some(ms)) => Some(days as u64 * 24 * 60 * 60_000 + ms as u64),
            _ => None,
        }
    }

    /// Read and clear the "fix updated" signal
    pub fn take_location_updated(&mut self) -> bool {
        self.location.take_updated()
    }
}
