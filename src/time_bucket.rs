use chrono::{Local, Timelike};

/// Coarse day part used as a categorical model feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Morning => "Morning",
            TimeBucket::Afternoon => "Afternoon",
            TimeBucket::Evening => "Evening",
            TimeBucket::Night => "Night",
        }
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// [5,12) Morning, [12,17) Afternoon, [17,21) Evening, anything else Night.
pub fn infer_bucket(hour: u32) -> TimeBucket {
    match hour {
        5..=11 => TimeBucket::Morning,
        12..=16 => TimeBucket::Afternoon,
        17..=20 => TimeBucket::Evening,
        _ => TimeBucket::Night,
    }
}

/// Hour of the local wall clock, 0-23.
pub fn current_hour() -> u32 {
    Local::now().hour()
}
