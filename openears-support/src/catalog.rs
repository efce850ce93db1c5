//! The fixed volunteer and time slot catalogs shown during booking

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volunteer {
    pub id: String,
    /// The anonymous name a volunteer appears under
    pub alias: String,
    pub status: VolunteerStatus,
    pub bio: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolunteerStatus {
    Available,
    Busy,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: String,
    pub time: String,
    /// A friendly day label rather than a real date
    pub date: String,
    pub available: bool,
}

pub fn default_volunteers() -> Vec<Volunteer> {
    vec![
        Volunteer {
            id: "v1".to_string(),
            alias: "Oliver".to_string(),
            status: VolunteerStatus::Available,
            bio: "A gentle soul who loves listening to your stories. Always here for a hop-ful chat."
                .to_string(),
        },
        Volunteer {
            id: "v2".to_string(),
            alias: "Sophia".to_string(),
            status: VolunteerStatus::Busy,
            bio: "Calm, patient, and understanding. Finding balance in black and white.".to_string(),
        },
        Volunteer {
            id: "v3".to_string(),
            alias: "Leo".to_string(),
            status: VolunteerStatus::Available,
            bio: "Curious and caring. I promise to keep your secrets purr-fectly safe.".to_string(),
        },
        Volunteer {
            id: "v4".to_string(),
            alias: "Bella".to_string(),
            status: VolunteerStatus::Offline,
            bio: "Loyal and friendly. I am here to be your best friend when you need one."
                .to_string(),
        },
    ]
}

pub fn default_slots() -> Vec<TimeSlot> {
    let slot = |id: &str, time: &str, date: &str, available: bool| TimeSlot {
        id: id.to_string(),
        time: time.to_string(),
        date: date.to_string(),
        available,
    };

    vec![
        slot("t1", "10:00 AM", "Today", true),
        slot("t2", "10:15 AM", "Today", false),
        slot("t3", "10:30 AM", "Today", true),
        slot("t4", "11:00 AM", "Today", true),
        slot("t5", "02:00 PM", "Tomorrow", true),
    ]
}
