//! Main list view: grouping, the status line and new-id checks.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::devices::Device;
use crate::query::Activity;

/// How the device list is grouped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Type,
    Room,
}

impl GroupBy {
    pub fn toggle(self) -> Self {
        match self {
            GroupBy::Type => GroupBy::Room,
            GroupBy::Room => GroupBy::Type,
        }
    }

    /// Label of the button that switches to the other grouping.
    pub fn button_label(self) -> &'static str {
        match self {
            GroupBy::Type => "Group by room",
            GroupBy::Room => "Group by type",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupBy::Type => "type",
            GroupBy::Room => "room",
        }
    }

    /// Parse the `group_by` query value. Anything but `room` means type.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("room") => GroupBy::Room,
            _ => GroupBy::Type,
        }
    }

    fn key_of(self, device: &Device) -> &str {
        match self {
            GroupBy::Type => device.device_type.as_str(),
            GroupBy::Room => &device.room,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceGroup {
    /// Raw room name or type wire name.
    pub key: String,
    pub label: String,
    pub devices: Vec<Device>,
}

/// Group devices by type or room. Groups appear in the order their first
/// device appears; devices keep their order inside a group.
pub fn group_devices(devices: &[Device], group_by: GroupBy) -> Vec<DeviceGroup> {
    let mut groups: Vec<DeviceGroup> = Vec::new();
    for device in devices {
        let key = group_by.key_of(device);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.devices.push(device.clone()),
            None => groups.push(DeviceGroup {
                key: key.to_string(),
                label: group_label(key),
                devices: vec![device.clone()],
            }),
        }
    }
    groups
}

/// Title-case a room name or type, treating underscores as spaces.
pub fn group_label(key: &str) -> String {
    let words: Vec<String> = key
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Unassigned".to_string()
    } else {
        words.join(" ")
    }
}

/// Line under the heading: loading indicator or time of the last fetch.
pub fn status_line(activity: Activity, last_updated: Option<DateTime<Local>>) -> String {
    if !activity.is_idle() {
        return "Loading...".to_string();
    }
    match last_updated {
        Some(at) => format!("Data retrieved at {}", at.format("%H:%M:%S")),
        None => "No data retrieved yet".to_string(),
    }
}

/// A new device id must not clash with a loaded device.
pub fn verify_new_id(devices: &[Device], id: &str) -> bool {
    !devices.iter().any(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn device(id: &str, device_type: &str, room: &str) -> Device {
        serde_json::from_value(json!({"id": id, "type": device_type, "room": room})).unwrap()
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let devices = vec![
            device("a", "light", "kitchen"),
            device("b", "curtain", "living_room"),
            device("c", "light", "living_room"),
        ];

        let by_type = group_devices(&devices, GroupBy::Type);
        let keys: Vec<&str> = by_type.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["light", "curtain"]);
        assert_eq!(by_type[0].devices.len(), 2);

        let by_room = group_devices(&devices, GroupBy::Room);
        assert_eq!(by_room[1].label, "Living Room");
        let ids: Vec<&str> = by_room[1].devices.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(group_label("air_conditioner"), "Air Conditioner");
        assert_eq!(group_label("master bed_room"), "Master Bed Room");
        assert_eq!(group_label(""), "Unassigned");
    }

    #[test]
    fn group_by_toggles() {
        assert_eq!(GroupBy::default(), GroupBy::Type);
        assert_eq!(GroupBy::Type.toggle(), GroupBy::Room);
        assert_eq!(GroupBy::Type.button_label(), "Group by room");
        assert_eq!(GroupBy::parse(Some("room")), GroupBy::Room);
        assert_eq!(GroupBy::parse(Some("bogus")), GroupBy::Type);
    }

    #[test]
    fn status_line_reports_loading_then_time() {
        let busy = Activity {
            fetching: 1,
            mutating: 0,
        };
        assert_eq!(status_line(busy, None), "Loading...");

        let at = Local.with_ymd_and_hms(2024, 5, 1, 7, 5, 9).unwrap();
        assert_eq!(
            status_line(Activity::default(), Some(at)),
            "Data retrieved at 07:05:09"
        );
    }

    #[test]
    fn new_ids_must_be_unused() {
        let devices = vec![device("wh1", "water_heater", "bathroom")];
        assert!(!verify_new_id(&devices, "wh1"));
        assert!(verify_new_id(&devices, "wh2"));
    }
}
