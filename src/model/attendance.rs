use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    #[serde(rename = "On Leave")]
    #[strum(serialize = "On Leave")]
    OnLeave,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoLocation {
    #[schema(example = 23.8103)]
    pub lat: f64,
    #[schema(example = 90.4125)]
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Absent for the synthesized "not checked in yet" record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub employee_id: u64,
    pub employee_name: Option<String>,
    #[schema(example = "2024-05-10", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[serde(serialize_with = "hh_mm::serialize")]
    #[schema(example = "09:01", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[serde(serialize_with = "hh_mm::serialize")]
    #[schema(example = "17:30", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_location: Option<GeoLocation>,
}

impl AttendanceRecord {
    pub fn absent(employee_id: u64, employee_name: Option<String>, date: NaiveDate) -> Self {
        Self {
            id: None,
            employee_id,
            employee_name,
            date,
            check_in: None,
            check_out: None,
            status: AttendanceStatus::Absent,
            check_in_photo: None,
            check_in_location: None,
        }
    }
}

/// Attendance row written directly (seed data, imports).
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub employee_name: String,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub employee_id: u64,
    pub employee_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub photo: Option<String>,
    pub location: Option<GeoLocation>,
}

impl NewCheckIn {
    pub fn into_record(self, id: u64) -> AttendanceRecord {
        AttendanceRecord {
            id: Some(id),
            employee_id: self.employee_id,
            employee_name: Some(self.employee_name),
            date: self.date,
            check_in: Some(self.time),
            check_out: None,
            status: AttendanceStatus::Present,
            check_in_photo: self.photo,
            check_in_location: self.location,
        }
    }
}

/// Times of day go over the wire as `HH:MM`.
mod hh_mm {
    use chrono::NaiveTime;
    use serde::Serializer;

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.serialize_str(&t.format(FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_leave_uses_its_display_name() {
        assert_eq!(AttendanceStatus::OnLeave.to_string(), "On Leave");
        assert_eq!(
            "On Leave".parse::<AttendanceStatus>().unwrap(),
            AttendanceStatus::OnLeave
        );
        assert_eq!(
            serde_json::to_value(AttendanceStatus::OnLeave).unwrap(),
            "On Leave"
        );
    }

    #[test]
    fn synthesized_absent_record_serializes_null_times_and_no_id() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let record = AttendanceRecord::absent(2, Some("Jane Doe".into()), date);

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("id").is_none());
        assert!(value["checkIn"].is_null());
        assert!(value["checkOut"].is_null());
        assert_eq!(value["status"], "Absent");
        assert_eq!(value["date"], "2024-05-10");
    }

    #[test]
    fn check_in_time_is_rendered_as_hours_and_minutes() {
        let entry = NewCheckIn {
            employee_id: 2,
            employee_name: "Jane Doe".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            time: NaiveTime::from_hms_opt(9, 1, 42).unwrap(),
            photo: Some("data:image/jpeg;base64,AAAA".into()),
            location: Some(GeoLocation { lat: 1.5, lon: -2.25 }),
        };

        let value = serde_json::to_value(entry.into_record(11)).unwrap();
        assert_eq!(value["id"], 11);
        assert_eq!(value["checkIn"], "09:01");
        assert_eq!(value["status"], "Present");
        assert_eq!(value["checkInLocation"]["lon"], -2.25);
    }
}
