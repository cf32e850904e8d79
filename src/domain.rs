use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Deserializer, Serialize};

use crate::id::{DirectMessageId, StatusId, UserId, YammerId};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Status {
    pub id: StatusId,
    pub text: CompactString,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<CompactString>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub favorited: bool,
    #[serde(default)]
    pub in_reply_to_status_id: Option<StatusId>,
    #[serde(default)]
    pub in_reply_to_user_id: Option<UserId>,
    #[serde(default)]
    pub in_reply_to_screen_name: Option<CompactString>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub retweeted_status: Option<Box<Status>>,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    /// GeoJSON point, longitude first
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub place: Option<Place>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: UserId,
    /// Empty when the user is trimmed to its id
    #[serde(default)]
    pub screen_name: CompactString,
    #[serde(default)]
    pub name: CompactString,
    #[serde(default)]
    pub location: Option<CompactString>,
    #[serde(default)]
    pub description: Option<CompactString>,
    #[serde(default)]
    pub url: Option<CompactString>,
    #[serde(default)]
    pub profile_image_url: Option<CompactString>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub friends_count: u64,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub protected: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub verified: bool,
    /// Most recent status, present on user lookups but not inside statuses
    #[serde(default)]
    pub status: Option<Box<Status>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DirectMessage {
    pub id: DirectMessageId,
    pub text: CompactString,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    #[serde(default)]
    pub sender_screen_name: CompactString,
    #[serde(default)]
    pub recipient_screen_name: CompactString,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sender: Option<User>,
    #[serde(default)]
    pub recipient: Option<User>,
}

/// A `{"type":"Point","coordinates":[..]}` object, `[lat, long]` in `geo`
/// and `[long, lat]` in `coordinates`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default)]
    pub kind: CompactString,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Place {
    pub id: CompactString,
    #[serde(default)]
    pub name: CompactString,
    #[serde(default)]
    pub full_name: CompactString,
    #[serde(default)]
    pub country: Option<CompactString>,
    #[serde(default)]
    pub country_code: Option<CompactString>,
    #[serde(default)]
    pub place_type: Option<CompactString>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<SearchStatus>,
    #[serde(default)]
    pub max_id: Option<StatusId>,
    #[serde(default)]
    pub since_id: Option<StatusId>,
    #[serde(default)]
    pub refresh_url: Option<CompactString>,
    #[serde(default)]
    pub next_page: Option<CompactString>,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub query: CompactString,
    #[serde(default)]
    pub completed_in: f64,
}

/// Search API results carry a flattened author instead of a user object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchStatus {
    pub id: StatusId,
    pub text: CompactString,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub from_user: CompactString,
    #[serde(default)]
    pub from_user_id: Option<UserId>,
    #[serde(default)]
    pub to_user: Option<CompactString>,
    #[serde(default)]
    pub to_user_id: Option<UserId>,
    #[serde(default)]
    pub profile_image_url: Option<CompactString>,
    #[serde(default)]
    pub iso_language_code: Option<CompactString>,
    #[serde(default)]
    pub source: Option<CompactString>,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Trend {
    pub name: CompactString,
    #[serde(default)]
    pub query: Option<CompactString>,
    #[serde(default)]
    pub url: Option<CompactString>,
    #[serde(default)]
    pub promoted_content: Option<CompactString>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrendLocation {
    pub name: CompactString,
    pub woeid: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Trends {
    pub trends: Vec<Trend>,
    #[serde(default)]
    pub as_of: Option<CompactString>,
    #[serde(default)]
    pub created_at: Option<CompactString>,
    #[serde(default)]
    pub locations: Vec<TrendLocation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Friendship {
    pub relationship: Relationship,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Relationship {
    pub source: RelationshipParty,
    pub target: RelationshipParty,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelationshipParty {
    pub id: UserId,
    pub screen_name: CompactString,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub following: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub followed_by: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub notifications_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitStatus {
    pub remaining_hits: u32,
    pub hourly_limit: u32,
    pub reset_time_in_seconds: i64,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub reset_time: Option<DateTime<Utc>>,
}

/// Body of a `{"delete":{"status":{...}}}` stream notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DeletedStatus {
    pub id: StatusId,
    pub user_id: UserId,
}

/// Body of a `{"limit":{"track":n}}` stream notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LimitNotice {
    /// Matching statuses withheld since the connection opened
    pub track: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YammerMessage {
    pub id: YammerId,
    pub sender_id: YammerId,
    #[serde(default)]
    pub replied_to_id: Option<YammerId>,
    #[serde(default)]
    pub thread_id: Option<YammerId>,
    #[serde(default)]
    pub group_id: Option<YammerId>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub body: YammerBody,
    #[serde(default)]
    pub message_type: Option<CompactString>,
    #[serde(default)]
    pub web_url: Option<CompactString>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct YammerBody {
    #[serde(default)]
    pub plain: CompactString,
    #[serde(default)]
    pub parsed: CompactString,
    #[serde(default)]
    pub rich: Option<CompactString>,
}

/// Users, threads and groups referenced by a message listing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YammerReference {
    #[serde(rename = "type")]
    pub kind: CompactString,
    pub id: YammerId,
    #[serde(default)]
    pub name: Option<CompactString>,
    #[serde(default)]
    pub full_name: Option<CompactString>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct YammerMessages {
    #[serde(default)]
    pub messages: Vec<YammerMessage>,
    #[serde(default)]
    pub references: Vec<YammerReference>,
}

impl Status {
    pub fn is_retweet(&self) -> bool {
        self.retweeted_status.is_some()
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to_status_id.is_some()
    }

    pub fn screen_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.screen_name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn location(&self) -> Option<GeoLocation> {
        self.geo.as_ref().map(GeoPoint::location).or_else(|| {
            self.coordinates.as_ref().map(|point| GeoLocation {
                latitude: point.coordinates[1],
                longitude: point.coordinates[0],
            })
        })
    }
}

impl GeoPoint {
    pub fn location(&self) -> GeoLocation {
        GeoLocation { latitude: self.coordinates[0], longitude: self.coordinates[1] }
    }
}

impl YammerMessages {
    /// Resolve a sender id against the listing's references
    pub fn sender_name(&self, message: &YammerMessage) -> Option<&str> {
        self.references
            .iter()
            .find(|r| r.kind == "user" && r.id == message.sender_id)
            .and_then(|r| r.full_name.as_deref().or(r.name.as_deref()))
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.screen_name() {
            Some(name) => write!(f, "@{}: {}", name, self.text),
            None => write!(f, "{}: {}", self.id, self.text),
        }
    }
}

impl std::fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl PartialEq for Status {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Status {}

impl Hash for Status {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq for DirectMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DirectMessage {}

impl Hash for DirectMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialEq for YammerMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for YammerMessage {}

const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";
const YAMMER_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S %z";

/// Parse the timestamp formats used across the REST, search and Yammer APIs
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, TWITTER_DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .or_else(|_| DateTime::parse_from_str(value, YAMMER_DATE_FORMAT))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = CompactString::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}")))
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<CompactString>::deserialize(deserializer)?;
    match raw {
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {raw}"))),
        None => Ok(None),
    }
}

/// Twitter reports some flags as `null` instead of `false`
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    const STATUS_JSON: &str = r#"{
        "id": 240859602684612608,
        "id_str": "240859602684612608",
        "text": "Introducing the Twitter Certified Products Program",
        "created_at": "Wed Aug 29 17:12:58 +0000 2012",
        "source": "web",
        "truncated": false,
        "favorited": null,
        "in_reply_to_status_id": null,
        "in_reply_to_user_id": null,
        "geo": {"type": "Point", "coordinates": [37.78, -122.39]},
        "user": {
            "id": 6253282,
            "screen_name": "twitterapi",
            "name": "Twitter API",
            "followers_count": 1500000,
            "created_at": "Wed May 23 06:01:13 +0000 2007",
            "protected": false,
            "verified": true
        }
    }"#;

    #[test]
    fn test_status_deserializes() {
        let status: Status = serde_json::from_str(STATUS_JSON).unwrap();

        assert_eq!(status.id, StatusId::new(240_859_602_684_612_608));
        assert_eq!(status.screen_name(), Some("twitterapi"));
        assert!(!status.favorited);
        assert!(!status.is_reply());
        assert!(!status.is_retweet());
        assert_eq!(status.created_at.year(), 2012);
        assert_eq!(status.created_at.hour(), 17);

        let location = status.location().unwrap();
        assert_eq!(location.latitude, 37.78);
        assert_eq!(location.longitude, -122.39);
    }

    #[test]
    fn test_status_equality_is_by_id() {
        let a: Status = serde_json::from_str(STATUS_JSON).unwrap();
        let mut b = a.clone();
        b.text = "edited".into();

        assert_eq!(a, b);
    }

    #[test]
    fn test_trimmed_user_deserializes() {
        let status: Status = serde_json::from_str(
            r#"{"id":5,"text":"hi","created_at":"Wed Aug 29 17:12:58 +0000 2012","user":{"id":7,"id_str":"7"}}"#,
        )
        .unwrap();

        assert_eq!(status.user.as_ref().map(|u| u.id), Some(UserId::new(7)));
        assert_eq!(status.screen_name(), None);
        assert_eq!(status.to_string(), "5: hi");
    }

    #[test]
    fn test_location_falls_back_to_coordinates() {
        let status: Status = serde_json::from_str(
            r#"{
                "id": 5,
                "text": "hi",
                "created_at": "Wed Aug 29 17:12:58 +0000 2012",
                "geo": null,
                "coordinates": {"type": "Point", "coordinates": [-122.39, 37.78]}
            }"#,
        )
        .unwrap();

        let location = status.location().unwrap();
        assert_eq!(location.latitude, 37.78);
        assert_eq!(location.longitude, -122.39);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("Wed Aug 29 17:12:58 +0000 2012").is_some());
        assert!(parse_timestamp("Tue, 06 Sep 2011 18:31:45 +0000").is_some());
        assert!(parse_timestamp("2012-08-24T23:25:43Z").is_some());
        assert!(parse_timestamp("2012/03/06 21:44:36 +0000").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_yammer_sender_name_from_references() {
        let listing: YammerMessages = serde_json::from_str(
            r#"{
                "messages": [{
                    "id": 1,
                    "sender_id": 42,
                    "created_at": "2012/03/06 21:44:36 +0000",
                    "body": {"plain": "hello", "parsed": "hello"}
                }],
                "references": [{"type": "user", "id": 42, "full_name": "Ada Lovelace"}]
            }"#,
        )
        .unwrap();

        assert_eq!(listing.sender_name(&listing.messages[0]), Some("Ada Lovelace"));
    }
}
