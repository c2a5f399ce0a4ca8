//! Google Calendar v3: reminders become events with a popup notification.

use std::{str::FromStr, sync::Arc};

use chrono::{DateTime, Duration, Local, NaiveDateTime};
use iva_core::{config::GoogleConfig, error::IvaError};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::oauth::TokenSource;

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";
const DUPLICATE_MARKER: &str = "The requested identifier already exists";

/// Listing window for `/reminders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
}

impl Period {
    pub fn span(&self) -> Duration {
        match self {
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(7),
        }
    }
}

impl FromStr for Period {
    type Err = IvaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "today" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            _ => Err(IvaError::Google(
                "Invalid period specified. Choose 'day' or 'week'.".into(),
            )),
        }
    }
}

/// A reminder ready to be written to the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderEvent {
    pub summary: String,
    /// Wall-clock start in the user's local time.
    pub start: NaiveDateTime,
    pub recurring: bool,
}

/// Result of an insert that reached the API.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Created { id: String, html_link: Option<String> },
    /// Google reported the event as a duplicate.
    AlreadyExists,
}

impl InsertOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Created { html_link, .. } => match html_link {
                Some(link) => format!("Event created: {link}"),
                None => "Event created.".to_string(),
            },
            Self::AlreadyExists => "The reminder already exists in the calendar.".to_string(),
        }
    }
}

/// One line of the reminders listing.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSummary {
    pub id: String,
    pub summary: String,
    /// `HH:MM AM`, `All Day`, or `No Time`.
    pub time: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBody {
    summary: String,
    start: EventTime,
    end: EventTime,
    reminders: Reminders,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    recurrence: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: String,
    time_zone: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Reminders {
    use_default: bool,
    overrides: Vec<ReminderOverride>,
}

#[derive(Serialize)]
struct ReminderOverride {
    method: &'static str,
    minutes: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEvent {
    id: String,
    #[serde(default)]
    html_link: Option<String>,
}

#[derive(Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<ListedEvent>,
}

#[derive(Deserialize)]
struct ListedEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: Option<ListedTime>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedTime {
    #[serde(default)]
    date_time: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

/// Calendar REST client.
pub struct CalendarClient {
    http: reqwest::Client,
    auth: Arc<dyn TokenSource>,
    base_url: String,
    calendar_id: String,
    popup_minutes: u32,
    timezone: String,
}

impl CalendarClient {
    pub fn new(config: &GoogleConfig, auth: Arc<dyn TokenSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            auth,
            base_url: CALENDAR_API.to_string(),
            calendar_id: config.calendar_id.clone(),
            popup_minutes: config.popup_minutes,
            timezone: config.timezone.clone().unwrap_or_else(local_timezone),
        }
    }

    /// Point the client at a different API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self, event_id: Option<&str>) -> Result<Url, IvaError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| IvaError::Google(format!("invalid calendar base url: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| IvaError::Google("calendar base url cannot have a path".into()))?;
            segments.pop_if_empty().push("calendars").push(&self.calendar_id).push("events");
            if let Some(id) = event_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Wall-clock time plus the IANA zone; recurrence expansion needs the zone.
    fn event_time(&self, at: NaiveDateTime) -> EventTime {
        EventTime {
            date_time: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: self.timezone.clone(),
        }
    }

    fn event_body(&self, event: &ReminderEvent) -> Result<EventBody, IvaError> {
        Ok(EventBody {
            summary: event.summary.clone(),
            start: self.event_time(event.start),
            end: self.event_time(event.start),
            reminders: Reminders {
                use_default: false,
                overrides: vec![ReminderOverride {
                    method: "popup",
                    minutes: self.popup_minutes,
                }],
            },
            recurrence: if event.recurring {
                vec!["RRULE:FREQ=DAILY".to_string()]
            } else {
                Vec::new()
            },
        })
    }

    /// Create the event for a reminder.
    pub async fn insert_event(&self, event: &ReminderEvent) -> Result<InsertOutcome, IvaError> {
        let token = self.auth.access_token().await?;
        let body = self.event_body(event)?;

        let resp = self
            .http
            .post(self.events_url(None)?)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| IvaError::Google(format!("calendar request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let err = crate::api_error("calendar insert", resp).await;
            if status == StatusCode::CONFLICT || err.to_string().contains(DUPLICATE_MARKER) {
                info!("calendar reports duplicate event for '{}'", event.summary);
                return Ok(InsertOutcome::AlreadyExists);
            }
            return Err(err);
        }

        let created: CreatedEvent = resp
            .json()
            .await
            .map_err(|e| IvaError::Google(format!("bad calendar response: {e}")))?;
        debug!("calendar event {} created", created.id);
        Ok(InsertOutcome::Created {
            id: created.id,
            html_link: created.html_link,
        })
    }

    /// Upcoming events from `now` through the end of the period.
    pub async fn list_events(
        &self,
        period: Period,
        now: DateTime<Local>,
    ) -> Result<Vec<EventSummary>, IvaError> {
        let token = self.auth.access_token().await?;
        let time_min = now.to_rfc3339();
        let time_max = (now + period.span()).to_rfc3339();

        let resp = self
            .http
            .get(self.events_url(None)?)
            .bearer_auth(token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await
            .map_err(|e| IvaError::Google(format!("calendar request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(crate::api_error("calendar list", resp).await);
        }

        let list: EventList = resp
            .json()
            .await
            .map_err(|e| IvaError::Google(format!("bad calendar response: {e}")))?;
        Ok(list.items.into_iter().map(summarize).collect())
    }

    /// Cancel an event. Recurring series are cancelled as a whole.
    pub async fn mark_done(&self, event_id: &str) -> Result<(), IvaError> {
        let token = self.auth.access_token().await?;
        let url = self.events_url(Some(event_id))?;

        let resp = self
            .http
            .get(url.clone())
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| IvaError::Google(format!("calendar request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(crate::api_error("calendar get", resp).await);
        }
        let mut event: Value = resp
            .json()
            .await
            .map_err(|e| IvaError::Google(format!("bad calendar response: {e}")))?;
        event["status"] = Value::String("cancelled".into());

        let resp = self
            .http
            .put(url)
            .bearer_auth(&token)
            .json(&event)
            .send()
            .await
            .map_err(|e| IvaError::Google(format!("calendar request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(crate::api_error("calendar update", resp).await);
        }
        info!("calendar event {event_id} cancelled");
        Ok(())
    }
}

/// The machine's IANA zone name, `UTC` when it cannot be determined.
pub fn local_timezone() -> String {
    match iana_time_zone::get_timezone() {
        Ok(tz) => tz,
        Err(e) => {
            warn!("cannot determine the local timezone, using UTC: {e}");
            "UTC".to_string()
        }
    }
}

fn summarize(item: ListedEvent) -> EventSummary {
    EventSummary {
        id: item.id,
        summary: item
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "No Title".to_string()),
        time: item.start.map(|s| format_start(&s)).unwrap_or_else(|| "No Time".into()),
    }
}

fn format_start(start: &ListedTime) -> String {
    if let Some(dt) = &start.date_time {
        return match DateTime::parse_from_rfc3339(dt) {
            Ok(parsed) => parsed.with_timezone(&Local).format("%I:%M %p").to_string(),
            Err(_) => "No Time".to_string(),
        };
    }
    if start.date.is_some() {
        return "All Day".to_string();
    }
    "No Time".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::StaticToken;
    use chrono::NaiveDate;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, timezone: Option<&str>) -> CalendarClient {
        let config = GoogleConfig {
            timezone: timezone.map(String::from),
            ..Default::default()
        };
        CalendarClient::new(&config, Arc::new(StaticToken("tok".into())))
            .with_base_url(server.uri())
    }

    fn reminder(recurring: bool) -> ReminderEvent {
        ReminderEvent {
            summary: "take meds".into(),
            start: NaiveDate::from_ymd_opt(2030, 3, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            recurring,
        }
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("day".parse::<Period>().unwrap(), Period::Day);
        assert_eq!("WEEK".parse::<Period>().unwrap(), Period::Week);
        let err = "month".parse::<Period>().unwrap_err();
        assert!(err.to_string().contains("Choose 'day' or 'week'"));
    }

    #[test]
    fn test_format_start_variants() {
        let timed = ListedTime {
            date_time: Some("2030-03-04T09:05:00+00:00".into()),
            date: None,
        };
        let expected = DateTime::parse_from_rfc3339("2030-03-04T09:05:00+00:00")
            .unwrap()
            .with_timezone(&Local)
            .format("%I:%M %p")
            .to_string();
        assert_eq!(format_start(&timed), expected);

        let all_day = ListedTime {
            date_time: None,
            date: Some("2030-03-04".into()),
        };
        assert_eq!(format_start(&all_day), "All Day");

        let none = ListedTime {
            date_time: None,
            date: None,
        };
        assert_eq!(format_start(&none), "No Time");
    }

    #[tokio::test]
    async fn test_insert_recurring_event_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(serde_json::json!({
                "summary": "take meds",
                "start": {"dateTime": "2030-03-04T09:00:00", "timeZone": "Europe/Berlin"},
                "end": {"dateTime": "2030-03-04T09:00:00", "timeZone": "Europe/Berlin"},
                "reminders": {"useDefault": false, "overrides": [{"method": "popup", "minutes": 10}]},
                "recurrence": ["RRULE:FREQ=DAILY"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "evt1",
                "htmlLink": "https://calendar.google.com/event?eid=evt1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server, Some("Europe/Berlin"))
            .insert_event(&reminder(true))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            InsertOutcome::Created {
                id: "evt1".into(),
                html_link: Some("https://calendar.google.com/event?eid=evt1".into()),
            }
        );
        assert!(outcome.message().contains("eid=evt1"));
    }

    #[test]
    fn test_default_config_sends_local_zone() {
        let c = CalendarClient::new(&GoogleConfig::default(), Arc::new(StaticToken("t".into())));
        let zone = local_timezone();
        assert!(!zone.is_empty());

        let one_off = serde_json::to_value(c.event_body(&reminder(false)).unwrap()).unwrap();
        assert!(one_off.get("recurrence").is_none());
        assert_eq!(one_off["start"]["dateTime"], "2030-03-04T09:00:00");
        assert_eq!(one_off["start"]["timeZone"], zone.as_str());

        let daily = serde_json::to_value(c.event_body(&reminder(true)).unwrap()).unwrap();
        assert_eq!(daily["recurrence"], serde_json::json!(["RRULE:FREQ=DAILY"]));
        assert_eq!(daily["start"]["timeZone"], zone.as_str());
        assert_eq!(daily["end"]["timeZone"], zone.as_str());
    }

    #[tokio::test]
    async fn test_duplicate_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": {"code": 409, "message": "The requested identifier already exists."}
            })))
            .mount(&server)
            .await;

        let outcome = client(&server, None).insert_event(&reminder(false)).await.unwrap();
        assert_eq!(outcome, InsertOutcome::AlreadyExists);
        assert_eq!(outcome.message(), "The reminder already exists in the calendar.");
    }

    #[tokio::test]
    async fn test_insert_failure_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": {"code": 403, "message": "Insufficient Permission"}
            })))
            .mount(&server)
            .await;

        let err = client(&server, None).insert_event(&reminder(false)).await.unwrap_err();
        assert!(err.to_string().contains("Insufficient Permission"));
    }

    #[tokio::test]
    async fn test_list_events() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"id": "a", "summary": "standup", "start": {"date": "2030-03-04"}},
                    {"id": "b", "start": {"dateTime": "2030-03-04T09:00:00Z"}},
                    {"id": "c", "summary": "no start"}
                ]
            })))
            .mount(&server)
            .await;

        let events = client(&server, None)
            .list_events(Period::Week, Local::now())
            .await
            .unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].summary, "standup");
        assert_eq!(events[0].time, "All Day");
        assert_eq!(events[1].summary, "No Title");
        assert!(events[1].time.ends_with("AM") || events[1].time.ends_with("PM"));
        assert_eq!(events[2].time, "No Time");
    }

    #[tokio::test]
    async fn test_mark_done_puts_cancelled_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events/evt1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "evt1", "summary": "take meds", "status": "confirmed"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/calendars/primary/events/evt1"))
            .and(body_partial_json(serde_json::json!({"id": "evt1", "status": "cancelled"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, None).mark_done("evt1").await.unwrap();
    }

    #[tokio::test]
    async fn test_mark_done_unknown_event() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "Not Found"}
            })))
            .mount(&server)
            .await;

        assert!(client(&server, None).mark_done("nope").await.is_err());
    }

    #[test]
    fn test_calendar_id_is_path_encoded() {
        let config = GoogleConfig {
            calendar_id: "me@example.com#x".into(),
            ..Default::default()
        };
        let c = CalendarClient::new(&config, Arc::new(StaticToken("t".into())))
            .with_base_url("http://localhost/calendar/v3");
        let url = c.events_url(Some("e1")).unwrap();
        assert_eq!(url.path(), "/calendar/v3/calendars/me@example.com%23x/events/e1");
    }
}
