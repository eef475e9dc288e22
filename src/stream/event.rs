//! Typed subscription events and the SSE frame decoder.

use tracing::{debug, warn};

use crate::model::{Map, StateAttribute};

/// An event delivered on a streaming subscription.
///
/// Events flow one way, from the connection session to the subscriber, in
/// the order the transport delivered the underlying bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The transport handshake succeeded.
    Connected,
    /// The handshake was rejected or the server closed the connection.
    Disconnected,
    /// The transport ended with an error after being open.
    CompletedWithError,
    /// Keep-alive ping received from the robot.
    Ping,
    /// Pong received in reply to a keep-alive ping.
    Pong,
    /// New state attribute snapshot from the attribute stream.
    StateAttributesUpdated(Vec<StateAttribute>),
    /// New map snapshot from the map stream.
    MapUpdated(Map),
    /// Raw WebSocket text message.
    Text(String),
    /// Raw WebSocket binary message.
    Binary(Vec<u8>),
    /// The subscription was cancelled locally, typically by being superseded.
    ///
    /// Delivered after any events that were already buffered when the
    /// cancellation happened; it is the last event such a subscription sees.
    Cancelled,
}

const EVENT_FIELD: &str = "event: ";
const DATA_FIELD: &str = "data: ";

const STATE_ATTRIBUTES_EVENT: &str = "StateAttributesUpdated";
const MAP_EVENT: &str = "MapUpdated";

/// Decodes one framed SSE record into at most one event.
///
/// Comment records, records with fewer than two lines, unknown event names,
/// and payloads that fail to decode are all dropped without terminating the
/// session; decode failures are logged.
pub(crate) fn decode_sse_frame(frame: &[u8]) -> Option<Event> {
    let Ok(text) = std::str::from_utf8(frame) else {
        warn!(event = "sse_frame_not_utf8", len = frame.len());
        return None;
    };
    if text.starts_with(':') {
        return None;
    }

    let mut lines = text.lines();
    let name_line = lines.next()?;
    let data_line = lines.next()?;
    let name = name_line.strip_prefix(EVENT_FIELD).unwrap_or(name_line);
    let data = data_line.strip_prefix(DATA_FIELD).unwrap_or(data_line);

    match name {
        STATE_ATTRIBUTES_EVENT => match serde_json::from_str::<Vec<StateAttribute>>(data) {
            Ok(attributes) => Some(Event::StateAttributesUpdated(attributes)),
            Err(error) => {
                warn!(event = "sse_payload_decode_failed", name, %error);
                None
            }
        },
        MAP_EVENT => match serde_json::from_str::<Map>(data) {
            Ok(map) => Some(Event::MapUpdated(map)),
            Err(error) => {
                warn!(event = "sse_payload_decode_failed", name, %error);
                None
            }
        },
        other => {
            debug!(event = "sse_event_ignored", name = other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::state::{BatteryFlag, StateAttribute};

    #[test]
    fn decodes_state_attributes_record() {
        let frame =
            b"event: StateAttributesUpdated\ndata: [{\"__class\":\"BatteryStateAttribute\",\"level\":50,\"flag\":\"discharging\"}]";
        let event = decode_sse_frame(frame).expect("one event");
        assert_eq!(
            event,
            Event::StateAttributesUpdated(vec![StateAttribute::Battery {
                level: 50,
                flag: BatteryFlag::Discharging,
            }])
        );
    }

    #[test]
    fn decodes_map_record() {
        let payload = crate::model::map::tests::MAP_FIXTURE.replace('\n', " ");
        let frame = format!("event: MapUpdated\ndata: {payload}");
        match decode_sse_frame(frame.as_bytes()) {
            Some(Event::MapUpdated(map)) => assert_eq!(map.pixel_size, 5),
            other => panic!("unexpected decode result: {other:?}"),
        }
    }

    #[test]
    fn comment_record_yields_nothing() {
        assert_eq!(decode_sse_frame(b": keep-alive comment\ndata: ignored"), None);
    }

    #[test]
    fn unknown_event_name_yields_nothing() {
        assert_eq!(
            decode_sse_frame(b"event: FirmwareUpdateAvailable\ndata: {}"),
            None
        );
    }

    #[test]
    fn record_with_single_line_is_malformed() {
        assert_eq!(decode_sse_frame(b"event: StateAttributesUpdated"), None);
    }

    #[test]
    fn malformed_payload_is_dropped_not_fatal() {
        assert_eq!(
            decode_sse_frame(b"event: StateAttributesUpdated\ndata: {\"not\":\"an array\"}"),
            None
        );
    }

    #[test]
    fn non_utf8_frame_is_dropped() {
        assert_eq!(decode_sse_frame(&[0xff, 0xfe, 0xfd]), None);
    }
}
