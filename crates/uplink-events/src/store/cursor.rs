//! Opaque pagination cursors.
//!
//! A cursor encodes the `(event_time, id)` of the last row a page
//! returned, plus the sort direction it was produced under. Clients treat
//! it as an opaque token; the store rejects tampered or mismatched
//! cursors as an `InvalidEvent` on the `cursor` field rather than
//! producing silently wrong pages.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};

use crate::errors::{EventStoreError, Result};
use crate::sqlite::repositories::event::{Keyset, fmt_time};
use crate::types::SortOrder;

/// Encode the boundary row of a page into an opaque cursor.
pub fn encode(keyset: &Keyset, order: SortOrder) -> String {
    let dir = match order {
        SortOrder::Asc => "a",
        SortOrder::Desc => "d",
    };
    let raw = format!("{dir}|{}|{}", fmt_time(&keyset.event_time), keyset.id);
    URL_SAFE_NO_PAD.encode(raw)
}

/// Decode a cursor, checking it was produced under the same sort order
/// as the current query.
pub fn decode(cursor: &str, order: SortOrder) -> Result<Keyset> {
    let bad = || EventStoreError::invalid("cursor", "malformed pagination cursor");

    let raw = URL_SAFE_NO_PAD.decode(cursor).map_err(|_| bad())?;
    let raw = String::from_utf8(raw).map_err(|_| bad())?;

    let mut parts = raw.splitn(3, '|');
    let dir = parts.next().ok_or_else(bad)?;
    let time = parts.next().ok_or_else(bad)?;
    let id = parts.next().ok_or_else(bad)?;

    let expected = match order {
        SortOrder::Asc => "a",
        SortOrder::Desc => "d",
    };
    if dir != expected {
        return Err(EventStoreError::invalid(
            "cursor",
            "cursor was issued for a different sort order",
        ));
    }

    let event_time: DateTime<Utc> = time.parse().map_err(|_| bad())?;
    let id: i64 = id.parse().map_err(|_| bad())?;
    Ok(Keyset { event_time, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn keyset() -> Keyset {
        Keyset {
            event_time: "2026-03-01T12:00:00.000000Z".parse().unwrap(),
            id: 42,
        }
    }

    #[test]
    fn round_trip() {
        let cursor = encode(&keyset(), SortOrder::Asc);
        let decoded = decode(&cursor, SortOrder::Asc).unwrap();
        assert_eq!(decoded.id, 42);
        assert_eq!(decoded.event_time, keyset().event_time);
    }

    #[test]
    fn cursor_is_opaque() {
        let cursor = encode(&keyset(), SortOrder::Asc);
        assert!(!cursor.contains('|'));
        assert!(!cursor.contains("2026"));
    }

    #[test]
    fn rejects_garbage() {
        assert_matches!(
            decode("not-a-cursor!!!", SortOrder::Asc),
            Err(EventStoreError::InvalidEvent { field: "cursor", .. })
        );
    }

    #[test]
    fn rejects_tampered_payload() {
        let tampered = URL_SAFE_NO_PAD.encode("a|yesterday|abc");
        assert_matches!(
            decode(&tampered, SortOrder::Asc),
            Err(EventStoreError::InvalidEvent { field: "cursor", .. })
        );
    }

    #[test]
    fn rejects_direction_mismatch() {
        let cursor = encode(&keyset(), SortOrder::Asc);
        assert_matches!(
            decode(&cursor, SortOrder::Desc),
            Err(EventStoreError::InvalidEvent { field: "cursor", .. })
        );
    }
}
