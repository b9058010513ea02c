//! ID/URL codec (§4.12): turning path segments, query values or JSON numbers
//! into catalog ids, and building the canonical `/<collection>/<id>` links
//! that go into DTOs.

/// Accepts an integer, a decimal string, or a URI path ending in
/// `/<digits>`, returning the integer id or `None`.
pub fn extract_id(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(id) = value.parse::<i64>() {
        return Some(id);
    }
    let tail = value.rsplit('/').next().unwrap_or(value);
    tail.parse::<i64>().ok()
}

pub fn extract_id_from_json(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => extract_id(s),
        _ => None,
    }
}

fn link(collection: &str, id: i64) -> String {
    format!("/{collection}/{id}")
}

pub fn track_link(id: i64) -> String {
    link("tracks", id)
}

pub fn album_link(id: i64) -> String {
    link("albums", id)
}

pub fn genre_link(id: i64) -> String {
    link("genres", id)
}

pub fn playlist_link(id: i64) -> String {
    link("playlists", id)
}

pub fn radio_link(id: i64) -> String {
    link("radio", id)
}

pub fn artwork_link(id: i64) -> String {
    link("artwork", id)
}

pub fn artworkinfo_link(id: i64) -> String {
    link("artworkinfo", id)
}

pub fn mp3_link(id: i64) -> String {
    link("mp3", id)
}

/// `/artists/<name>` — the raw artist name as the final path segment; the
/// client is responsible for percent-encoding it when following the link.
pub fn artist_link(name: &str) -> String {
    format!("/artists/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_integer() {
        assert_eq!(extract_id("42"), Some(42));
    }

    #[test]
    fn extracts_trailing_digits_from_path() {
        assert_eq!(extract_id("/albums/42"), Some(42));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(extract_id("/albums/abc"), None);
        assert_eq!(extract_id(""), None);
    }

    #[test]
    fn round_trips_through_album_link() {
        assert_eq!(extract_id(&album_link(17)), Some(17));
    }
}
