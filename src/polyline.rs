//! Decoder for the encoded polyline format used by `overview_polyline`.
//!
//! Each coordinate is a pair of zig-zag encoded deltas at 1e-5 degree
//! precision, split into 5-bit chunks offset by 63.

use crate::geo::Coordinate;

const PRECISION: f64 = 1e5;

/// Decodes an encoded polyline. Returns `None` if the string is truncated
/// or contains characters outside the encoding alphabet.
pub fn decode(encoded: &str) -> Option<Vec<Coordinate>> {
    let mut bytes = encoded.bytes();
    let mut path = Vec::new();
    let (mut lat, mut lng) = (0i64, 0i64);

    loop {
        let dlat = match next_value(&mut bytes)? {
            Some(v) => v,
            None => break,
        };
        // A latitude without its longitude is truncated input.
        let dlng = next_value(&mut bytes)??;
        lat += dlat;
        lng += dlng;
        path.push(Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Some(path)
}

/// Reads one signed value. `Some(None)` marks a clean end of input,
/// `None` a malformed or truncated value.
fn next_value(bytes: &mut impl Iterator<Item = u8>) -> Option<Option<i64>> {
    let mut result: i64 = 0;
    let mut shift = 0;
    let mut started = false;

    loop {
        let b = match bytes.next() {
            Some(b) => b,
            None if !started => return Some(None),
            None => return None,
        };
        started = true;
        if !(63..=126).contains(&b) || shift > 60 {
            return None;
        }
        let chunk = (b - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    let value = if result & 1 != 0 { !(result >> 1) } else { result >> 1 };
    Some(Some(value))
}
