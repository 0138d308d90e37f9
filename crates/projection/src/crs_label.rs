//! Resolving free-form CRS labels.
//!
//! Rasters describe their CRS in several ways: `EPSG:32633`, a WKT citation
//! such as `WGS 84 / UTM zone 33N`, or nothing useful at all. Only UTM zones
//! and WGS84 are resolved; everything else is reported as unknown.

use map_common::{CrsKind, RasterCrs, UtmZone};

/// Labels meaning plain WGS84 lon/lat.
const WGS84_LABELS: &[&str] = &["EPSG:4326", "CRS:84", "OGC:CRS84", "WGS 84", "WGS84"];

/// Find a UTM zone in a CRS label.
///
/// Accepts `EPSG:326NN` (north) / `EPSG:327NN` (south) anywhere in the label
/// and the verbose `UTM zone NN[N|S]`; matching is case-insensitive. Zones
/// outside 1..=60 count as not found.
pub fn extract_zone_from_crs_label(label: &str) -> Option<UtmZone> {
    let upper = label.to_uppercase();
    let zone = parse_epsg_form(&upper).or_else(|| parse_verbose_form(&upper))?;
    zone.is_valid().then_some(zone)
}

/// `EPSG:32` then `6`/`7` then exactly two digits.
fn parse_epsg_form(upper: &str) -> Option<UtmZone> {
    for (start, _) in upper.match_indices("EPSG:32") {
        let rest = &upper.as_bytes()[start + "EPSG:32".len()..];
        if rest.len() < 3 || !rest[1].is_ascii_digit() || !rest[2].is_ascii_digit() {
            continue;
        }
        let northern = match rest[0] {
            b'6' => true,
            b'7' => false,
            _ => continue,
        };
        let number = (rest[1] - b'0') * 10 + (rest[2] - b'0');
        return Some(UtmZone::new(number, northern));
    }
    None
}

/// `UTM ZONE ` then one or more digits then `N` or `S`.
fn parse_verbose_form(upper: &str) -> Option<UtmZone> {
    for (start, _) in upper.match_indices("UTM ZONE ") {
        let rest = &upper[start + "UTM ZONE ".len()..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            continue;
        }
        let northern = match rest[digits.len()..].chars().next() {
            Some('N') => true,
            Some('S') => false,
            _ => continue,
        };
        let Ok(number) = digits.parse::<u8>() else {
            continue;
        };
        return Some(UtmZone::new(number, northern));
    }
    None
}

/// True for the labels that denote WGS84 geographic coordinates.
pub fn is_wgs84_label(label: &str) -> bool {
    let upper = label.trim().to_uppercase();
    WGS84_LABELS.iter().any(|known| upper == *known)
}

/// Resolve a label into a [`RasterCrs`].
pub fn resolve_crs(label: &str) -> RasterCrs {
    let kind = if is_wgs84_label(label) {
        CrsKind::Geographic
    } else if let Some(zone) = extract_zone_from_crs_label(label) {
        CrsKind::Utm(zone)
    } else {
        CrsKind::Unknown
    };
    RasterCrs::new(label.trim(), kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsg_north() {
        assert_eq!(extract_zone_from_crs_label("EPSG:32612"), Some(UtmZone::north(12)));
    }

    #[test]
    fn test_epsg_south_lowercase() {
        assert_eq!(extract_zone_from_crs_label("epsg:32733"), Some(UtmZone::south(33)));
    }

    #[test]
    fn test_verbose() {
        assert_eq!(extract_zone_from_crs_label("UTM zone 33S"), Some(UtmZone::south(33)));
        assert_eq!(
            extract_zone_from_crs_label("WGS 84 / UTM zone 32N"),
            Some(UtmZone::north(32))
        );
    }

    #[test]
    fn test_epsg_embedded_in_wkt() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 18N",AUTHORITY["EPSG","32618"]]"#;
        assert_eq!(extract_zone_from_crs_label(wkt), Some(UtmZone::north(18)));
        assert_eq!(extract_zone_from_crs_label("ID EPSG:32618"), Some(UtmZone::north(18)));
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(extract_zone_from_crs_label("EPSG:3035"), None);
        assert_eq!(extract_zone_from_crs_label("EPSG:32812"), None);
        assert_eq!(extract_zone_from_crs_label("UTM zone 33"), None);
        assert_eq!(extract_zone_from_crs_label(""), None);
    }

    #[test]
    fn test_zone_out_of_range() {
        assert_eq!(extract_zone_from_crs_label("EPSG:32600"), None);
        assert_eq!(extract_zone_from_crs_label("EPSG:32661"), None);
        assert_eq!(extract_zone_from_crs_label("UTM zone 99N"), None);
    }

    #[test]
    fn test_resolve_crs() {
        assert_eq!(resolve_crs("EPSG:4326").kind, CrsKind::Geographic);
        assert_eq!(resolve_crs("crs:84").kind, CrsKind::Geographic);
        assert_eq!(resolve_crs("EPSG:32632").kind, CrsKind::Utm(UtmZone::north(32)));
        assert_eq!(resolve_crs("EPSG:3035").kind, CrsKind::Unknown);
        assert_eq!(resolve_crs(" EPSG:32632 ").label, "EPSG:32632");
    }
}
