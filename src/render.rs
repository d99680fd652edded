// src/render.rs

//! Leaflet map artifact emission.
//!
//! Consumes normalized points grouped by category and emits a single
//! self-contained HTML document. Property layers are toggled through the
//! standard layer control; school markers additionally carry `tags`
//! (rating, type) in their options for the optional tag-filter control,
//! which is feature-detected so a missing plugin is a silent no-op.

use std::collections::BTreeSet;

use crate::models::{MapPoint, SchoolPoint, PRICE_GROUPS};

/// Hex fill for the named marker colors (Leaflet.awesome-markers palette).
fn marker_color(name: &str) -> &'static str {
    match name {
        "red" => "#d63e2a",
        "lightred" => "#ff8e7f",
        "orange" => "#f69730",
        "green" => "#72b026",
        "darkblue" => "#0067a3",
        "blue" => "#38aadd",
        "cadetblue" => "#436978",
        "purple" => "#d252b9",
        "darkpurple" => "#5b396b",
        "lightgray" => "#a3a3a3",
        _ => "#575757", // gray
    }
}

/// Render a string as a safe JS literal.
///
/// JSON escaping covers quotes and control characters; `</` is broken up so
/// popup markup cannot terminate the surrounding script element.
fn js_string(s: &str) -> String {
    serde_json::to_string(s)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

fn property_marker(point: &MapPoint) -> String {
    let color = marker_color(point.color);
    format!(
        "L.circleMarker([{lat}, {lon}], {{radius: 8, color: \"{color}\", fillColor: \"{color}\", fillOpacity: 0.85, weight: 1}}).bindPopup({popup}, {{maxWidth: 400}})",
        lat = point.lat,
        lon = point.lon,
        popup = js_string(&point.popup_html),
    )
}

fn school_marker(point: &SchoolPoint) -> String {
    let color = marker_color(point.color);
    format!(
        "L.circleMarker([{lat}, {lon}], {{radius: 6, color: \"{color}\", fillColor: \"{color}\", fillOpacity: 0.9, weight: 1, tags: [{rating}, {kind}]}}).bindPopup({popup}, {{maxWidth: 300}})",
        lat = point.lat,
        lon = point.lon,
        rating = js_string(&point.rating_tag()),
        kind = js_string(point.school_type.as_str()),
        popup = js_string(&point.popup_html),
    )
}

/// Rating tags sorted numerically descending, "N/A" last.
fn sorted_rating_tags(schools: &[SchoolPoint]) -> Vec<String> {
    let tags: BTreeSet<String> = schools.iter().map(|s| s.rating_tag()).collect();
    let mut tags: Vec<String> = tags.into_iter().collect();
    tags.sort_by_key(|t| (t == "N/A", -t.parse::<i64>().unwrap_or(0)));
    tags
}

fn tag_array(tags: &[String]) -> String {
    let quoted: Vec<String> = tags.iter().map(|t| js_string(t)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Render the full map document.
///
/// Property groups appear in fixed bucket order; empty buckets are omitted.
/// The schools layer is always present, even when empty, to keep the
/// control layout stable across runs.
pub fn render_map(
    center_lat: f64,
    center_lon: f64,
    points: &[MapPoint],
    schools: &[SchoolPoint],
) -> String {
    let mut script = String::new();
    script.push_str(&format!(
        "var map = L.map(\"map\").setView([{center_lat}, {center_lon}], 11);\n\
         L.tileLayer(\"https://tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png\", {{\n\
         \tmaxZoom: 19, attribution: \"&copy; OpenStreetMap contributors\"\n\
         }}).addTo(map);\n\
         var overlays = {{}};\n"
    ));

    for (idx, group) in PRICE_GROUPS.iter().enumerate() {
        let markers: Vec<String> = points
            .iter()
            .filter(|p| p.group == *group)
            .map(property_marker)
            .collect();
        if markers.is_empty() {
            continue;
        }
        script.push_str(&format!(
            "var group{idx} = L.layerGroup([\n{}\n]).addTo(map);\noverlays[{}] = group{idx};\n",
            markers.join(",\n"),
            js_string(group),
        ));
    }

    let school_markers: Vec<String> = schools.iter().map(school_marker).collect();
    script.push_str(&format!(
        "var schoolsGroup = L.layerGroup([\n{}\n]).addTo(map);\noverlays[\"Schools\"] = schoolsGroup;\n",
        school_markers.join(",\n"),
    ));

    script.push_str("L.control.layers(null, overlays, {collapsed: false}).addTo(map);\n");

    if !schools.is_empty() {
        let rating_tags = tag_array(&sorted_rating_tags(schools));
        let type_set: BTreeSet<&str> = schools.iter().map(|s| s.school_type.as_str()).collect();
        let type_tags = tag_array(&type_set.iter().map(|t| t.to_string()).collect::<Vec<_>>());
        // Optional multi-select filters; feature-detected so a missing
        // plugin leaves the rest of the map working.
        script.push_str(&format!(
            "if (L.control && L.control.tagFilterButton) {{\n\
             \tL.control.tagFilterButton({{data: {rating_tags}, filterType: \"or\", position: \"topleft\", clearText: \"clear\"}}).addTo(map);\n\
             \tL.control.tagFilterButton({{data: {type_tags}, filterType: \"or\", position: \"topleft\", clearText: \"clear\"}}).addTo(map);\n\
             }}\n"
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>Listings Map</title>\n\
         <link rel=\"stylesheet\" href=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.css\">\n\
         <script src=\"https://unpkg.com/leaflet@1.9.4/dist/leaflet.js\"></script>\n\
         <style>html, body, #map {{ height: 100%; margin: 0; }}</style>\n\
         </head>\n<body>\n\
         <div id=\"map\"></div>\n\
         <script>\n{script}</script>\n\
         </body>\n</html>\n"
    )
}
