/// Test fixtures: representative JSON payloads from the USGS IV API.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the parser. They reflect the real WaterML-as-JSON
/// envelope returned by:
///   https://waterservices.usgs.gov/nwis/iv/?format=json&...
///
/// USGS IV response shape:
///   response.value.timeSeries[]
///     .sourceInfo.siteCode[0].value  — site number (string)
///     .sourceInfo.siteName
///     .variable.variableCode[0].value — parameter code (string)
///     .variable.unit.unitCode
///     .variable.noDataValue          — sentinel for missing data (-999999)
///     .values[0].value[]
///       .value     — the measurement as a STRING (not a number)
///       .dateTime  — ISO 8601 with offset
///       .qualifiers[] — e.g. ["P"] or ["A"]
///
/// Note: measurement values are always JSON strings in the USGS response,
/// even though they represent numbers. Parsers must handle this.

/// Single site (Little Falls 01646500), gage height, three 15-minute
/// readings. Timestamps carry a -05:00 offset so UTC conversion is
/// exercised: 12:00-05:00 == 17:00Z.
pub(crate) fn fixture_little_falls_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {
              "siteName": "POTOMAC RIVER NEAR WASH, DC LITTLE FALLS PUMP STA",
              "siteCode": [{ "value": "01646500", "network": "NWIS", "agencyCode": "USGS" }],
              "geoLocation": {
                "geogLocation": { "srs": "EPSG:4326", "latitude": 38.9495, "longitude": -77.1277 }
              }
            },
            "variable": {
              "variableCode": [{ "value": "00065", "network": "NWIS" }],
              "variableName": "Gage height, ft",
              "unit": { "unitCode": "ft" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [
                { "value": "3.20", "qualifiers": ["P"], "dateTime": "2024-05-01T12:00:00.000-05:00" },
                { "value": "3.24", "qualifiers": ["P"], "dateTime": "2024-05-01T12:15:00.000-05:00" },
                { "value": "3.31", "qualifiers": ["P"], "dateTime": "2024-05-01T12:30:00.000-05:00" }
              ],
              "qualifier": [{ "qualifierCode": "P", "qualifierDescription": "Provisional data subject to revision." }]
            }]
          }
        ]
      }
    }"#
}

/// Two timeSeries entries in one response (the IV service returns one per
/// parameter). Values interleave in time to exercise the merge sort.
pub(crate) fn fixture_two_series_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {
              "siteName": "POTOMAC RIVER NEAR WASH, DC LITTLE FALLS PUMP STA",
              "siteCode": [{ "value": "01646500", "network": "NWIS", "agencyCode": "USGS" }]
            },
            "variable": {
              "variableCode": [{ "value": "00065", "network": "NWIS" }],
              "variableName": "Gage height, ft",
              "unit": { "unitCode": "ft" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [
                { "value": "3.40", "qualifiers": ["P"], "dateTime": "2024-05-01T13:15:00.000-05:00" }
              ],
              "qualifier": []
            }]
          },
          {
            "sourceInfo": {
              "siteName": "POTOMAC RIVER NEAR WASH, DC LITTLE FALLS PUMP STA",
              "siteCode": [{ "value": "01646500", "network": "NWIS", "agencyCode": "USGS" }]
            },
            "variable": {
              "variableCode": [{ "value": "00060", "network": "NWIS" }],
              "variableName": "Streamflow, ft&#179;/s",
              "unit": { "unitCode": "ft3/s" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [
                { "value": "12400", "qualifiers": ["P"], "dateTime": "2024-05-01T13:00:00.000-05:00" }
              ],
              "qualifier": []
            }]
          }
        ]
      }
    }"#
}

/// One sentinel entry followed by one good reading. The sentinel must be
/// dropped without losing the good value.
pub(crate) fn fixture_mixed_sentinel_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {
              "siteName": "POTOMAC RIVER NEAR WASH, DC LITTLE FALLS PUMP STA",
              "siteCode": [{ "value": "01646500", "network": "NWIS", "agencyCode": "USGS" }]
            },
            "variable": {
              "variableCode": [{ "value": "00065", "network": "NWIS" }],
              "variableName": "Gage height, ft",
              "unit": { "unitCode": "ft" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [
                { "value": "-999999", "qualifiers": ["P"], "dateTime": "2024-05-01T12:00:00.000-05:00" },
                { "value": "4.10", "qualifiers": ["P"], "dateTime": "2024-05-01T12:15:00.000-05:00" }
              ],
              "qualifier": []
            }]
          }
        ]
      }
    }"#
}

/// USGS uses the string "-999999" as a sentinel even when a timestamp is
/// present. A response containing only sentinels carries no usable data.
pub(crate) fn fixture_sentinel_only_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {
              "siteName": "SENECA CREEK AT DAWSONVILLE, MD",
              "siteCode": [{ "value": "01645000", "network": "NWIS", "agencyCode": "USGS" }]
            },
            "variable": {
              "variableCode": [{ "value": "00065", "network": "NWIS" }],
              "variableName": "Gage height, ft",
              "unit": { "unitCode": "ft" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [
                { "value": "-999999", "qualifiers": ["P"], "dateTime": "2024-05-01T12:00:00.000-05:00" }
              ],
              "qualifier": []
            }]
          }
        ]
      }
    }"#
}

/// Structurally valid envelope whose series contains an empty value array.
pub(crate) fn fixture_empty_value_array_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {
              "siteName": "SENECA CREEK AT DAWSONVILLE, MD",
              "siteCode": [{ "value": "01645000", "network": "NWIS", "agencyCode": "USGS" }]
            },
            "variable": {
              "variableCode": [{ "value": "00065", "network": "NWIS" }],
              "variableName": "Gage height, ft",
              "unit": { "unitCode": "ft" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [],
              "qualifier": []
            }]
          }
        ]
      }
    }"#
}

/// One entry whose value string is not numeric, one good entry. The bad
/// entry is skipped with a warning; the batch still succeeds.
pub(crate) fn fixture_bad_value_json() -> &'static str {
    r#"{
      "value": {
        "timeSeries": [
          {
            "sourceInfo": {
              "siteName": "POTOMAC RIVER NEAR WASH, DC LITTLE FALLS PUMP STA",
              "siteCode": [{ "value": "01646500", "network": "NWIS", "agencyCode": "USGS" }]
            },
            "variable": {
              "variableCode": [{ "value": "00065", "network": "NWIS" }],
              "variableName": "Gage height, ft",
              "unit": { "unitCode": "ft" },
              "noDataValue": -999999.0
            },
            "values": [{
              "value": [
                { "value": "Ice", "qualifiers": ["P"], "dateTime": "2024-05-01T12:00:00.000-05:00" },
                { "value": "3.55", "qualifiers": ["P"], "dateTime": "2024-05-01T12:15:00.000-05:00" }
              ],
              "qualifier": []
            }]
          }
        ]
      }
    }"#
}
