// 📚 Reference Data - immutable lookup tables
//
// Everything validation checks membership against:
// - company statuses / entity types / funding stages (ordered enum lists)
// - NAICS vertical → sub-vertical mapping
// - valid ISO 3166-1 alpha-2 country codes
//
// Loaded once, never mutated. Bad reference data is reported as
// diagnostics, not errors: validation will reject what it can't match.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::dataset::ShapeDiagnostic;
use crate::entities::{CompanyStatus, EntityType, FundingStage};

// ============================================================================
// NAICS REFERENCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaicsReference {
    pub vertical: String,
    pub sub_verticals: Vec<String>,
}

impl NaicsReference {
    pub fn new(vertical: &str, sub_verticals: &[&str]) -> Self {
        NaicsReference {
            vertical: vertical.to_string(),
            sub_verticals: sub_verticals.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn contains(&self, sub_vertical: &str) -> bool {
        self.sub_verticals.iter().any(|s| s == sub_vertical)
    }
}

// ============================================================================
// REFERENCE DATA
// ============================================================================

#[derive(Debug, Clone)]
pub struct ReferenceData {
    naics: Vec<NaicsReference>,
    country_codes: BTreeSet<String>,
}

impl ReferenceData {
    pub fn new<I, S>(naics: Vec<NaicsReference>, country_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ReferenceData {
            naics,
            country_codes: country_codes.into_iter().map(Into::into).collect(),
        }
    }

    /// NAICS mapping plus the full ISO 3166-1 country list
    pub fn with_iso_countries(naics: Vec<NaicsReference>) -> Self {
        Self::new(naics, ISO_COUNTRIES.iter().map(|(code, _)| *code))
    }

    pub fn statuses(&self) -> &'static [CompanyStatus] {
        &CompanyStatus::ALL
    }

    pub fn entity_types(&self) -> &'static [EntityType] {
        &EntityType::ALL
    }

    pub fn funding_stages(&self) -> &'static [FundingStage] {
        &FundingStage::ALL
    }

    pub fn naics(&self) -> &[NaicsReference] {
        &self.naics
    }

    pub fn verticals(&self) -> impl Iterator<Item = &str> {
        self.naics.iter().map(|n| n.vertical.as_str())
    }

    pub fn find_vertical(&self, vertical: &str) -> Option<&NaicsReference> {
        self.naics.iter().find(|n| n.vertical == vertical)
    }

    /// Sub-verticals of `vertical`; empty for an unknown vertical
    pub fn sub_verticals(&self, vertical: &str) -> &[String] {
        self.find_vertical(vertical)
            .map(|n| n.sub_verticals.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_valid_vertical(&self, vertical: &str) -> bool {
        self.find_vertical(vertical).is_some()
    }

    pub fn is_valid_country(&self, code: &str) -> bool {
        self.country_codes.contains(code)
    }

    pub fn country_codes(&self) -> impl Iterator<Item = &str> {
        self.country_codes.iter().map(|c| c.as_str())
    }

    /// Structural sanity check, run once at startup
    pub fn check_shape(&self) -> Vec<ShapeDiagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen = HashSet::new();

        for (i, naics) in self.naics.iter().enumerate() {
            if naics.vertical.is_empty() {
                diagnostics.push(ShapeDiagnostic::new(
                    format!("naicsReference.{}.vertical", i),
                    "Vertical name is empty",
                ));
            } else if !seen.insert(naics.vertical.as_str()) {
                diagnostics.push(ShapeDiagnostic::new(
                    format!("naicsReference.{}.vertical", i),
                    format!("Duplicate vertical \"{}\"", naics.vertical),
                ));
            }

            if naics.sub_verticals.is_empty() {
                diagnostics.push(ShapeDiagnostic::new(
                    format!("naicsReference.{}.subVerticals", i),
                    format!("Vertical \"{}\" has no sub-verticals", naics.vertical),
                ));
            }
        }

        if self.country_codes.is_empty() {
            diagnostics.push(ShapeDiagnostic::new("countryCodes", "No country codes loaded"));
        }

        diagnostics
    }
}

/// Display name for a country code (used by the location picker)
pub fn country_name(code: &str) -> Option<&'static str> {
    ISO_COUNTRIES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

// ============================================================================
// ISO 3166-1 ALPHA-2
// ============================================================================

pub const ISO_COUNTRIES: &[(&str, &str)] = &[
    ("AD", "Andorra"),
    ("AE", "United Arab Emirates"),
    ("AF", "Afghanistan"),
    ("AG", "Antigua and Barbuda"),
    ("AI", "Anguilla"),
    ("AL", "Albania"),
    ("AM", "Armenia"),
    ("AO", "Angola"),
    ("AQ", "Antarctica"),
    ("AR", "Argentina"),
    ("AS", "American Samoa"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("AW", "Aruba"),
    ("AX", "Åland Islands"),
    ("AZ", "Azerbaijan"),
    ("BA", "Bosnia and Herzegovina"),
    ("BB", "Barbados"),
    ("BD", "Bangladesh"),
    ("BE", "Belgium"),
    ("BF", "Burkina Faso"),
    ("BG", "Bulgaria"),
    ("BH", "Bahrain"),
    ("BI", "Burundi"),
    ("BJ", "Benin"),
    ("BL", "Saint Barthélemy"),
    ("BM", "Bermuda"),
    ("BN", "Brunei Darussalam"),
    ("BO", "Bolivia"),
    ("BQ", "Bonaire, Sint Eustatius and Saba"),
    ("BR", "Brazil"),
    ("BS", "Bahamas"),
    ("BT", "Bhutan"),
    ("BV", "Bouvet Island"),
    ("BW", "Botswana"),
    ("BY", "Belarus"),
    ("BZ", "Belize"),
    ("CA", "Canada"),
    ("CC", "Cocos (Keeling) Islands"),
    ("CD", "Congo, Democratic Republic of the"),
    ("CF", "Central African Republic"),
    ("CG", "Congo"),
    ("CH", "Switzerland"),
    ("CI", "Côte d'Ivoire"),
    ("CK", "Cook Islands"),
    ("CL", "Chile"),
    ("CM", "Cameroon"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("CR", "Costa Rica"),
    ("CU", "Cuba"),
    ("CV", "Cabo Verde"),
    ("CW", "Curaçao"),
    ("CX", "Christmas Island"),
    ("CY", "Cyprus"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DJ", "Djibouti"),
    ("DK", "Denmark"),
    ("DM", "Dominica"),
    ("DO", "Dominican Republic"),
    ("DZ", "Algeria"),
    ("EC", "Ecuador"),
    ("EE", "Estonia"),
    ("EG", "Egypt"),
    ("EH", "Western Sahara"),
    ("ER", "Eritrea"),
    ("ES", "Spain"),
    ("ET", "Ethiopia"),
    ("FI", "Finland"),
    ("FJ", "Fiji"),
    ("FK", "Falkland Islands (Malvinas)"),
    ("FM", "Micronesia"),
    ("FO", "Faroe Islands"),
    ("FR", "France"),
    ("GA", "Gabon"),
    ("GB", "United Kingdom"),
    ("GD", "Grenada"),
    ("GE", "Georgia"),
    ("GF", "French Guiana"),
    ("GG", "Guernsey"),
    ("GH", "Ghana"),
    ("GI", "Gibraltar"),
    ("GL", "Greenland"),
    ("GM", "Gambia"),
    ("GN", "Guinea"),
    ("GP", "Guadeloupe"),
    ("GQ", "Equatorial Guinea"),
    ("GR", "Greece"),
    ("GS", "South Georgia and the South Sandwich Islands"),
    ("GT", "Guatemala"),
    ("GU", "Guam"),
    ("GW", "Guinea-Bissau"),
    ("GY", "Guyana"),
    ("HK", "Hong Kong"),
    ("HM", "Heard Island and McDonald Islands"),
    ("HN", "Honduras"),
    ("HR", "Croatia"),
    ("HT", "Haiti"),
    ("HU", "Hungary"),
    ("ID", "Indonesia"),
    ("IE", "Ireland"),
    ("IL", "Israel"),
    ("IM", "Isle of Man"),
    ("IN", "India"),
    ("IO", "British Indian Ocean Territory"),
    ("IQ", "Iraq"),
    ("IR", "Iran"),
    ("IS", "Iceland"),
    ("IT", "Italy"),
    ("JE", "Jersey"),
    ("JM", "Jamaica"),
    ("JO", "Jordan"),
    ("JP", "Japan"),
    ("KE", "Kenya"),
    ("KG", "Kyrgyzstan"),
    ("KH", "Cambodia"),
    ("KI", "Kiribati"),
    ("KM", "Comoros"),
    ("KN", "Saint Kitts and Nevis"),
    ("KP", "Korea, Democratic People's Republic of"),
    ("KR", "Korea, Republic of"),
    ("KW", "Kuwait"),
    ("KY", "Cayman Islands"),
    ("KZ", "Kazakhstan"),
    ("LA", "Lao People's Democratic Republic"),
    ("LB", "Lebanon"),
    ("LC", "Saint Lucia"),
    ("LI", "Liechtenstein"),
    ("LK", "Sri Lanka"),
    ("LR", "Liberia"),
    ("LS", "Lesotho"),
    ("LT", "Lithuania"),
    ("LU", "Luxembourg"),
    ("LV", "Latvia"),
    ("LY", "Libya"),
    ("MA", "Morocco"),
    ("MC", "Monaco"),
    ("MD", "Moldova"),
    ("ME", "Montenegro"),
    ("MF", "Saint Martin (French part)"),
    ("MG", "Madagascar"),
    ("MH", "Marshall Islands"),
    ("MK", "North Macedonia"),
    ("ML", "Mali"),
    ("MM", "Myanmar"),
    ("MN", "Mongolia"),
    ("MO", "Macao"),
    ("MP", "Northern Mariana Islands"),
    ("MQ", "Martinique"),
    ("MR", "Mauritania"),
    ("MS", "Montserrat"),
    ("MT", "Malta"),
    ("MU", "Mauritius"),
    ("MV", "Maldives"),
    ("MW", "Malawi"),
    ("MX", "Mexico"),
    ("MY", "Malaysia"),
    ("MZ", "Mozambique"),
    ("NA", "Namibia"),
    ("NC", "New Caledonia"),
    ("NE", "Niger"),
    ("NF", "Norfolk Island"),
    ("NG", "Nigeria"),
    ("NI", "Nicaragua"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NP", "Nepal"),
    ("NR", "Nauru"),
    ("NU", "Niue"),
    ("NZ", "New Zealand"),
    ("OM", "Oman"),
    ("PA", "Panama"),
    ("PE", "Peru"),
    ("PF", "French Polynesia"),
    ("PG", "Papua New Guinea"),
    ("PH", "Philippines"),
    ("PK", "Pakistan"),
    ("PL", "Poland"),
    ("PM", "Saint Pierre and Miquelon"),
    ("PN", "Pitcairn"),
    ("PR", "Puerto Rico"),
    ("PS", "Palestine, State of"),
    ("PT", "Portugal"),
    ("PW", "Palau"),
    ("PY", "Paraguay"),
    ("QA", "Qatar"),
    ("RE", "Réunion"),
    ("RO", "Romania"),
    ("RS", "Serbia"),
    ("RU", "Russian Federation"),
    ("RW", "Rwanda"),
    ("SA", "Saudi Arabia"),
    ("SB", "Solomon Islands"),
    ("SC", "Seychelles"),
    ("SD", "Sudan"),
    ("SE", "Sweden"),
    ("SG", "Singapore"),
    ("SH", "Saint Helena, Ascension and Tristan da Cunha"),
    ("SI", "Slovenia"),
    ("SJ", "Svalbard and Jan Mayen"),
    ("SK", "Slovakia"),
    ("SL", "Sierra Leone"),
    ("SM", "San Marino"),
    ("SN", "Senegal"),
    ("SO", "Somalia"),
    ("SR", "Suriname"),
    ("SS", "South Sudan"),
    ("ST", "Sao Tome and Principe"),
    ("SV", "El Salvador"),
    ("SX", "Sint Maarten (Dutch part)"),
    ("SY", "Syrian Arab Republic"),
    ("SZ", "Eswatini"),
    ("TC", "Turks and Caicos Islands"),
    ("TD", "Chad"),
    ("TF", "French Southern Territories"),
    ("TG", "Togo"),
    ("TH", "Thailand"),
    ("TJ", "Tajikistan"),
    ("TK", "Tokelau"),
    ("TL", "Timor-Leste"),
    ("TM", "Turkmenistan"),
    ("TN", "Tunisia"),
    ("TO", "Tonga"),
    ("TR", "Türkiye"),
    ("TT", "Trinidad and Tobago"),
    ("TV", "Tuvalu"),
    ("TW", "Taiwan"),
    ("TZ", "Tanzania"),
    ("UA", "Ukraine"),
    ("UG", "Uganda"),
    ("UM", "United States Minor Outlying Islands"),
    ("US", "United States"),
    ("UY", "Uruguay"),
    ("UZ", "Uzbekistan"),
    ("VA", "Holy See"),
    ("VC", "Saint Vincent and the Grenadines"),
    ("VE", "Venezuela"),
    ("VG", "Virgin Islands (British)"),
    ("VI", "Virgin Islands (U.S.)"),
    ("VN", "Viet Nam"),
    ("VU", "Vanuatu"),
    ("WF", "Wallis and Futuna"),
    ("WS", "Samoa"),
    ("YE", "Yemen"),
    ("YT", "Mayotte"),
    ("ZA", "South Africa"),
    ("ZM", "Zambia"),
    ("ZW", "Zimbabwe"),
];

// ============================================================================
// TESTS
// ============================================================================
