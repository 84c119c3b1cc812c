//! Name-driven validation catalogue for string fields
//!
//! An ordered, static table of (name predicate, rule) pairs. The lower-cased
//! column name is tested top to bottom and the first entry that matches
//! supplies the rule. Columns matching nothing get [`FALLBACK_PATTERN`].

/// Test applied to a lower-cased column name
#[derive(Debug)]
pub enum NamePredicate {
    /// Substring anywhere in the name
    Contains(&'static str),
    /// One of the `_`-separated segments equals the value
    Token(&'static str),
    /// Whole name equals the value
    Equals(&'static str),
    All(&'static [NamePredicate]),
    Any(&'static [NamePredicate]),
    Not(&'static NamePredicate),
}

impl NamePredicate {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePredicate::Contains(needle) => name.contains(needle),
            NamePredicate::Token(token) => name.split('_').any(|segment| segment == *token),
            NamePredicate::Equals(value) => name == *value,
            NamePredicate::All(preds) => preds.iter().all(|p| p.matches(name)),
            NamePredicate::Any(preds) => preds.iter().any(|p| p.matches(name)),
            NamePredicate::Not(pred) => !pred.matches(name),
        }
    }
}

/// One catalogue row
#[derive(Debug)]
pub struct NameRule {
    pub label: &'static str,
    pub predicate: NamePredicate,
    pub pattern: &'static str,
    /// Extra boolean rule emitted alongside the pattern (`email: true`)
    pub flag: Option<&'static str>,
}

use NamePredicate::{All, Any, Contains, Equals, Not, Token};

pub const FALLBACK_PATTERN: &str = r"^.{1,255}$";

/// Names that force `min_length: 8` whatever else matched
pub const PASSWORD_MARKERS: [&str; 4] = ["password", "clave", "contrasena", "contraseña"];

pub static NAME_RULES: &[NameRule] = &[
    NameRule {
        label: "email",
        predicate: Any(&[Contains("email"), Contains("correo")]),
        pattern: r"^[^\s@]+@[^\s@]+\.[^\s@]+$",
        flag: Some("email"),
    },
    NameRule {
        label: "url",
        predicate: Any(&[Contains("url"), Contains("website"), Contains("sitio")]),
        pattern: r"^https?://[^\s/$.?#].[^\s]*$",
        flag: None,
    },
    NameRule {
        label: "phone",
        predicate: Any(&[
            Contains("telefono"),
            Contains("phone"),
            Contains("celular"),
            Contains("movil"),
        ]),
        pattern: r"^[0-9+\-\s\(\)]{7,20}$",
        flag: None,
    },
    NameRule {
        label: "cuit",
        predicate: Contains("cuit"),
        pattern: r"^(20|23|24|27|30|33|34)-?\d{8}-?\d$",
        flag: None,
    },
    NameRule {
        label: "cuil",
        predicate: Contains("cuil"),
        pattern: r"^(20|23|24|27)-?\d{8}-?\d$",
        flag: None,
    },
    NameRule {
        label: "bank_alias",
        predicate: All(&[Contains("alias"), Any(&[Contains("bancario"), Contains("cvu")])]),
        pattern: r"^[a-z0-9.]{6,20}$",
        flag: None,
    },
    NameRule {
        label: "cbu",
        predicate: Contains("cbu"),
        pattern: r"^\d{22}$",
        flag: None,
    },
    NameRule {
        label: "cvu",
        predicate: Contains("cvu"),
        pattern: r"^\d{22}$",
        flag: None,
    },
    NameRule {
        label: "national_id",
        predicate: Any(&[Equals("dni"), Contains("documento")]),
        pattern: r"^\d{7,8}$",
        flag: None,
    },
    NameRule {
        label: "passport",
        predicate: Any(&[Contains("pasaporte"), Contains("passport")]),
        pattern: r"^[A-Z]{3}\d{6}$",
        flag: None,
    },
    NameRule {
        label: "ruc",
        predicate: Token("ruc"),
        pattern: r"^\d{11}$",
        flag: None,
    },
    NameRule {
        label: "rfc",
        predicate: Token("rfc"),
        pattern: r"^[A-ZÑ&]{3,4}\d{6}[A-Z0-9]{3}$",
        flag: None,
    },
    NameRule {
        label: "curp",
        predicate: Contains("curp"),
        pattern: r"^[A-Z]{4}\d{6}[HM][A-Z]{5}[0-9A-Z]\d$",
        flag: None,
    },
    NameRule {
        label: "cpf",
        predicate: Token("cpf"),
        pattern: r"^\d{3}\.\d{3}\.\d{3}-\d{2}$|^\d{11}$",
        flag: None,
    },
    NameRule {
        label: "cnpj",
        predicate: Contains("cnpj"),
        pattern: r"^\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}$|^\d{14}$",
        flag: None,
    },
    NameRule {
        label: "rut",
        predicate: Token("rut"),
        pattern: r"^\d{1,2}\.\d{3}\.\d{3}-[\dkK]$|^\d{7,8}-[\dkK]$",
        flag: None,
    },
    NameRule {
        label: "postal_code",
        predicate: Any(&[Contains("codigo_postal"), Contains("postal"), Contains("zip")]),
        pattern: r"^([A-Z]\d{4}[A-Z]{3}|\d{4,5})$",
        flag: None,
    },
    NameRule {
        label: "username",
        predicate: Any(&[Contains("username"), Contains("usuario"), Contains("login")]),
        pattern: r"^[a-zA-Z0-9._-]{4,20}$",
        flag: None,
    },
    NameRule {
        label: "person_name",
        predicate: Any(&[Contains("nombre"), Contains("apellido"), Contains("name")]),
        pattern: r"^[\p{L}\s]+$",
        flag: None,
    },
    NameRule {
        label: "password",
        predicate: Any(&[Contains("password"), Contains("clave"), Contains("contrasena")]),
        pattern: r"^[A-Za-z0-9@$!%*?&#+._-]{8,}$",
        flag: None,
    },
    NameRule {
        label: "uuid",
        predicate: Any(&[Contains("uuid"), Contains("guid")]),
        pattern: r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[1-5][0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$",
        flag: None,
    },
    NameRule {
        label: "ipv6",
        predicate: Any(&[Token("ipv6"), All(&[Token("ip"), Token("v6")])]),
        pattern: r"^(([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}|::([0-9a-fA-F]{1,4}:){0,6}[0-9a-fA-F]{1,4})$",
        flag: None,
    },
    NameRule {
        label: "ipv4",
        predicate: Any(&[Token("ip"), Token("ipv4")]),
        pattern: r"^(25[0-5]|2[0-4]\d|[01]?\d\d?)\.((25[0-5]|2[0-4]\d|[01]?\d\d?)\.){2}(25[0-5]|2[0-4]\d|[01]?\d\d?)$",
        flag: None,
    },
    NameRule {
        label: "mac_address",
        predicate: All(&[Token("mac"), Contains("address")]),
        pattern: r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$",
        flag: None,
    },
    NameRule {
        label: "license_plate",
        predicate: Any(&[Contains("patente"), Contains("dominio")]),
        pattern: r"^([A-Z]{3}\d{3}|[A-Z]{2}\d{3}[A-Z]{2})$",
        flag: None,
    },
    NameRule {
        label: "vin",
        predicate: Any(&[Token("vin"), Contains("chasis")]),
        pattern: r"^[A-HJ-NPR-Z0-9]{17}$",
        flag: None,
    },
    NameRule {
        label: "hex_color",
        predicate: All(&[Contains("color"), Not(&Contains("nombre"))]),
        pattern: r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$",
        flag: None,
    },
    NameRule {
        label: "card_number",
        predicate: Any(&[Contains("tarjeta"), Contains("card")]),
        pattern: r"^\d{13,19}$",
        flag: None,
    },
    NameRule {
        label: "card_cvv",
        predicate: Any(&[Contains("cvv"), Contains("cvc")]),
        pattern: r"^\d{3,4}$",
        flag: None,
    },
    NameRule {
        label: "iban",
        predicate: Contains("iban"),
        pattern: r"^[A-Z]{2}\d{2}[A-Z0-9]{1,30}$",
        flag: None,
    },
    NameRule {
        label: "swift",
        predicate: Any(&[Contains("swift"), Token("bic")]),
        pattern: r"^[A-Z]{6}[A-Z0-9]{2}([A-Z0-9]{3})?$",
        flag: None,
    },
    NameRule {
        label: "isbn",
        predicate: Contains("isbn"),
        pattern: r"^(97[89])?\d{9}[\dX]$",
        flag: None,
    },
    NameRule {
        label: "slug",
        predicate: Contains("slug"),
        pattern: r"^[a-z0-9]+(?:-[a-z0-9]+)*$",
        flag: None,
    },
    NameRule {
        label: "latitude",
        predicate: Any(&[Contains("latitud"), Equals("lat")]),
        pattern: r"^-?([0-8]?\d(\.\d+)?|90(\.0+)?)$",
        flag: None,
    },
    NameRule {
        label: "longitude",
        predicate: Any(&[Contains("longitud"), Equals("lng"), Equals("lon")]),
        pattern: r"^-?(1[0-7]\d(\.\d+)?|180(\.0+)?|\d{1,2}(\.\d+)?)$",
        flag: None,
    },
    NameRule {
        label: "hashtag",
        predicate: Any(&[Contains("hashtag"), Token("tag"), Token("tags")]),
        pattern: r"^#[A-Za-z0-9_]+$",
        flag: None,
    },
    NameRule {
        label: "social_handle",
        predicate: Any(&[Contains("handle"), Contains("twitter"), Contains("instagram")]),
        pattern: r"^@?[A-Za-z0-9_]{1,15}$",
        flag: None,
    },
    NameRule {
        label: "semver",
        predicate: Contains("version"),
        pattern: r"^\d+\.\d+\.\d+(-[a-zA-Z0-9]+)?$",
        flag: None,
    },
    NameRule {
        label: "currency",
        predicate: Any(&[Contains("moneda"), Contains("currency")]),
        pattern: r"^[A-Z]{3}$",
        flag: None,
    },
    NameRule {
        label: "language",
        predicate: Any(&[Contains("idioma"), Contains("language"), Token("lang")]),
        pattern: r"^[a-z]{2}(-[A-Z]{2})?$",
        flag: None,
    },
    NameRule {
        label: "country",
        predicate: Any(&[Token("pais"), Contains("country")]),
        pattern: r"^[A-Z]{2}$",
        flag: None,
    },
    NameRule {
        label: "clock_time",
        predicate: Any(&[Token("hora"), Token("time")]),
        pattern: r"^([01]\d|2[0-3]):[0-5]\d(:[0-5]\d)?$",
        flag: None,
    },
    NameRule {
        label: "order_number",
        predicate: All(&[
            Contains("numero"),
            Any(&[Contains("orden"), Contains("factura"), Contains("invoice")]),
        ]),
        pattern: r"^[A-Z0-9]{5,20}$",
        flag: None,
    },
    NameRule {
        label: "registration",
        predicate: Any(&[Contains("matricula"), Contains("legajo")]),
        pattern: r"^[A-Z0-9]{5,15}$",
        flag: None,
    },
    NameRule {
        label: "barcode",
        predicate: Any(&[Contains("codigo_barras"), Token("ean"), Contains("barcode")]),
        pattern: r"^\d{13}$",
        flag: None,
    },
    NameRule {
        label: "batch",
        predicate: Any(&[Token("lote"), Contains("batch")]),
        pattern: r"^[A-Z0-9]{6,20}$",
        flag: None,
    },
    NameRule {
        label: "file_extension",
        predicate: Contains("extension"),
        pattern: r"^\.[a-z0-9]{2,5}$",
        flag: None,
    },
    NameRule {
        label: "mime_type",
        predicate: Contains("mime"),
        pattern: r"^[a-z]+/[a-z0-9\-\+\.]+$",
        flag: None,
    },
    NameRule {
        label: "tweet_id",
        predicate: All(&[Contains("tweet"), Contains("id")]),
        pattern: r"^\d{15,20}$",
        flag: None,
    },
    NameRule {
        label: "youtube_id",
        predicate: All(&[Contains("youtube"), Contains("id")]),
        pattern: r"^[A-Za-z0-9_-]{11}$",
        flag: None,
    },
];

/// First catalogue entry matching the (case-insensitive) column name
pub fn lookup(column_name: &str) -> Option<&'static NameRule> {
    let name = column_name.to_lowercase();
    NAME_RULES.iter().find(|rule| rule.predicate.matches(&name))
}

pub fn is_password_like(column_name: &str) -> bool {
    let name = column_name.to_lowercase();
    PASSWORD_MARKERS.iter().any(|marker| name.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        assert_eq!(lookup("email").map(|r| r.label), Some("email"));
        assert_eq!(lookup("email_url").map(|r| r.label), Some("email"));
        assert_eq!(lookup("username").map(|r| r.label), Some("username"));
        assert_eq!(lookup("last_name").map(|r| r.label), Some("person_name"));
    }

    #[test]
    fn short_codes_match_whole_segments_only() {
        assert_eq!(lookup("client_ip").map(|r| r.label), Some("ipv4"));
        assert_eq!(lookup("ip_v6").map(|r| r.label), Some("ipv6"));
        assert_eq!(lookup("ipv6").map(|r| r.label), Some("ipv6"));
        assert!(lookup("description").is_none());
        assert!(lookup("shipping_notes").is_none());
        assert!(lookup("percentage").is_none());
        assert!(lookup("province").is_none());
    }

    #[test]
    fn combined_predicates() {
        assert_eq!(lookup("alias_cvu").map(|r| r.label), Some("bank_alias"));
        assert_eq!(lookup("cvu").map(|r| r.label), Some("cvu"));
        assert_eq!(lookup("color_primario").map(|r| r.label), Some("hex_color"));
        assert_eq!(lookup("numero_factura").map(|r| r.label), Some("order_number"));
        assert_eq!(lookup("mac_address").map(|r| r.label), Some("mac_address"));
    }

    #[test]
    fn labels_are_unique() {
        let mut labels: Vec<&str> = NAME_RULES.iter().map(|r| r.label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), NAME_RULES.len());
    }

    #[test]
    fn password_detection() {
        assert!(is_password_like("password_hash"));
        assert!(is_password_like("Clave"));
        assert!(!is_password_like("pass"));
    }
}
