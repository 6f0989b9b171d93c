use serde::Deserialize;
use serde::Serialize;

/// One currency entry of the CBR daily feed.
#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct Valute {
    #[serde(rename = "CharCode")]
    pub char_code: String,
    /// Rouble price of a single unit, with a decimal comma.
    #[serde(rename = "VunitRate")]
    pub vunit_rate: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq)]
pub struct ValCurs {
    /// `DD.MM.YYYY`; may be earlier than the requested date on non-business days.
    #[serde(rename = "@Date")]
    pub date: String,
    #[serde(rename = "Valute", default)]
    pub valute: Vec<Valute>,
}
