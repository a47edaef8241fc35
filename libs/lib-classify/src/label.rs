use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The two triage categories. Serialized uppercase on the wire and in
/// persisted artifacts, parsed case-insensitively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Label {
    Produtivo,
    Improdutivo,
}
