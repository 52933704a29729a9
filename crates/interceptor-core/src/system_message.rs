//! Parsing and building for system messages: the text-based side channel
//! used to talk about connection lifecycle and module state rather than
//! game protocol content (spec §4.3).
//!
//! Wire shape, as UTF-8 text: `@<id>\v<field>\v<field>...`, where `<id>` is
//! either a literal containing `:` (used verbatim) or the decimal form of
//! the message's identifier byte (resolved via [`crate::SystemMessageTable`]),
//! and fields are separated by `\v` (0x0B, the same vertical-tab separator
//! the source protocol uses).

use interceptor_proto::SystemMessageTable;

use crate::error::DispatchError;

const PREFIX: u8 = b'@';
const SEPARATOR: char = '\u{000B}';

/// A parsed system message: its name (resolved via the table) and ordered
/// text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMessage {
    /// The message name, resolved from its wire identifier code.
    pub name: String,
    /// Ordered fields following the identifier.
    pub fields: Vec<String>,
}

/// Parse a system message frame payload.
///
/// The id following `@` is either a literal containing `:` (used verbatim,
/// no table lookup) or a decimal numeric code resolved through `table`
/// (spec §4.3).
///
/// # Errors
///
/// [`DispatchError::MalformedSystemMessage`] if the payload isn't valid
/// UTF-8, doesn't start with `@`, or the id is neither a literal containing
/// `:` nor a valid decimal `u8`; [`DispatchError::UnknownSystemMessageName`]
/// if a numeric code has no registered name.
pub fn parse(table: &dyn SystemMessageTable, payload: &[u8]) -> Result<SystemMessage, DispatchError> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| DispatchError::MalformedSystemMessage("payload is not valid UTF-8".into()))?;

    let body = text.strip_prefix(PREFIX as char).ok_or_else(|| {
        DispatchError::MalformedSystemMessage(format!("missing '{}' prefix", PREFIX as char))
    })?;

    let mut parts = body.split(SEPARATOR);
    let id_str = parts
        .next()
        .ok_or_else(|| DispatchError::MalformedSystemMessage("missing message id".into()))?;

    let name = if id_str.contains(':') {
        id_str.to_string()
    } else {
        let code: u8 = id_str
            .parse()
            .map_err(|_| DispatchError::MalformedSystemMessage(format!("invalid id {id_str:?}")))?;
        table
            .name_for_code(code)
            .ok_or_else(|| DispatchError::UnknownSystemMessageName(code.to_string()))?
            .to_string()
    };

    Ok(SystemMessage { name, fields: parts.map(str::to_string).collect() })
}

/// Build a system message frame payload from a name and fields.
///
/// `name` containing `:` is emitted as a literal id verbatim; otherwise it
/// is resolved to a numeric code through `table` (spec §4.3).
///
/// # Errors
///
/// [`DispatchError::UnknownSystemMessageName`] if `name` doesn't contain
/// `:` and has no registered code.
pub fn build(
    table: &dyn SystemMessageTable,
    name: &str,
    fields: &[&str],
) -> Result<Vec<u8>, DispatchError> {
    let mut text = String::from(PREFIX as char);
    if name.contains(':') {
        text.push_str(name);
    } else {
        let code = table
            .code_for_name(name)
            .ok_or_else(|| DispatchError::UnknownSystemMessageName(name.to_string()))?;
        text.push_str(&code.to_string());
    }

    for field in fields {
        text.push(SEPARATOR);
        text.push_str(field);
    }

    Ok(text.into_bytes())
}
