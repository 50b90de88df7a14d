use chrono::NaiveDateTime;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use tracing::warn;

use crate::errors::CoreError;
use crate::models::sold_item::{PaymentMethod, SoldItem};

/// Column names of the ledger, in order.
pub const HEADER: [&str; 8] = [
    "purchaseId",
    "itemId",
    "soldTime",
    "seller",
    "price",
    "collectedBySeller",
    "paymentMethod",
    "uploaded",
];

/// Rows written before the `uploaded` column existed have this many fields.
pub const LEGACY_FIELD_COUNT: usize = 7;

/// Value of the collected column for items not yet paid out.
pub const NOT_COLLECTED: &str = "Nej";

/// Timestamp format used for both time columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Older files wrote ISO-8601 timestamps; still accepted on read.
const ISO_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Encode items as ledger text, one row per item.
///
/// Fields are written verbatim: no quoting or escaping. Ids, numbers and
/// timestamps never contain the delimiter, and existing data files rely on
/// this exact layout.
pub fn encode(items: &[SoldItem], with_header: bool) -> Result<String, CoreError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(line_terminator())
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(HEADER)?;
    }
    for item in items {
        writer.write_record(encode_row(item))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Serialization(format!("Failed to flush ledger rows: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| CoreError::Serialization(format!("Ledger rows are not UTF-8: {e}")))
}

/// Decode ledger text into items.
///
/// Malformed rows are logged and skipped; the decode itself never fails.
/// Lines starting with `#` are comments. With `with_header` the first row
/// is treated as the header and dropped.
pub fn decode(text: &str, with_header: bool) -> Vec<SoldItem> {
    let mut reader = ReaderBuilder::new()
        .has_headers(with_header)
        .quoting(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut items = Vec::new();
    let mut record = StringRecord::new();
    loop {
        match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => match decode_row(&record) {
                Ok(item) => items.push(item),
                Err(e) => {
                    let line = record.position().map_or(0, |p| p.line());
                    warn!(line, error = %e, "Skipping malformed ledger row");
                }
            },
            Err(e) if e.is_io_error() => {
                warn!(error = %e, "Stopped reading ledger");
                break;
            }
            Err(e) => warn!(error = %e, "Skipping unreadable ledger row"),
        }
    }
    items
}

/// Decode a single row. Exposed for callers that stream rows themselves.
pub fn decode_row(record: &StringRecord) -> Result<SoldItem, CoreError> {
    if record.len() < LEGACY_FIELD_COUNT || record.len() > HEADER.len() {
        return Err(CoreError::Deserialization(format!(
            "Expected {} fields, got {}",
            HEADER.len(),
            record.len()
        )));
    }
    // Length checked above.
    let field = |i: usize| record.get(i).unwrap_or_default();

    let purchase_id = match field(0) {
        "" => None,
        id => Some(id.to_string()),
    };

    let item_id = field(1);
    if item_id.is_empty() {
        return Err(CoreError::Deserialization("Missing item id".into()));
    }

    let sold_time = parse_timestamp(field(2))?;
    let seller = parse_number(field(3), "seller")?;
    let price = parse_number(field(4), "price")?;

    let collected_by_seller_time = match field(5) {
        c if c.eq_ignore_ascii_case(NOT_COLLECTED) => None,
        c => Some(parse_timestamp(c)?),
    };

    let payment_method: PaymentMethod = field(6)
        .parse()
        .map_err(|e: CoreError| CoreError::Deserialization(e.to_string()))?;

    let uploaded = match record.get(7) {
        Some(flag) => parse_bool(flag)?,
        None => false,
    };

    Ok(SoldItem {
        purchase_id,
        item_id: item_id.to_string(),
        seller,
        price,
        sold_time,
        collected_by_seller_time,
        payment_method,
        uploaded,
    })
}

pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, CoreError> {
    std::iter::once(TIMESTAMP_FORMAT)
        .chain(ISO_FORMATS)
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| CoreError::Deserialization(format!("Invalid timestamp '{s}'")))
}

fn encode_row(item: &SoldItem) -> [String; 8] {
    [
        item.purchase_id.clone().unwrap_or_default(),
        item.item_id.clone(),
        format_timestamp(&item.sold_time),
        item.seller.to_string(),
        item.price.to_string(),
        item.collected_by_seller_time
            .as_ref()
            .map_or_else(|| NOT_COLLECTED.to_string(), format_timestamp),
        item.payment_method.token().to_string(),
        item.uploaded.to_string(),
    ]
}

fn parse_number(s: &str, column: &str) -> Result<u32, CoreError> {
    s.parse()
        .map_err(|e| CoreError::Deserialization(format!("Invalid {column} '{s}': {e}")))
}

fn parse_bool(s: &str) -> Result<bool, CoreError> {
    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(CoreError::Deserialization(format!("Invalid uploaded flag '{s}'")))
    }
}

fn line_terminator() -> Terminator {
    if cfg!(windows) {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    }
}
