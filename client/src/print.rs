//! Printable voter slips.
//!
//! Output is a complete HTML document and depends only on the input, so the
//! same records always print byte-for-byte identically.

use std::fmt::Write;

use shared::types::VoterRecord;

const MISSING_MOBILE: &str = "Not available";
const MISSING_VALUE: &str = "-";
const BLANK_GROUP: &str = "(blank)";

/// Slip rows in print order.
fn rows(record: &VoterRecord) -> [(&'static str, String); 10] {
    [
        ("Name", or_dash(&record.name)),
        ("Related To", or_dash(&record.related_to)),
        ("House No", or_blank_group(&record.house_no)),
        ("Voter ID", or_dash(&record.voter_id_number)),
        (
            "Booth No",
            record
                .booth_no
                .map_or_else(|| MISSING_VALUE.to_string(), |b| b.to_string()),
        ),
        ("Booth Address", or_dash(&record.booth_address)),
        ("City", or_dash(&record.city)),
        ("Age", record.age.to_string()),
        ("Gender", record.gender.to_string()),
        (
            "Mobile",
            record.mobile().unwrap_or(MISSING_MOBILE).to_string(),
        ),
    ]
}

fn or_dash(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        MISSING_VALUE.to_string()
    } else {
        value.to_string()
    }
}

/// A blank house number reads the same on the slip as in the group heading.
fn or_blank_group(house_no: &str) -> String {
    match house_no.trim() {
        "" => BLANK_GROUP.to_string(),
        house_no => house_no.to_string(),
    }
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn slip(out: &mut String, record: &VoterRecord) {
    out.push_str("<table class=\"voter-slip\">\n");
    for (label, value) in rows(record) {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "<tr><th>{}</th><td>{}</td></tr>",
            label,
            escape_html(&value)
        );
    }
    out.push_str("</table>\n");
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape_html(title),
        body
    )
}

/// A one-voter slip.
pub fn render_record(record: &VoterRecord) -> String {
    let mut body = String::new();
    slip(&mut body, record);
    document(&format!("Voter slip: {}", or_dash(&record.name)), &body)
}

/// Every slip of one household, under a heading naming the house number.
pub fn render_group(records: &[&VoterRecord], group_key: &str) -> String {
    let key = or_blank_group(group_key);

    let mut body = String::new();
    let _ = writeln!(body, "<h1>House No: {}</h1>", escape_html(&key));
    let _ = writeln!(body, "<p>{} voter(s)</p>", records.len());
    for record in records {
        slip(&mut body, record);
    }
    document(&format!("Household {}", key), &body)
}
